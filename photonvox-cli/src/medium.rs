//! `medium pack` / `medium unpack` subcommands: conversion between one-byte-per-voxel and
//! 2-bit-packed medium representations (§6's packed wire format).

use crate::io::{pack_medium, read_medium_bytes, unpack_medium};
use crate::{GlobalConfiguration, Subcommand};
use anyhow::{Context, Result};
use clap::{Parser, ValueHint};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

/// Packs or unpacks a medium grid between its one-byte-per-voxel and 2-bit-packed
/// representations.
#[derive(Parser)]
pub struct Opts {
    #[command(subcommand)]
    action: Action,
}

#[derive(clap::Subcommand)]
enum Action {
    /// Packs a one-byte-per-voxel medium file into the 2-bit wire format.
    Pack {
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        #[arg(value_hint = ValueHint::FilePath)]
        output: PathBuf,
        nx: usize,
        ny: usize,
        nz: usize,
    },
    /// Unpacks a 2-bit-packed medium file into one byte per voxel.
    Unpack {
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        #[arg(value_hint = ValueHint::FilePath)]
        output: PathBuf,
        nx: usize,
        ny: usize,
        nz: usize,
    },
}

impl Subcommand for Opts {
    fn run(&self, _cfg: &GlobalConfiguration) -> Result<ExitCode> {
        match &self.action {
            Action::Pack {
                input,
                output,
                nx,
                ny,
                nz,
            } => {
                let voxel_count = nx * ny * nz;
                let ids = read_medium_bytes(input, voxel_count)?;
                let packed = pack_medium(&ids);
                fs::write(output, packed)
                    .with_context(|| format!("unable to write '{}'", output.display()))?;
            }
            Action::Unpack {
                input,
                output,
                nx,
                ny,
                nz,
            } => {
                let voxel_count = nx * ny * nz;
                let packed = read_medium_bytes(input, voxel_count.div_ceil(4))?;
                let ids = unpack_medium(&packed, voxel_count);
                fs::write(output, ids)
                    .with_context(|| format!("unable to write '{}'", output.display()))?;
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use assert_cmd::Command;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use std::fs;

    #[test]
    fn pack_then_unpack_round_trips() {
        let dir = TempDir::new().unwrap();
        let input = dir.child("medium.bin");
        fs::write(input.path(), [0u8, 1, 2, 3, 1, 0, 2, 1]).unwrap();
        let packed = dir.child("medium.packed");
        let unpacked = dir.child("medium.unpacked");

        Command::cargo_bin("photonvox")
            .unwrap()
            .args([
                "medium",
                "pack",
                input.path().to_str().unwrap(),
                packed.path().to_str().unwrap(),
                "8",
                "1",
                "1",
            ])
            .assert()
            .success();

        Command::cargo_bin("photonvox")
            .unwrap()
            .args([
                "medium",
                "unpack",
                packed.path().to_str().unwrap(),
                unpacked.path().to_str().unwrap(),
                "8",
                "1",
                "1",
            ])
            .assert()
            .success();

        let original = fs::read(input.path()).unwrap();
        let round_tripped = fs::read(unpacked.path()).unwrap();
        assert_eq!(original, round_tripped);
    }
}
