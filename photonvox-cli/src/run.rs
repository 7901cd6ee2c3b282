//! `run` subcommand (component I): loads an input deck, executes the transport kernel, and writes
//! the fluence dump plus a JSON run summary.

use crate::input::load_deck;
use crate::io::{read_medium_bytes, unpack_medium, write_fluence_dump};
use crate::{GlobalConfiguration, Subcommand};
use anyhow::{Context, Result};
use clap::{Parser, ValueHint};
use photonvox::kernel::{run_transport, RunConfig};
use photonvox::medium::{MaterialTable, MediumGrid};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

/// Runs the transport kernel against an input deck and writes the fluence dump (and, if
/// configured, a JSON run summary).
#[derive(Parser)]
pub struct Opts {
    /// Path to the JSON or TOML input deck.
    #[arg(value_hint = ValueHint::FilePath)]
    deck: PathBuf,
}

#[derive(Serialize)]
struct RunSummary {
    photons_launched: u64,
    total_relaunches: u64,
    total_deposited_weight: f64,
    elapsed_seconds: f64,
}

impl Subcommand for Opts {
    fn run(&self, _cfg: &GlobalConfiguration) -> Result<ExitCode> {
        let deck = load_deck(&self.deck)?;
        let voxel_count = deck.grid.voxel_count();

        let ids = if deck.medium.packed {
            let packed = read_medium_bytes(&deck.medium.path, voxel_count.div_ceil(4))
                .context("unable to read packed medium grid")?;
            unpack_medium(&packed, voxel_count)
        } else {
            read_medium_bytes(&deck.medium.path, voxel_count)
                .context("unable to read medium grid")?
        };
        let medium = MediumGrid::from_bytes(deck.grid.nx, deck.grid.ny, deck.grid.nz, ids);
        let table = MaterialTable::new(deck.materials.clone());

        let config = RunConfig {
            n_photons: deck.photons,
            totalmove: deck.totalmove,
            minstep: deck.minstep,
            lmax: deck.lmax,
            source_position: deck.source.position,
            source_direction: deck.source.direction,
            base_seed: deck.seed,
            reduction_mode: deck.reduction.into(),
        };

        let started = Instant::now();
        let result = run_transport(&config, &medium, &table);
        let elapsed = started.elapsed();

        let fluence_values = result.fluence.to_vec();
        write_fluence_dump(&deck.fluence_output, &fluence_values)
            .context("unable to write fluence dump")?;

        if let Some(summary_path) = &deck.summary_output {
            let summary = RunSummary {
                photons_launched: result.photons_launched,
                total_relaunches: result.total_relaunches,
                total_deposited_weight: fluence_values.iter().map(|v| f64::from(*v)).sum(),
                elapsed_seconds: elapsed.as_secs_f64(),
            };
            let file = std::fs::File::create(summary_path)
                .with_context(|| format!("unable to create '{}'", summary_path.display()))?;
            serde_json::to_writer_pretty(file, &summary)
                .with_context(|| format!("unable to write '{}'", summary_path.display()))?;
        }

        Ok(ExitCode::SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use assert_cmd::Command;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    #[test]
    fn runs_a_minimal_homogeneous_deck() {
        let dir = TempDir::new().unwrap();
        let medium_path = dir.child("medium.bin");
        medium_path.write_binary(&[1u8; 8]).unwrap();

        let fluence_path = dir.child("fluence.bin");
        let summary_path = dir.child("summary.json");
        let deck_path = dir.child("deck.json");
        deck_path
            .write_str(&format!(
                r#"{{
                "grid": {{"nx": 2, "ny": 2, "nz": 2}},
                "medium": {{"path": "{medium}"}},
                "materials": [
                    {{"mu_a": 0.0, "mu_s": 0.0, "g": 0.0, "n": 1.0}},
                    {{"mu_a": 0.01, "mu_s": 10.0, "g": 0.0, "n": 1.0}}
                ],
                "source": {{"position": [1.0, 1.0, 0.0], "direction": [0.0, 0.0, 1.0]}},
                "totalmove": 20,
                "photons": 10,
                "minstep": 1.0,
                "lmax": 50.0,
                "seed": 1,
                "fluence_output": "{fluence}",
                "summary_output": "{summary}"
            }}"#,
                medium = medium_path.path().display(),
                fluence = fluence_path.path().display(),
                summary = summary_path.path().display(),
            ))
            .unwrap();

        Command::cargo_bin("photonvox")
            .unwrap()
            .args(["run", deck_path.path().to_str().unwrap()])
            .assert()
            .success();

        assert!(fluence_path.path().exists());
        assert!(summary_path.path().exists());
    }
}
