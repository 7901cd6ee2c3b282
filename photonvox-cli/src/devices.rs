//! `devices` subcommand: lists the compute backends this build can dispatch to. GPU/accelerator
//! dispatch is out of scope (spec §1), so this always reports the single `cpu` backend with its
//! thread count, matching the device-enumeration surface a production photon-migration tool
//! exposes without pretending to implement device shipping.

use crate::{GlobalConfiguration, Subcommand};
use anyhow::Result;
use clap::Parser;
use std::num::NonZeroUsize;
use std::process::ExitCode;

/// Reports the compute backends available to the transport kernel.
#[derive(Parser)]
pub struct Opts {}

impl Subcommand for Opts {
    fn run(&self, cfg: &GlobalConfiguration) -> Result<ExitCode> {
        let threads = cfg.threads.unwrap_or_else(default_parallelism);
        println!("cpu\tthreads={threads}");

        Ok(ExitCode::SUCCESS)
    }
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
