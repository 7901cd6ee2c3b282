#![allow(clippy::missing_errors_doc)]
#![allow(missing_docs)]

mod devices;
mod helpers;
mod input;
mod io;
mod medium;
mod mie;
mod mie_poly;
mod run;
mod whittle_matern;

use anyhow::Result;
use clap::Parser;
use enum_dispatch::enum_dispatch;
use std::process::ExitCode;

/// Options shared by every subcommand.
#[derive(Parser)]
pub struct GlobalConfiguration {
    /// Number of worker threads for the transport kernel and parallel Mie sweeps; defaults to the
    /// platform's available parallelism.
    #[arg(long)]
    pub threads: Option<usize>,
    /// Increase log verbosity; repeatable (`-v`, `-vv`, `-vvv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[enum_dispatch]
pub trait Subcommand {
    fn run(&self, cfg: &GlobalConfiguration) -> Result<ExitCode>;
}

#[enum_dispatch(Subcommand)]
#[derive(Parser)]
pub enum SubcommandEnum {
    /// Run the transport kernel against an input deck.
    Run(run::Opts),
    /// Compute the Mie solution for a single (size, index) pair.
    Mie(mie::Opts),
    /// Compute the Gaussian polydisperse Mie average.
    MiePoly(mie_poly::Opts),
    /// Compute the Whittle-Matérn phase function.
    WhittleMatern(whittle_matern::Opts),
    /// Pack or unpack a medium grid.
    Medium(medium::Opts),
    /// Report the compute backends this build can dispatch to.
    Devices(devices::Opts),
}

#[derive(Parser)]
#[command(
    arg_required_else_help = true,
    author,
    about,
    disable_help_subcommand = true,
    name = "photonvox",
    version
)]
pub struct Opts {
    #[command(flatten)]
    pub configuration: GlobalConfiguration,
    #[command(subcommand)]
    pub subcommand: SubcommandEnum,
}
