//! `whittle-matern` subcommand: closed-form spectral phase function for a continuous
//! random medium.

use crate::helpers::{write_mueller_table, TableFormat};
use crate::{GlobalConfiguration, Subcommand};
use anyhow::{Context, Result};
use clap::{Parser, ValueHint};
use std::path::PathBuf;
use std::process::ExitCode;

/// Computes the Whittle-Matérn phase function for a continuous random medium with correlation
/// length `l_c` and fractal-dimension parameter `d`.
#[derive(Parser)]
pub struct Opts {
    /// Correlation length, in the same length unit as `wavelength`.
    l_c: f64,
    /// Fractal-dimension parameter.
    d: f64,
    /// Vacuum wavelength.
    wavelength: f64,
    /// Output path for the Mueller table.
    #[arg(value_hint = ValueHint::FilePath)]
    output: PathBuf,
    /// Output encoding for the Mueller table.
    #[arg(long, value_enum, default_value = "binary")]
    format: TableFormat,
}

impl Subcommand for Opts {
    fn run(&self, _cfg: &GlobalConfiguration) -> Result<ExitCode> {
        let result = photonvox::size_distribution::whittle_matern(self.l_c, self.d, self.wavelength);

        println!("g = {}", result.g);

        write_mueller_table(&self.output, self.format, &result.mueller)
            .context("unable to write Mueller table")?;

        Ok(ExitCode::SUCCESS)
    }
}
