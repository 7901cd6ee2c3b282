//! `mie` subcommand: computes the Mie solution for a single (size parameter, complex relative
//! index) pair and writes the Mueller table.

use crate::helpers::{write_mueller_table, TableFormat};
use crate::{GlobalConfiguration, Subcommand};
use anyhow::{Context, Result};
use clap::{Parser, ValueHint};
use num_complex::Complex64;
use std::path::PathBuf;
use std::process::ExitCode;

/// Computes the Mie solution (or its small-particle branch) for a single size parameter and
/// complex relative refractive index.
#[derive(Parser)]
pub struct Opts {
    /// Size parameter `x = 2*pi*r*n_med/lambda`.
    x: f64,
    /// Real part of the relative refractive index.
    m_re: f64,
    /// Imaginary part of the relative refractive index (absorption; `<= 0` by the
    /// `exp(-i*omega*t)` convention).
    #[arg(default_value_t = 0.0)]
    m_im: f64,
    /// Output path for the Mueller table.
    #[arg(value_hint = ValueHint::FilePath)]
    output: PathBuf,
    /// Output encoding for the Mueller table.
    #[arg(long, value_enum, default_value = "binary")]
    format: TableFormat,
}

impl Subcommand for Opts {
    fn run(&self, _cfg: &GlobalConfiguration) -> Result<ExitCode> {
        let result = photonvox::mie::mie(self.x, Complex64::new(self.m_re, self.m_im))
            .context("Mie computation failed")?;

        println!("Qsca = {}", result.qsca);
        println!("g    = {}", result.g);

        write_mueller_table(&self.output, self.format, &result.mueller)
            .context("unable to write Mueller table")?;

        Ok(ExitCode::SUCCESS)
    }
}
