//! Small utilities shared across subcommands: output-format selection for Mueller-table writes.
//! Plays the role `pineappl_cli::helpers` plays for its subcommands, scaled to what this CLI
//! actually needs.

use crate::io::{write_mueller_binary, write_mueller_json};
use anyhow::Result;
use clap::ValueEnum;
use photonvox::mueller::MuellerTable;
use std::path::Path;

/// Output encoding for Mie/`MiePoly`/Whittle-Matérn Mueller tables.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TableFormat {
    /// Raw little-endian `(S11, S12, S33, S43)` `f32` records, per the Mie LUT wire format.
    Binary,
    /// Pretty-printed JSON array of the same records.
    Json,
}

/// Writes `table` to `path` in the requested `format`.
pub fn write_mueller_table(path: &Path, format: TableFormat, table: &MuellerTable) -> Result<()> {
    match format {
        TableFormat::Binary => write_mueller_binary(path, table),
        TableFormat::Json => write_mueller_json(path, table),
    }
}
