//! Binary file formats for fluence dumps, packed/unpacked medium grids, and Mie LUT output
//! (component K). Every format here is normative per the file-format design note: raw
//! little-endian IEEE-754 values, no headers, no versioning.

use anyhow::{Context, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use photonvox::mueller::MuellerTable;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// Writes a fluence grid as raw little-endian `f32`, x-major then y then z, matching
/// `index = i*ny*nz + j*nz + k`. [`photonvox::fluence::FluenceGrid::to_vec`] already returns
/// values in this order.
pub fn write_fluence_dump(path: &Path, values: &[f32]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("unable to create '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    for &v in values {
        writer.write_f32::<LittleEndian>(v)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a one-byte-per-voxel medium file, verifying it holds exactly `expected_len` bytes.
pub fn read_medium_bytes(path: &Path, expected_len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(expected_len);
    File::open(path)
        .with_context(|| format!("unable to open '{}'", path.display()))?
        .read_to_end(&mut buf)
        .with_context(|| format!("unable to read '{}'", path.display()))?;
    anyhow::ensure!(
        buf.len() == expected_len,
        "medium file '{}' has {} bytes, expected {expected_len}",
        path.display(),
        buf.len()
    );
    Ok(buf)
}

/// Packs a one-byte-per-voxel medium (each byte a 2-bit-valid material ID) into the 2-bit wire
/// format: voxel `n` lives at byte `n/4`, bit offset `(n % 4) * 2`.
#[must_use]
pub fn pack_medium(ids: &[u8]) -> Vec<u8> {
    let mut packed = vec![0u8; ids.len().div_ceil(4)];
    for (n, &id) in ids.iter().enumerate() {
        packed[n / 4] |= (id & 0b11) << ((n % 4) * 2);
    }
    packed
}

/// Unpacks the 2-bit wire format back into one byte per voxel.
#[must_use]
pub fn unpack_medium(packed: &[u8], voxel_count: usize) -> Vec<u8> {
    (0..voxel_count)
        .map(|n| (packed[n / 4] >> ((n % 4) * 2)) & 0b11)
        .collect()
}

/// Writes a Mueller table as `NANGLES` raw little-endian `(S11, S12, S33, S43)` `f32` records.
pub fn write_mueller_binary(path: &Path, table: &MuellerTable) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("unable to create '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    for k in 0..table.s11.len() {
        writer.write_f32::<LittleEndian>(table.s11[k] as f32)?;
        writer.write_f32::<LittleEndian>(table.s12[k] as f32)?;
        writer.write_f32::<LittleEndian>(table.s33[k] as f32)?;
        writer.write_f32::<LittleEndian>(table.s43[k] as f32)?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct MuellerRecord {
    s11: f32,
    s12: f32,
    s33: f32,
    s43: f32,
}

/// Writes a Mueller table as a JSON array of `(S11, S12, S33, S43)` records, for the `--format
/// json` alternative to the binary LUT layout.
pub fn write_mueller_json(path: &Path, table: &MuellerTable) -> Result<()> {
    let records: Vec<MuellerRecord> = (0..table.s11.len())
        .map(|k| MuellerRecord {
            s11: table.s11[k] as f32,
            s12: table.s12[k] as f32,
            s33: table.s33[k] as f32,
            s43: table.s43[k] as f32,
        })
        .collect();
    let file =
        File::create(path).with_context(|| format!("unable to create '{}'", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &records)
        .with_context(|| format!("unable to write '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_round_trip() {
        let ids = vec![0u8, 1, 2, 3, 1, 0, 2, 1];
        let packed = pack_medium(&ids);
        assert_eq!(packed.len(), 2);
        let unpacked = unpack_medium(&packed, ids.len());
        assert_eq!(unpacked, ids);
    }
}
