//! Input-deck loading (component J): the JSON/TOML simulation-configuration format consumed by
//! the `run` subcommand. Grounded on `pineappl_cli`'s pattern of small `serde`-derived structs for
//! persisted grid metadata (`evolution.rs`, `fk_table.rs`), scaled down to one deck per run.

use anyhow::{Context, Result};
use photonvox::fluence::ReductionMode;
use photonvox::medium::Material;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Medium grid dimensions.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct GridSpec {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl GridSpec {
    #[must_use]
    pub fn voxel_count(self) -> usize {
        self.nx * self.ny * self.nz
    }
}

/// Points at the medium-grid file backing a run, and whether it is 2-bit-packed (§6) or
/// one-byte-per-voxel.
#[derive(Clone, Debug, Deserialize)]
pub struct MediumSpec {
    pub path: PathBuf,
    #[serde(default)]
    pub packed: bool,
}

/// Launch position and direction for every photon in the run.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct SourceSpec {
    pub position: [f64; 3],
    pub direction: [f64; 3],
}

/// Fluence accumulation strategy, as exposed in the deck so it can be pinned per run rather than
/// only via a CLI flag.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReductionSetting {
    #[default]
    Atomic,
    ThreadLocal,
}

impl From<ReductionSetting> for ReductionMode {
    fn from(value: ReductionSetting) -> Self {
        match value {
            ReductionSetting::Atomic => Self::Atomic,
            ReductionSetting::ThreadLocal => Self::ThreadLocal,
        }
    }
}

/// A complete simulation deck: grid, medium, material table, source, kernel parameters, RNG seed,
/// and output paths. Deserialized from JSON or TOML by [`load_deck`].
#[derive(Clone, Debug, Deserialize)]
pub struct SimulationDeck {
    pub grid: GridSpec,
    pub medium: MediumSpec,
    pub materials: Vec<Material>,
    pub source: SourceSpec,
    pub totalmove: u32,
    pub photons: usize,
    pub minstep: f64,
    pub lmax: f64,
    pub seed: u32,
    #[serde(default)]
    pub reduction: ReductionSetting,
    pub fluence_output: PathBuf,
    pub summary_output: Option<PathBuf>,
}

/// Loads a [`SimulationDeck`] from `path`, dispatching on file extension: `.toml` is parsed as
/// TOML, anything else (including no extension) defaults to JSON, per the input-deck design note.
pub fn load_deck(path: &Path) -> Result<SimulationDeck> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("unable to read input deck '{}'", path.display()))?;

    if path.extension().and_then(|ext| ext.to_str()) == Some("toml") {
        toml::from_str(&text)
            .with_context(|| format!("unable to parse '{}' as TOML", path.display()))
    } else {
        serde_json::from_str(&text)
            .with_context(|| format!("unable to parse '{}' as JSON", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_minimal_json_deck() {
        let dir = assert_fs::TempDir::new().unwrap();
        let deck_path = dir.path().join("deck.json");
        std::fs::write(
            &deck_path,
            r#"{
                "grid": {"nx": 2, "ny": 2, "nz": 2},
                "medium": {"path": "medium.bin"},
                "materials": [
                    {"mu_a": 0.0, "mu_s": 0.0, "g": 0.0, "n": 1.0},
                    {"mu_a": 0.01, "mu_s": 10.0, "g": 0.0, "n": 1.0}
                ],
                "source": {"position": [1.0, 1.0, 0.0], "direction": [0.0, 0.0, 1.0]},
                "totalmove": 100,
                "photons": 10,
                "minstep": 1.0,
                "lmax": 50.0,
                "seed": 1,
                "fluence_output": "fluence.bin",
                "summary_output": null
            }"#,
        )
        .unwrap();

        let deck = load_deck(&deck_path).unwrap();
        assert_eq!(deck.grid.voxel_count(), 8);
        assert_eq!(deck.materials.len(), 2);
        assert!(matches!(deck.reduction, ReductionSetting::Atomic));
    }

    #[test]
    fn loads_toml_deck() {
        let dir = assert_fs::TempDir::new().unwrap();
        let deck_path = dir.path().join("deck.toml");
        std::fs::write(
            &deck_path,
            r#"
            totalmove = 100
            photons = 10
            minstep = 1.0
            lmax = 50.0
            seed = 1
            fluence_output = "fluence.bin"

            [grid]
            nx = 2
            ny = 2
            nz = 2

            [medium]
            path = "medium.bin"

            [source]
            position = [1.0, 1.0, 0.0]
            direction = [0.0, 0.0, 1.0]

            [[materials]]
            mu_a = 0.0
            mu_s = 0.0
            g = 0.0
            n = 1.0

            [[materials]]
            mu_a = 0.01
            mu_s = 10.0
            g = 0.0
            n = 1.0
            "#,
        )
        .unwrap();

        let deck = load_deck(&deck_path).unwrap();
        assert_eq!(deck.grid.nx, 2);
        assert_eq!(deck.materials[1].mu_s, 10.0);
    }
}
