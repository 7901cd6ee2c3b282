//! Monte Carlo photon-migration transport kernel and Mie/Whittle-Matérn scattering-parameter
//! precomputation for voxelized turbid media.
//!
//! This crate is the computational core only: command-line parsing, file I/O, input-deck loading,
//! and logging configuration live in the `photonvox-cli` binary crate. See that crate for a
//! runnable entry point.
//!
//! - [`recurrence`], [`mie`]: scattering-parameter precomputation (Lentz continued fraction,
//!   logarithmic-derivative recurrences, Mie coefficients and Mueller matrix).
//! - [`size_distribution`]: Gaussian polydisperse averaging and the Whittle-Matérn spectral model.
//! - [`medium`]: voxel medium grid and material table.
//! - [`rng`], [`photon`]: per-photon RNG substrate and mutable state.
//! - [`kernel`]: the data-parallel transport loop.
//! - [`fluence`]: the shared fluence accumulator.

pub mod convert;
pub mod error;
pub mod fluence;
pub mod kernel;
pub mod medium;
pub mod mie;
pub mod mueller;
pub mod photon;
pub mod rng;
pub mod size_distribution;

pub use error::{Error, Result};
