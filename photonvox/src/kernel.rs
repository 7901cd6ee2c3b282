//! Transport kernel (component G): the data-parallel photon-advancement loop. Dominates runtime
//! and correctness risk; reads the medium grid, material table, and per-photon RNG, and writes the
//! shared fluence grid.

use crate::fluence::{FluenceGrid, GridDims, LocalGrid, ReductionMode};
use crate::medium::MaterialTable;
use crate::medium::MediumGrid;
use crate::photon::{Photon, Vec3, FRESH_JUMP_SENTINEL};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Reference worker-block size (`MAX_THREAD` in the design notes); only used to size the
/// thread-local chunking, not as a hard concurrency cap (`rayon` schedules the actual work).
const MAX_THREAD: usize = 128;

/// Run parameters a caller supplies on top of the medium and material table.
#[derive(Clone, Copy, Debug)]
pub struct RunConfig {
    /// Number of photons to launch.
    pub n_photons: usize,
    /// Micro-step budget per photon before the kernel gives up on it.
    pub totalmove: u32,
    /// Cartesian jump length per voxel-traversal micro-step.
    pub minstep: f64,
    /// Residual free-flight cap beyond which a photon is considered lost and relaunched.
    pub lmax: f64,
    /// Launch position, voxel-index units.
    pub source_position: Vec3,
    /// Launch direction, must be unit-norm.
    pub source_direction: Vec3,
    /// Seed for photon 0; photon `i` is seeded from `base_seed.wrapping_add(i)`.
    pub base_seed: u32,
    /// Fluence accumulation strategy.
    pub reduction_mode: ReductionMode,
}

/// Aggregate outcome of a full transport run.
pub struct RunResult {
    /// Accumulated fluence grid, same dimensions as the medium grid.
    pub fluence: FluenceGrid,
    /// Number of photons launched (`== config.n_photons`).
    pub photons_launched: u64,
    /// Sum of every photon's relaunch count.
    pub total_relaunches: u64,
}

/// Emits a `tracing` debug event every 10% of the population completed, so a long-running
/// transport kernel has visible progress without the per-photon overhead of logging every launch.
struct PhotonProgress {
    completed: AtomicUsize,
    total: usize,
    step: usize,
}

impl PhotonProgress {
    fn new(total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
            step: (total / 10).max(1),
        }
    }

    fn tick(&self) {
        let done = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if done % self.step == 0 || done == self.total {
            tracing::debug!(completed = done, total = self.total, "transport progress");
        }
    }
}

/// Runs the full photon population through `medium` against `table`, returning the accumulated
/// fluence grid and run statistics.
pub fn run_transport(config: &RunConfig, medium: &MediumGrid, table: &MaterialTable) -> RunResult {
    let (nx, ny, nz) = medium.dims();
    let dims = GridDims { nx, ny, nz };

    let span = tracing::info_span!(
        "run_transport",
        photons = config.n_photons,
        nx, ny, nz,
        totalmove = config.totalmove,
    );
    let _enter = span.enter();
    tracing::debug!("launching transport run");

    let mut photons: Vec<Photon> = (0..config.n_photons)
        .map(|i| {
            let seed = config.base_seed.wrapping_add(u32::try_from(i).unwrap_or(u32::MAX));
            Photon::launch(config.source_position, config.source_direction, seed)
        })
        .collect();

    let progress = PhotonProgress::new(config.n_photons);

    let fluence = match config.reduction_mode {
        ReductionMode::Atomic => {
            let fluence = FluenceGrid::zeroed(dims);
            photons.par_iter_mut().for_each(|photon| {
                run_photon(photon, medium, table, config, &fluence);
                progress.tick();
            });
            fluence
        }
        ReductionMode::ThreadLocal => {
            let num_threads = rayon::current_num_threads().max(1);
            let chunk_size = config.n_photons.div_ceil(num_threads).max(1).min(MAX_THREAD.max(1));
            let chunk_size = chunk_size.max(1);

            let merged: LocalGrid = photons
                .par_chunks_mut(chunk_size)
                .map(|chunk| {
                    let mut local = LocalGrid::zeroed(dims);
                    for photon in chunk.iter_mut() {
                        run_photon_local(photon, medium, table, config, &mut local);
                        progress.tick();
                    }
                    local
                })
                .reduce(
                    || LocalGrid::zeroed(dims),
                    |mut acc, other| {
                        acc.add_local(&other);
                        acc
                    },
                );

            let fluence = FluenceGrid::zeroed(dims);
            fluence.merge_from_local(&merged);
            fluence
        }
    };

    let total_relaunches: u64 = photons.iter().map(|p| p.relaunch_count).sum();
    tracing::info!(
        total_relaunches,
        photons_launched = config.n_photons,
        "transport run complete"
    );

    RunResult {
        fluence,
        photons_launched: u64::try_from(config.n_photons).unwrap_or(u64::MAX),
        total_relaunches,
    }
}

fn run_photon(
    photon: &mut Photon,
    medium: &MediumGrid,
    table: &MaterialTable,
    config: &RunConfig,
    fluence: &FluenceGrid,
) {
    for _ in 0..config.totalmove {
        micro_step(photon, medium, table, config, |i, j, k, delta| {
            fluence.add(i, j, k, delta);
        });
    }
}

fn run_photon_local(
    photon: &mut Photon,
    medium: &MediumGrid,
    table: &MaterialTable,
    config: &RunConfig,
    local: &mut LocalGrid,
) {
    for _ in 0..config.totalmove {
        micro_step(photon, medium, table, config, |i, j, k, delta| {
            local.add(i, j, k, delta);
        });
    }
}

/// Executes one micro-step of the state machine described in the transport-kernel design:
/// scatter decision, voxel step, boundary/termination check and deposit.
fn micro_step(
    photon: &mut Photon,
    medium: &MediumGrid,
    table: &MaterialTable,
    config: &RunConfig,
    mut deposit: impl FnMut(usize, usize, usize, f32),
) {
    if photon.needs_fresh_jump() {
        let u = photon.rng.uniform_open();
        photon.r = -u.ln();

        if photon.weight < 1.0 {
            sample_henyey_greenstein(photon, current_g(photon, medium, table));
            photon.scatter_count += 1;
        }
    }

    let (vi, vj, vk) = voxel_index(photon.position);
    let id = medium.lookup_material(vi, vj, vk);
    let material = table.get(id);

    let delta = config.minstep * material.mu_s;

    if delta > photon.r {
        let step_length = if material.mu_s > 0.0 {
            photon.r / material.mu_s
        } else {
            0.0
        };
        advance(photon, step_length);
        photon.weight *= (-material.mu_a * step_length).exp();
        photon.pathlength += step_length;
        photon.r = FRESH_JUMP_SENTINEL;
    } else {
        advance(photon, config.minstep);
        photon.weight *= (-material.mu_a * config.minstep).exp();
        photon.r -= delta;
        photon.pathlength += config.minstep;
    }

    let (vi, vj, vk) = voxel_index(photon.position);
    let out_of_bounds = {
        let (nx, ny, nz) = medium.dims();
        vi < 0
            || vj < 0
            || vk < 0
            || vi as usize >= nx
            || vj as usize >= ny
            || vk as usize >= nz
    };

    if photon.r > config.lmax || out_of_bounds {
        photon.relaunch();
    } else if photon.r > 0.0 {
        deposit(vi as usize, vj as usize, vk as usize, photon.weight as f32);
    }
}

/// The anisotropy of the material the photon currently occupies, used to parametrize the
/// Henyey-Greenstein draw.
fn current_g(photon: &Photon, medium: &MediumGrid, table: &MaterialTable) -> f64 {
    let (i, j, k) = voxel_index(photon.position);
    table.get(medium.lookup_material(i, j, k)).g
}

fn voxel_index(position: Vec3) -> (i64, i64, i64) {
    (
        position[0].floor() as i64,
        position[1].floor() as i64,
        position[2].floor() as i64,
    )
}

fn advance(photon: &mut Photon, length: f64) {
    photon.position[0] += photon.direction[0] * length;
    photon.position[1] += photon.direction[1] * length;
    photon.position[2] += photon.direction[2] * length;
}

/// Draws a new direction by Henyey-Greenstein scattering with anisotropy `g`, special-casing the
/// `g == 0` singularity to uniform sampling of `cos(theta)`.
fn sample_henyey_greenstein(photon: &mut Photon, g: f64) {
    let phi = 2.0 * std::f64::consts::PI * photon.rng.uniform_open();
    let u = photon.rng.uniform_open();

    let cos_theta = if g == 0.0 {
        2.0 * u - 1.0
    } else {
        let term = (1.0 - g * g) / (1.0 - g + 2.0 * g * u);
        (1.0 + g * g - term * term) / (2.0 * g)
    };
    let cos_theta = cos_theta.clamp(-1.0, 1.0);
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

    let [dx, dy, dz] = photon.direction;
    let new_direction = if dz.abs() < 1.0 {
        let denom = (1.0 - dz * dz).sqrt();
        [
            sin_theta * (dx * dz * phi.cos() - dy * phi.sin()) / denom + dx * cos_theta,
            sin_theta * (dy * dz * phi.cos() + dx * phi.sin()) / denom + dy * cos_theta,
            -sin_theta * denom * phi.cos() + dz * cos_theta,
        ]
    } else {
        [
            sin_theta * phi.cos(),
            sin_theta * phi.sin(),
            cos_theta * dz.signum(),
        ]
    };

    photon.direction = new_direction;
}

impl LocalGrid {
    /// Adds another [`LocalGrid`]'s cells into this one; used to fold per-chunk grids together
    /// before the final merge into the shared [`FluenceGrid`].
    pub(crate) fn add_local(&mut self, other: &Self) {
        self.merge_cells(other);
    }
}
