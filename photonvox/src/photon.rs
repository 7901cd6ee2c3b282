//! Per-photon state (component F): position, direction, residual free-flight, weight, path
//! length, and scatter/relaunch counters. Mutated only by the kernel thread that owns the photon.

use crate::rng::PhotonRng;

/// A negative sentinel for `r` signaling "a fresh free flight must be drawn before the next
/// micro-step", distinct from `r == 0.0` which a drawn-but-unconsumed free flight can also reach
/// transiently.
pub const FRESH_JUMP_SENTINEL: f64 = -1.0;

/// A 3-vector, used for both position (voxel-index units) and direction (unit-norm).
pub type Vec3 = [f64; 3];

/// Per-photon mutable state advanced by the transport kernel.
#[derive(Debug)]
pub struct Photon {
    /// Current position in voxel-index units.
    pub position: Vec3,
    /// Current unit direction.
    pub direction: Vec3,
    /// Current statistical weight, `w in (0, 1]`.
    pub weight: f64,
    /// Residual free-flight budget, in mean-free-path units. [`FRESH_JUMP_SENTINEL`] when a new
    /// flight must be sampled before the next voxel step.
    pub r: f64,
    /// Cumulative path length traveled so far (across relaunches).
    pub pathlength: f64,
    /// Number of Henyey-Greenstein scattering events so far in the current life of the photon.
    pub scatter_count: u64,
    /// Number of times this photon has exited the grid and been relaunched.
    pub relaunch_count: u64,
    /// Launch position, restored verbatim on relaunch.
    launch_position: Vec3,
    /// Launch direction, restored verbatim on relaunch.
    launch_direction: Vec3,
    /// This photon's exclusive RNG stream.
    pub rng: PhotonRng,
}

impl Photon {
    /// Launches a photon at `position` traveling along unit `direction`, seeded from `seed`.
    #[must_use]
    pub fn launch(position: Vec3, direction: Vec3, seed: u32) -> Self {
        Self {
            position,
            direction,
            weight: 1.0,
            r: 0.0,
            pathlength: 0.0,
            scatter_count: 0,
            relaunch_count: 0,
            launch_position: position,
            launch_direction: direction,
            rng: PhotonRng::from_seed(seed),
        }
    }

    /// Resets state to the launch condition (used when the photon exits the grid or its free
    /// flight exceeds `lmax`), preserving the RNG stream and relaunch counter.
    pub fn relaunch(&mut self) {
        self.position = self.launch_position;
        self.direction = self.launch_direction;
        self.weight = 1.0;
        self.r = 0.0;
        self.pathlength = 0.0;
        self.scatter_count = 0;
        self.relaunch_count += 1;
    }

    /// `true` once this photon's free flight must be redrawn before the next voxel step.
    #[must_use]
    pub fn needs_fresh_jump(&self) -> bool {
        self.r <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relaunch_restores_launch_condition_and_counts() {
        let mut photon = Photon::launch([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], 1);
        photon.position = [10.0, 5.0, 5.0];
        photon.weight = 0.2;
        photon.pathlength = 42.0;
        photon.scatter_count = 7;

        photon.relaunch();

        assert_eq!(photon.position, [0.0, 0.0, 0.0]);
        assert_eq!(photon.weight, 1.0);
        assert_eq!(photon.pathlength, 0.0);
        assert_eq!(photon.scatter_count, 0);
        assert_eq!(photon.relaunch_count, 1);
    }

    #[test]
    fn fresh_photon_needs_a_jump() {
        let photon = Photon::launch([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], 1);
        assert!(photon.needs_fresh_jump());
    }
}
