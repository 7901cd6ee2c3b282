//! Per-photon RNG substrate (component E): a seedable, deterministic uniform `(0, 1)` stream.
//!
//! The transport kernel only ever needs `U(0, 1)` draws; [`PhotonRng`] wraps a PCG64 generator
//! (period far beyond the `2^32` floor this crate's contract requires) behind that single
//! operation so the kernel and the Mie sampling tests share one substrate.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

/// Per-photon random source. Not `Clone`/`Copy`: each photon task owns exactly one instance for
/// its lifetime.
#[derive(Debug)]
pub struct PhotonRng {
    inner: Pcg64,
}

impl PhotonRng {
    /// Seeds a generator from a 32-bit integer. Deterministic: the same seed always produces the
    /// same draw sequence.
    #[must_use]
    pub fn from_seed(seed: u32) -> Self {
        Self {
            inner: Pcg64::seed_from_u64(u64::from(seed)),
        }
    }

    /// Draws a uniform real in `(0, 1)`, excluding both endpoints so that `-log(u)` and similar
    /// transforms used by the transport kernel never see `0` or `1`.
    pub fn uniform_open(&mut self) -> f64 {
        loop {
            let u: f64 = self.inner.random();
            if u > 0.0 && u < 1.0 {
                return u;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_reproduces_same_sequence() {
        let mut a = PhotonRng::from_seed(42);
        let mut b = PhotonRng::from_seed(42);

        let seq_a: Vec<f64> = (0..16).map(|_| a.uniform_open()).collect();
        let seq_b: Vec<f64> = (0..16).map(|_| b.uniform_open()).collect();

        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = PhotonRng::from_seed(1);
        let mut b = PhotonRng::from_seed(2);

        let seq_a: Vec<f64> = (0..16).map(|_| a.uniform_open()).collect();
        let seq_b: Vec<f64> = (0..16).map(|_| b.uniform_open()).collect();

        assert_ne!(seq_a, seq_b);
    }

    #[test]
    fn draws_stay_in_open_interval() {
        let mut rng = PhotonRng::from_seed(7);
        for _ in 0..10_000 {
            let u = rng.uniform_open();
            assert!(u > 0.0 && u < 1.0);
        }
    }
}
