//! Angular sampling grid and Mueller-matrix table shared by the Mie engine, the polydisperse
//! integrator, and the Whittle-Matérn spectral model.

/// Number of angular samples used by the phase-function tables. A fixed, odd count keeps
/// `cos(theta) == 0` exactly representable at the midpoint, which the trapezoidal anisotropy
/// integral in [`MuellerTable::trapezoidal_g`] relies on for bit-reproducible forward/backward
/// symmetry checks.
pub const NANGLES: usize = 181;

/// The four independent Mueller-matrix entries for unpolarized incidence on a spherically
/// symmetric scatterer, tabulated over [`NANGLES`] uniformly spaced scattering angles.
#[derive(Clone, Debug)]
pub struct MuellerTable {
    /// Scattering-angle cosines, `mu[0] == 1.0` (forward) down to `mu[NANGLES - 1] == -1.0`
    /// (backward).
    pub mu: Vec<f64>,
    /// Total scattered intensity per unit incident irradiance, `S11 >= 0`.
    pub s11: Vec<f64>,
    /// Linear-polarization cross-term, `|S12| <= S11`.
    pub s12: Vec<f64>,
    /// Linear-to-linear phase term.
    pub s33: Vec<f64>,
    /// Circular-polarization cross-term; `S43[0] == 0` for a spherically symmetric scatterer.
    pub s43: Vec<f64>,
}

impl MuellerTable {
    /// Allocates a zeroed table over the standard angle grid.
    #[must_use]
    pub fn zeroed() -> Self {
        Self {
            mu: angle_cosines(),
            s11: vec![0.0; NANGLES],
            s12: vec![0.0; NANGLES],
            s33: vec![0.0; NANGLES],
            s43: vec![0.0; NANGLES],
        }
    }

    /// Accumulates `weight` times `other` into `self`, used by the Gaussian polydisperse average
    /// in [`crate::size_distribution::mie_poly`].
    pub fn accumulate(&mut self, other: &Self, weight: f64) {
        for k in 0..NANGLES {
            self.s11[k] += weight * other.s11[k];
            self.s12[k] += weight * other.s12[k];
            self.s33[k] += weight * other.s33[k];
            self.s43[k] += weight * other.s43[k];
        }
    }

    /// Recomputes the anisotropy by trapezoidal integration of `mu * S11` over the phase
    /// function, normalized by the integral of `S11` alone, as specified for the polydisperse
    /// integrator and the Whittle-Matérn model. The `k = 0` interval substitutes `mu[0] - 1`
    /// (which is `0`) for the missing `mu[-1]`, matching the reference convention.
    #[must_use]
    pub fn trapezoidal_g(&self) -> f64 {
        let mut numerator = 0.0;

        for k in 0..NANGLES {
            let interval = Self::interval(&self.mu, k);
            let avg_s11 = Self::trapezoidal_avg(&self.s11, k);
            numerator += self.mu[k] * avg_s11 * interval;
        }

        numerator / self.integrate_s11()
    }

    /// Trapezoidal integral of `S11` alone over the angle grid, using the same `k = 0`
    /// `mu[0] - 1` substitute interval as [`Self::trapezoidal_g`]'s denominator. Scenario 3's
    /// normalization check compares this against `Qsca * x^2 / 2`.
    #[must_use]
    pub fn integrate_s11(&self) -> f64 {
        let mut total = 0.0;
        for k in 0..NANGLES {
            total += Self::trapezoidal_avg(&self.s11, k) * Self::interval(&self.mu, k);
        }
        total
    }

    fn interval(mu: &[f64], k: usize) -> f64 {
        if k == 0 {
            (mu[0] - 1.0).abs()
        } else {
            (mu[k] - mu[k - 1]).abs()
        }
    }

    fn trapezoidal_avg(values: &[f64], k: usize) -> f64 {
        if k == 0 {
            values[0]
        } else {
            0.5 * (values[k] + values[k - 1])
        }
    }
}

/// The standard `NANGLES`-point angular grid, uniform in `theta` from `0` to `pi`.
#[must_use]
pub fn angle_cosines() -> Vec<f64> {
    (0..NANGLES)
        .map(|k| {
            let theta = std::f64::consts::PI * crate::convert::f64_from_usize(k)
                / crate::convert::f64_from_usize(NANGLES - 1);
            theta.cos()
        })
        .collect()
}
