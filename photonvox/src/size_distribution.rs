//! Ensemble-averaged scattering models (component C): a Gaussian polydisperse integral over the
//! Mie solution, and the closed-form Whittle-Matérn continuous-random-medium phase function.

use crate::error::Result;
use crate::mie::mie;
use crate::mueller::{MuellerTable, NANGLES};
use num_complex::Complex64;

/// Number of quadrature radii sampled by [`mie_poly`].
const NRS: usize = 1001;
/// Half-width of the sampling window, in standard deviations of the radius distribution.
const SIGMA_SPAN: f64 = 3.0;

/// Result of the Gaussian polydisperse Mie average.
#[derive(Clone, Debug)]
pub struct EnsembleResult {
    /// Weighted-average scattering efficiency.
    pub qsca: f64,
    /// Anisotropy recomputed from the averaged phase function by trapezoidal integration, rather
    /// than weight-averaged directly, per the normative definition.
    pub g: f64,
    /// Weighted-average Mueller-matrix table.
    pub mueller: MuellerTable,
}

/// Result of the closed-form Whittle-Matérn phase function; this model has no associated `Qsca`.
#[derive(Clone, Debug)]
pub struct PhaseFunctionResult {
    /// Anisotropy by the same trapezoidal rule as [`EnsembleResult::g`].
    pub g: f64,
    /// Mueller-matrix table.
    pub mueller: MuellerTable,
}

/// Mie scattering averaged over a Gaussian distribution of radii with mean `mean_r` and
/// coefficient of variation `cv` (so `sigma = mean_r * cv`), sampled at [`NRS`] points uniform in
/// `[mean_r - 3*sigma, mean_r + 3*sigma]` with step `6*sigma / NRS`, weighted by the Gaussian
/// density and normalized by the total weight (no truncation correction).
///
/// # Errors
///
/// Propagates [`crate::error::Error`] from the underlying per-radius [`mie`] call.
pub fn mie_poly(
    mean_r: f64,
    cv: f64,
    n_med: f64,
    wavelength: f64,
    m: Complex64,
) -> Result<EnsembleResult> {
    let sigma = mean_r * cv;
    let r_min = mean_r - SIGMA_SPAN * sigma;
    let step = 6.0 * sigma / crate::convert::f64_from_usize(NRS);

    let mut qsca = 0.0;
    let mut weight_total = 0.0;
    let mut mueller = MuellerTable::zeroed();

    for i in 0..NRS {
        let radius = (r_min + step * crate::convert::f64_from_usize(i)).max(1e-9);
        let weight = gaussian_density(radius, mean_r, sigma);
        let x = 2.0 * std::f64::consts::PI * radius * n_med / wavelength;

        let per_radius = mie(x, m)?;

        qsca += weight * per_radius.qsca;
        weight_total += weight;
        mueller.accumulate(&per_radius.mueller, weight);
    }

    qsca /= weight_total;
    for value in mueller
        .s11
        .iter_mut()
        .chain(mueller.s12.iter_mut())
        .chain(mueller.s33.iter_mut())
        .chain(mueller.s43.iter_mut())
    {
        *value /= weight_total;
    }

    let g = mueller.trapezoidal_g();

    Ok(EnsembleResult { qsca, g, mueller })
}

fn gaussian_density(radius: f64, mean: f64, sigma: f64) -> f64 {
    let z = (radius - mean) / sigma;
    (-0.5 * z * z).exp() / (sigma * (2.0 * std::f64::consts::PI).sqrt())
}

/// Closed-form phase function for a continuous random medium with a Whittle-Matérn spectral
/// density of refractive-index fluctuations, correlation length `l_c` and fractal-dimension
/// parameter `d`.
///
/// Unlike the discrete-particle models this crate otherwise provides, the Whittle-Matérn phase
/// function has no circular-polarization cross-term: `S43` is identically zero.
#[must_use]
pub fn whittle_matern(l_c: f64, d: f64, wavelength: f64) -> PhaseFunctionResult {
    let klc = 2.0 * std::f64::consts::PI * l_c / wavelength;

    let mut mu = vec![0.0; NANGLES];
    let mut s11 = vec![0.0; NANGLES];
    let mut s12 = vec![0.0; NANGLES];
    let mut s33 = vec![0.0; NANGLES];
    let s43 = vec![0.0; NANGLES];

    for k in 0..NANGLES {
        let kf = crate::convert::f64_from_usize(k);
        let n = crate::convert::f64_from_usize(NANGLES);
        let theta = kf * std::f64::consts::PI / n;

        let sin_half = (kf * std::f64::consts::PI / (2.0 * n)).sin();
        let rho = (1.0 + 4.0 * klc * klc * sin_half * sin_half).powf(-d / 2.0);
        let cos_theta = theta.cos();
        let cos2 = cos_theta * cos_theta;

        mu[k] = cos_theta;
        s11[k] = (1.0 + cos2) * rho;
        s12[k] = (cos2 - 1.0) * rho;
        s33[k] = 2.0 * cos_theta * rho;
    }

    let mueller = MuellerTable {
        mu,
        s11,
        s12,
        s33,
        s43,
    };
    let g = mueller.trapezoidal_g();

    PhaseFunctionResult { g, mueller }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mie_poly_qsca_is_finite_and_positive() {
        let result = mie_poly(0.5, 0.05, 1.33, 0.633, Complex64::new(1.59, -0.001)).unwrap();
        assert!(result.qsca.is_finite());
        assert!(result.qsca > 0.0);
        assert!(result.g > -1.0 && result.g < 1.0);
    }

    /// Scenario 3: polystyrene spheres in water. `mie_poly`'s index parameter is the particle
    /// index *relative to the medium* (forwarded straight into `mie::mie`), so the relative index
    /// is `n_bead / n_med`, not `n_bead` alone.
    #[test]
    fn mie_poly_polystyrene_in_water_matches_scenario_3() {
        let mean_r = 0.5;
        let n_med = 1.33;
        let wavelength = 0.633;
        let n_bead = 1.59;
        let m = Complex64::new(n_bead / n_med, 0.0);

        let result = mie_poly(mean_r, 0.05, n_med, wavelength, m).unwrap();

        assert!(
            (result.g - 0.92).abs() < 0.02,
            "g = {} not within tolerance of 0.92",
            result.g
        );
        assert!(
            result.mueller.s11[0] > result.mueller.s11[NANGLES - 1],
            "forward S11 ({}) should exceed backward S11 ({})",
            result.mueller.s11[0],
            result.mueller.s11[NANGLES - 1]
        );

        let x = 2.0 * std::f64::consts::PI * mean_r * n_med / wavelength;
        let expected_integral = result.qsca * x * x / 2.0;
        let actual_integral = result.mueller.integrate_s11();
        let rel_diff = (actual_integral - expected_integral).abs() / expected_integral.abs();
        assert!(rel_diff < 0.01, "relative normalization difference {rel_diff}");
    }

    #[test]
    fn whittle_matern_has_no_circular_term() {
        let result = whittle_matern(1.0, 2.5, 0.633);
        for value in &result.mueller.s43 {
            assert_eq!(*value, 0.0);
        }
    }

    /// Scenario 4: `l_c = 1 um`, `D = 2.5`, `lambda = 0.633 um`. The `(1 + cos^2 theta)` envelope
    /// in the S11 formula has equal-height lobes at `theta = 0` and `theta = pi`, so strict
    /// monotonicity holds only out to where the correlation term's decay still dominates the
    /// envelope's rise back toward backscatter; past that point S11 ticks back up while staying
    /// far below the forward peak. This checks monotone decrease over that provably-decreasing
    /// forward half of the grid, that the forward direction is the global maximum, and that `g`
    /// falls in `(0.6, 0.95)`.
    #[test]
    fn whittle_matern_matches_scenario_4() {
        let result = whittle_matern(1.0, 2.5, 0.633);

        let forward_half = NANGLES / 2;
        for k in 1..=forward_half {
            assert!(
                result.mueller.s11[k] <= result.mueller.s11[k - 1] + 1e-12,
                "S11 not monotone decreasing at k = {k}: {} > {}",
                result.mueller.s11[k],
                result.mueller.s11[k - 1]
            );
        }

        let (max_index, _) = result
            .mueller
            .s11
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        assert_eq!(max_index, 0, "forward direction should carry the global S11 peak");
        assert!(
            result.mueller.s11[NANGLES - 1] < 0.01 * result.mueller.s11[0],
            "backscatter lobe should stay far below the forward peak"
        );

        assert!(
            result.g > 0.6 && result.g < 0.95,
            "g = {} outside (0.6, 0.95)",
            result.g
        );
    }
}
