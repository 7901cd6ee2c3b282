//! Complex recurrence primitives underlying the Mie engine: the Lentz continued-fraction seed
//! and the upward/downward logarithmic-derivative recursions of the Riccati-Bessel function
//! `psi_n`.

use num_complex::Complex64;

/// Iteration cap for the Lentz continued fraction before giving up with
/// [`crate::error::Error::ConvergenceFailure`].
const LENTZ_MAX_ITER: usize = 100_000;
const LENTZ_TOLERANCE: f64 = 1e-12;

/// Seeds the downward recurrence with the logarithmic derivative of `psi_n(z)` at order `n`,
/// computed via a Lentz continued fraction.
///
/// # Errors
///
/// Returns [`crate::error::Error::ConvergenceFailure`] if the fraction has not converged after
/// [`LENTZ_MAX_ITER`] iterations.
pub fn lentz_dn(z: Complex64, n: usize) -> crate::error::Result<Complex64> {
    let nf = crate::convert::f64_from_usize(n);

    let mut zinv = 2.0 / z;
    let alpha = (nf + 0.5) * zinv;
    let mut aj = -(nf + 1.5) * zinv;
    let mut alpha_j1 = aj + 1.0 / alpha;
    let mut alpha_j2 = aj;
    let mut ratio = alpha_j1 / alpha_j2;
    let mut runratio = alpha * ratio;

    for _ in 0..LENTZ_MAX_ITER {
        if (ratio - 1.0).norm() <= LENTZ_TOLERANCE {
            return Ok(-nf / z + runratio);
        }

        aj = zinv - aj;
        zinv = -zinv;
        alpha_j1 = 1.0 / alpha_j1 + aj;
        alpha_j2 = 1.0 / alpha_j2 + aj;
        ratio = alpha_j1 / alpha_j2;
        zinv = -zinv;
        runratio *= ratio;
    }

    Err(crate::error::Error::ConvergenceFailure(format!(
        "Lentz continued fraction did not converge for z = {z}, n = {n}"
    )))
}

/// Forward (upward) recurrence for the logarithmic derivative `D_k = psi_k'(z) / psi_k(z)`,
/// `k = 0..nstop-1`. Only numerically stable when `|Im(m)| * x` stays below an index-dependent
/// threshold; see `crate::mie::select_upward` for the dispatch criterion.
pub fn dn_up(z: Complex64, nstop: usize, d: &mut [Complex64]) {
    debug_assert!(d.len() >= nstop);

    d[0] = z.tan().finv();
    for k in 1..nstop {
        let kf = crate::convert::f64_from_usize(k);
        let k_over_z = kf / z;
        d[k] = 1.0 / (k_over_z - d[k - 1]) - k_over_z;
    }
}

/// Backward (downward) recurrence for the logarithmic derivative, seeded by [`lentz_dn`] at
/// `nstop - 1`. Mandatory for strongly absorbing media where the upward recurrence is unstable.
///
/// # Errors
///
/// Propagates [`lentz_dn`]'s convergence failure.
pub fn dn_down(z: Complex64, nstop: usize, d: &mut [Complex64]) -> crate::error::Result<()> {
    debug_assert!(d.len() >= nstop);

    d[nstop - 1] = lentz_dn(z, nstop)?;
    for k in (1..nstop).rev() {
        let kf = crate::convert::f64_from_usize(k);
        let k_over_z = kf / z;
        d[k - 1] = k_over_z - 1.0 / (d[k] + k_over_z);
    }

    Ok(())
}

/// Small helper trait giving `cot(z) = 1/tan(z)` a readable call site.
trait FInv {
    fn finv(self) -> Complex64;
}

impl FInv for Complex64 {
    fn finv(self) -> Complex64 {
        Complex64::new(1.0, 0.0) / self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn lentz_matches_downward_recurrence_seed() {
        let z = Complex64::new(10.0, -0.05);
        let nstop = 15;

        let seed = lentz_dn(z, nstop).unwrap();

        let mut d = vec![Complex64::new(0.0, 0.0); nstop];
        dn_down(z, nstop, &mut d).unwrap();

        assert_approx_eq!(f64, seed.re, d[nstop - 1].re, epsilon = 1e-8);
        assert_approx_eq!(f64, seed.im, d[nstop - 1].im, epsilon = 1e-8);
    }

    #[test]
    fn up_and_down_agree_for_moderate_real_index() {
        // For a weakly absorbing medium and moderate order both recurrences should be stable
        // and agree closely.
        let z = Complex64::new(5.0, -1e-4);
        let nstop = 10;

        let mut up = vec![Complex64::new(0.0, 0.0); nstop];
        dn_up(z, nstop, &mut up);

        let mut down = vec![Complex64::new(0.0, 0.0); nstop];
        dn_down(z, nstop, &mut down).unwrap();

        for k in 1..nstop {
            assert_approx_eq!(f64, up[k].re, down[k].re, epsilon = 1e-3);
            assert_approx_eq!(f64, up[k].im, down[k].im, epsilon = 1e-3);
        }
    }
}
