//! Error taxonomy for the scattering-parameter precomputation and transport kernel.

use thiserror::Error;

/// Catch-all error for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied parameter is outside the domain the algorithm is defined on, e.g. a
    /// non-positive size parameter.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The input is mathematically well-formed but outside the validated range (size parameter
    /// beyond 20 000), so the result would be silently unreliable.
    #[error("unvalidated regime: {0}")]
    Unvalidated(String),
    /// A Lentz continued fraction or recurrence failed to converge within the iteration cap.
    #[error("convergence failure: {0}")]
    ConvergenceFailure(String),
    /// Allocation of a transient working array failed.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
