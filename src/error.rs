//! Error types for trimming and unfolding.

use thiserror::Error;

/// Result type for rmt-unfold operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied parameter violates its constraint.
    #[error("invalid configuration: {parameter} {constraint}")]
    Configuration {
        parameter: &'static str,
        constraint: String,
    },

    /// A single fit failed; recoverable at the level of one grid cell.
    #[error("{smoother} fit did not converge: {reason}")]
    FitNonConvergence { smoother: String, reason: String },

    /// Too few eigenvalues for the requested operation.
    #[error("degenerate input: {context} needs at least {required} eigenvalues (got {got})")]
    DegenerateInput {
        context: String,
        required: usize,
        got: usize,
    },

    #[error("non-finite eigenvalue {value} at index {index}")]
    NonFinite { index: usize, value: f64 },

    #[error("dimension mismatch: {0} vs {1}")]
    DimensionMismatch(usize, usize),

    #[error("invalid trim window [{start}, {end}) for {len} eigenvalues")]
    InvalidWindow { start: usize, end: usize, len: usize },
}

impl Error {
    pub(crate) fn config(parameter: &'static str, constraint: impl Into<String>) -> Self {
        Error::Configuration {
            parameter,
            constraint: constraint.into(),
        }
    }

    pub(crate) fn no_convergence(smoother: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::FitNonConvergence {
            smoother: smoother.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn degenerate(context: impl Into<String>, required: usize, got: usize) -> Self {
        Error::DegenerateInput {
            context: context.into(),
            required,
            got,
        }
    }

    /// Whether the failure is local to one (window, smoother) cell.
    ///
    /// Recoverable errors exclude a cell from the score grid; everything else
    /// is a caller contract violation and aborts the search.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::FitNonConvergence { .. } | Error::DegenerateInput { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_parameter() {
        let err = Error::config("spline degree", "must be in 1..=5 (got 7)");
        assert_eq!(
            err.to_string(),
            "invalid configuration: spline degree must be in 1..=5 (got 7)"
        );
    }

    #[test]
    fn test_recoverable_split() {
        assert!(Error::no_convergence("gompertz", "diverged").is_recoverable());
        assert!(Error::degenerate("poly_5", 6, 3).is_recoverable());
        assert!(!Error::config("max_trim", "must be in (0, 1)").is_recoverable());
        assert!(!Error::DimensionMismatch(3, 4).is_recoverable());
    }
}
