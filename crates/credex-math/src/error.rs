//! Error type shared by the numerical routines.

use thiserror::Error;

/// Result alias for the numerical routines.
pub type MathResult<T> = Result<T, MathError>;

/// Failure modes of the solvers and linear algebra helpers.
#[derive(Error, Debug, Clone)]
pub enum MathError {
    /// The iteration budget ran out before the residual met tolerance.
    #[error("root search gave up after {iterations} iterations, residual {residual:.3e}")]
    ConvergenceFailed {
        /// Iterations spent before giving up.
        iterations: u32,
        /// Residual `|f(x)|` at the final iterate.
        residual: f64,
    },

    /// A bracketing solver was given endpoints without a sign change.
    #[error("no sign change over [{a}, {b}]: f(a) = {fa:.3e}, f(b) = {fb:.3e}")]
    InvalidBracket {
        /// Lower endpoint.
        a: f64,
        /// Upper endpoint.
        b: f64,
        /// Function value at `a`.
        fa: f64,
        /// Function value at `b`.
        fb: f64,
    },

    /// A denominator (typically a derivative) was too close to zero.
    #[error("denominator too close to zero: {value:.3e}")]
    DivisionByZero {
        /// The offending value.
        value: f64,
    },

    /// The matrix is singular to working precision.
    #[error("matrix is singular to working precision")]
    SingularMatrix,

    /// Operand shapes do not line up.
    #[error("dimension mismatch: {rows1}x{cols1} against {rows2}x{cols2}")]
    DimensionMismatch {
        /// Rows of the first operand.
        rows1: usize,
        /// Columns of the first operand.
        cols1: usize,
        /// Rows of the second operand.
        rows2: usize,
        /// Columns of the second operand.
        cols2: usize,
    },

    /// An argument failed validation before any computation ran.
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// What was wrong with the argument.
        reason: String,
    },
}

impl MathError {
    /// Convergence failure with the iteration count and final residual.
    #[must_use]
    pub fn convergence_failed(iterations: u32, residual: f64) -> Self {
        Self::ConvergenceFailed {
            iterations,
            residual,
        }
    }

    /// Validation failure with a human-readable reason.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MathError::convergence_failed(100, 1e-6);
        assert!(err.to_string().contains("100 iterations"));

        let err = MathError::invalid_input("negative time");
        assert!(err.to_string().contains("negative time"));
    }
}
