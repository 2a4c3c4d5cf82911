//! Error types for CDS pricing and curve construction.

use thiserror::Error;

/// A specialized Result type for CDS analytics operations.
pub type IsdaResult<T> = Result<T, IsdaError>;

/// The error type for CDS pricing, schedule generation, and curve
/// calibration.
#[derive(Error, Debug, Clone)]
pub enum IsdaError {
    /// Invalid input to a pricing or curve operation.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of what's invalid.
        reason: String,
    },

    /// Two related slices have different lengths.
    #[error("Length mismatch: {name1} has {len1} elements but {name2} has {len2}")]
    LengthMismatch {
        /// Name of the first slice.
        name1: &'static str,
        /// Length of the first slice.
        len1: usize,
        /// Name of the second slice.
        name2: &'static str,
        /// Length of the second slice.
        len2: usize,
    },

    /// Premium leg schedule could not be built.
    #[error("Schedule error: {reason}")]
    ScheduleError {
        /// Description of the failure.
        reason: String,
    },

    /// Curve calibration failed to converge.
    #[error("Calibration failed at pillar {pillar} after {iterations} iterations (residual: {residual:.2e})")]
    CalibrationFailed {
        /// Index of the pillar being solved.
        pillar: usize,
        /// Number of iterations attempted.
        iterations: u32,
        /// Final residual value.
        residual: f64,
    },

    /// Calibrated hazard rates imply a negative forward hazard rate.
    #[error("Arbitrage violation at pillar {pillar}: hazard rate {hazard_rate:.6} implies a negative forward hazard rate")]
    ArbitrageViolation {
        /// Index of the offending pillar.
        pillar: usize,
        /// The solved zero hazard rate.
        hazard_rate: f64,
    },

    /// Error from a date or calendar operation.
    #[error(transparent)]
    Core(#[from] credex_core::CoreError),

    /// Error from a numerical routine.
    #[error(transparent)]
    Math(#[from] credex_math::MathError),
}

impl IsdaError {
    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates a schedule error.
    #[must_use]
    pub fn schedule_error(reason: impl Into<String>) -> Self {
        Self::ScheduleError {
            reason: reason.into(),
        }
    }

    /// Creates a length mismatch error.
    #[must_use]
    pub fn length_mismatch(name1: &'static str, len1: usize, name2: &'static str, len2: usize) -> Self {
        Self::LengthMismatch {
            name1,
            len1,
            name2,
            len2,
        }
    }

    /// Creates a calibration failure error.
    #[must_use]
    pub fn calibration_failed(pillar: usize, iterations: u32, residual: f64) -> Self {
        Self::CalibrationFailed {
            pillar,
            iterations,
            residual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IsdaError::calibration_failed(3, 100, 1e-6);
        assert!(err.to_string().contains("pillar 3"));
    }

    #[test]
    fn test_math_error_converts() {
        let math_err = credex_math::MathError::convergence_failed(50, 1e-4);
        let err: IsdaError = math_err.into();
        assert!(err.to_string().contains("50 iterations"));
    }
}
