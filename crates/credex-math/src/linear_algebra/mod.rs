//! Dense linear solves.
//!
//! A single entry point over `nalgebra`'s pivoted LU, used to invert
//! the par-spread/hazard-rate Jacobian in analytic spread
//! sensitivities. Calibration Jacobians are small (one row per curve
//! pillar) and lower triangular, so a dense factorization is cheap and
//! pivoting keeps the solve stable when off-diagonal terms dominate.

use crate::error::{MathError, MathResult};
use nalgebra::{DMatrix, DVector};

/// Solves the square system `A x = b`.
///
/// # Errors
///
/// Returns `MathError::invalid_input` when `a` is not square,
/// `MathError::DimensionMismatch` when `b` has the wrong length, and
/// `MathError::SingularMatrix` when the factorization breaks down.
pub fn solve_linear_system(a: &DMatrix<f64>, b: &DVector<f64>) -> MathResult<DVector<f64>> {
    if a.nrows() != a.ncols() {
        return Err(MathError::invalid_input("matrix must be square"));
    }
    if b.len() != a.nrows() {
        return Err(MathError::DimensionMismatch {
            rows1: a.nrows(),
            cols1: a.ncols(),
            rows2: b.len(),
            cols2: 1,
        });
    }

    a.clone().lu().solve(b).ok_or(MathError::SingularMatrix)
}
