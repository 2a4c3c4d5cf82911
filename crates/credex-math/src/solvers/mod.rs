//! Root-finding algorithms.
//!
//! This module provides the numerical solvers used by curve calibration:
//!
//! - [`newton_raphson`]: fast quadratic convergence when a derivative is available
//! - [`brent`]: robust bracketing method combining bisection, secant, and
//!   inverse quadratic interpolation
//! - [`bisection`]: simple and reliable bracketing method
//!
//! Credit curve calibration drives Newton-Raphson with an analytic PV
//! derivative and falls back to Brent on a grown bracket when Newton
//! fails to converge.
//!
//! # Example
//!
//! ```rust
//! use credex_math::solvers::{newton_raphson, SolverConfig};
//!
//! let f = |x: f64| x * x - 2.0;
//! let df = |x: f64| 2.0 * x;
//!
//! let result = newton_raphson(f, df, 1.5, &SolverConfig::default()).unwrap();
//! assert!((result.root - std::f64::consts::SQRT_2).abs() < 1e-10);
//! ```

mod bisection;
mod brent;
mod newton;

pub use bisection::bisection;
pub use brent::brent;
pub use newton::newton_raphson;

/// Tolerance used when no explicit config is supplied.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Iteration budget used when no explicit config is supplied.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Shared stopping criteria for the solvers.
#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    /// Stop once the residual or step size drops below this.
    pub tolerance: f64,
    /// Give up after this many iterations.
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SolverConfig {
    /// Stopping criteria from an explicit tolerance and iteration budget.
    #[must_use]
    pub fn new(tolerance: f64, max_iterations: u32) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Replaces the tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Replaces the iteration budget.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// A converged root together with how the search went.
#[derive(Debug, Clone, Copy)]
pub struct SolverResult {
    /// The root.
    pub root: f64,
    /// Iterations spent.
    pub iterations: u32,
    /// `f(root)` at termination.
    pub residual: f64,
}
