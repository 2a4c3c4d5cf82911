//! Newton-Raphson iteration with a caller-supplied derivative.

use crate::error::{MathError, MathResult};
use crate::solvers::{SolverConfig, SolverResult};

/// Finds a root of `f` by Newton-Raphson, given its derivative `df`.
///
/// Each step moves from `x` to `x - f(x) / df(x)`. Convergence is
/// declared when either the residual `|f(x)|` or the last step falls
/// below `config.tolerance`; near a simple root the iteration is
/// quadratic, so a good seed (an analytic spread-to-hazard estimate,
/// say) converges in a handful of steps.
///
/// # Errors
///
/// `MathError::DivisionByZero` when the derivative vanishes at an
/// iterate, `MathError::ConvergenceFailed` when the iteration budget
/// runs out; callers with a bracket can fall back to [`brent`].
///
/// [`brent`]: crate::solvers::brent
///
/// # Example
///
/// ```rust
/// use credex_math::solvers::{newton_raphson, SolverConfig};
///
/// let f = |x: f64| x * x - 2.0;
/// let df = |x: f64| 2.0 * x;
///
/// let result = newton_raphson(f, df, 1.5, &SolverConfig::default()).unwrap();
/// assert!((result.root - std::f64::consts::SQRT_2).abs() < 1e-10);
/// ```
pub fn newton_raphson<F, DF>(
    f: F,
    df: DF,
    initial_guess: f64,
    config: &SolverConfig,
) -> MathResult<SolverResult>
where
    F: Fn(f64) -> f64,
    DF: Fn(f64) -> f64,
{
    let mut x = initial_guess;
    let mut residual = f(x);

    for iteration in 0..config.max_iterations {
        if residual.abs() < config.tolerance {
            return Ok(SolverResult {
                root: x,
                iterations: iteration,
                residual,
            });
        }

        let slope = df(x);
        if slope.abs() < 1e-15 {
            return Err(MathError::DivisionByZero { value: slope });
        }

        let step = residual / slope;
        x -= step;
        residual = f(x);

        if step.abs() < config.tolerance {
            return Ok(SolverResult {
                root: x,
                iterations: iteration + 1,
                residual,
            });
        }
    }

    Err(MathError::convergence_failed(
        config.max_iterations,
        residual.abs(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sqrt_2() {
        let f = |x: f64| x * x - 2.0;
        let df = |x: f64| 2.0 * x;

        let result = newton_raphson(f, df, 1.5, &SolverConfig::default()).unwrap();

        assert_relative_eq!(result.root, std::f64::consts::SQRT_2, epsilon = 1e-10);
        assert!(result.iterations < 10);
    }

    #[test]
    fn test_flat_hazard_calibration_shape() {
        // Survival-weighted annuity equals a target: the shape solved per
        // credit curve pillar
        let t = 5.0;
        let target = 4.5;
        let f = |h: f64| (1.0 - (-h * t).exp()) / h - target;
        let df = |h: f64| {
            let e = (-h * t).exp();
            (t * h * e - (1.0 - e)) / (h * h)
        };

        let result = newton_raphson(f, df, 0.05, &SolverConfig::default()).unwrap();
        assert!(f(result.root).abs() < 1e-10);
    }

    #[test]
    fn test_zero_derivative_error() {
        let f = |x: f64| x * x * x - 1.0;
        let df = |x: f64| 3.0 * x * x;

        let result = newton_raphson(f, df, 0.0, &SolverConfig::default());
        assert!(matches!(result, Err(MathError::DivisionByZero { .. })));
    }

    #[test]
    fn test_convergence_failure_reports_iterations() {
        // Alternating iterates: x^3 - 2x + 2 cycles from x = 0
        let f = |x: f64| x * x * x - 2.0 * x + 2.0;
        let df = |x: f64| 3.0 * x * x - 2.0;

        let config = SolverConfig::new(1e-12, 8);
        let result = newton_raphson(f, df, 0.0, &config);

        match result {
            Err(MathError::ConvergenceFailed { iterations, .. }) => assert_eq!(iterations, 8),
            other => panic!("expected convergence failure, got {other:?}"),
        }
    }
}
