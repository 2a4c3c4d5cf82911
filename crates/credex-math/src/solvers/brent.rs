//! Brent's method: bracketed root finding with interpolated steps.

use crate::error::{MathError, MathResult};
use crate::solvers::{SolverConfig, SolverResult};

/// Finds a root of `f` inside the bracket `[a, b]` by Brent's method.
///
/// Each iteration tries an inverse-quadratic (or secant) step through
/// the last three iterates and falls back to bisection whenever the
/// interpolated point leaves the bracket half nearest the best iterate
/// or stops shrinking the interval. Convergence is therefore never
/// worse than bisection. Curve calibration uses this as the fallback
/// when Newton-Raphson leaves the admissible hazard-rate range.
///
/// Requires a sign change over the bracket, `f(a) * f(b) <= 0`.
///
/// # Example
///
/// ```rust
/// use credex_math::solvers::{brent, SolverConfig};
///
/// let f = |x: f64| x * x * x - x - 2.0;
///
/// let result = brent(f, 1.0, 2.0, &SolverConfig::default()).unwrap();
/// assert!(f(result.root).abs() < 1e-10);
/// ```
#[allow(clippy::many_single_char_names)]
pub fn brent<F>(f: F, a: f64, b: f64, config: &SolverConfig) -> MathResult<SolverResult>
where
    F: Fn(f64) -> f64,
{
    let (mut a, mut b) = (a, b);
    let (mut fa, mut fb) = (f(a), f(b));

    if fa * fb > 0.0 {
        return Err(MathError::InvalidBracket { a, b, fa, fb });
    }

    // b holds the best iterate, a the contrapoint
    if fa.abs() < fb.abs() {
        std::mem::swap(&mut a, &mut b);
        std::mem::swap(&mut fa, &mut fb);
    }

    let (mut c, mut fc) = (a, fa);
    let mut step = b - a;
    let mut last_step = step;

    for iteration in 0..config.max_iterations {
        if fb.abs() < config.tolerance || (b - a).abs() < config.tolerance {
            return Ok(SolverResult {
                root: b,
                iterations: iteration,
                residual: fb,
            });
        }

        let midpoint = 0.5 * (a + b);

        let interpolated = if fa != fc && fb != fc {
            // Inverse quadratic through (a, fa), (b, fb), (c, fc)
            Some(
                a * fb * fc / ((fa - fb) * (fa - fc))
                    + b * fa * fc / ((fb - fa) * (fb - fc))
                    + c * fa * fb / ((fc - fa) * (fc - fb)),
            )
        } else if fa != fb {
            Some(b - fb * (b - a) / (fb - fa))
        } else {
            None
        };

        let accepted = interpolated.filter(|&s| {
            let inside = s > midpoint.min(b) && s < midpoint.max(b);
            inside && (s - b).abs() < last_step.abs() / 2.0
        });

        let s = match accepted {
            Some(s) => {
                last_step = step;
                step = s - b;
                s
            }
            None => {
                step = b - a;
                last_step = step;
                midpoint
            }
        };

        c = b;
        fc = fb;

        let fs = f(s);
        if fa * fs < 0.0 {
            b = s;
            fb = fs;
        } else {
            a = s;
            fa = fs;
        }

        if fa.abs() < fb.abs() {
            std::mem::swap(&mut a, &mut b);
            std::mem::swap(&mut fa, &mut fb);
        }
    }

    Err(MathError::convergence_failed(
        config.max_iterations,
        fb.abs(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sqrt_2() {
        let f = |x: f64| x * x - 2.0;

        let result = brent(f, 1.0, 2.0, &SolverConfig::default()).unwrap();

        assert_relative_eq!(result.root, std::f64::consts::SQRT_2, epsilon = 1e-10);
    }

    #[test]
    fn test_cubic() {
        let f = |x: f64| x * x * x - x - 2.0;

        let result = brent(f, 1.0, 2.0, &SolverConfig::default()).unwrap();

        assert!(f(result.root).abs() < 1e-10);
        assert_relative_eq!(result.root, 1.521_379_706_804_568, epsilon = 1e-10);
    }

    #[test]
    fn test_invalid_bracket() {
        let f = |x: f64| x * x - 2.0;

        let result = brent(f, 2.0, 3.0, &SolverConfig::default());
        assert!(matches!(result, Err(MathError::InvalidBracket { .. })));
    }

    #[test]
    fn test_steep_function() {
        // Hazard-rate-like residual with steep gradient near zero
        let f = |h: f64| (-h * 10.0).exp() - 0.5;

        let result = brent(f, 1e-6, 1.0, &SolverConfig::default()).unwrap();
        assert_relative_eq!(result.root, 0.5_f64.ln() / -10.0, epsilon = 1e-9);
    }
}
