//! Stable evaluation of `(e^x - 1) / x` and related functions.
//!
//! The closed-form integrals of the credit model reduce to expressions
//! of the form `(e^x - 1) / x` and its first and second derivatives,
//! evaluated at small arguments where naive division loses all
//! precision. Each function switches to a truncated Taylor series
//! below a threshold chosen so the series error is under machine
//! precision at the switch-over point.

/// Computes `(e^x - 1) / x` with a Taylor fallback for small `x`.
#[must_use]
pub fn epsilon(x: f64) -> f64 {
    if x.abs() > 1e-10 {
        x.exp_m1() / x
    } else {
        1.0 + x * (1.0 / 2.0 + x * (1.0 / 6.0 + x / 24.0))
    }
}

/// Computes the first derivative of `(e^x - 1) / x`.
///
/// The closed form is `((x - 1) * (e^x - 1) + x) / x^2`.
#[must_use]
pub fn epsilon_p(x: f64) -> f64 {
    if x.abs() > 1e-7 {
        ((x - 1.0) * x.exp_m1() + x) / (x * x)
    } else {
        1.0 / 2.0 + x * (1.0 / 3.0 + x * (1.0 / 8.0 + x / 30.0))
    }
}

/// Computes the second derivative of `(e^x - 1) / x`.
///
/// The closed form is `((e^x - 1) * (x^2 - 2x + 2) + x * (x - 2)) / x^3`.
#[must_use]
pub fn epsilon_pp(x: f64) -> f64 {
    if x.abs() > 1e-5 {
        (x.exp_m1() * (x * x - 2.0 * x + 2.0) + x * (x - 2.0)) / (x * x * x)
    } else {
        1.0 / 3.0 + x * (1.0 / 4.0 + x * (1.0 / 10.0 + x / 36.0))
    }
}
