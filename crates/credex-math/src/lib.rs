//! # Credex Math
//!
//! Numerical utilities for the Credex credit analytics library.
//!
//! This crate provides:
//!
//! - **Solvers**: root-finding algorithms (Newton-Raphson, Brent, Bisection)
//! - **Linear Algebra**: dense LU linear solve for calibration Jacobians
//! - **Epsilon**: stable evaluation of `(e^x - 1) / x` and its derivatives,
//!   the kernel of the closed-form credit integrals
//!
//! ## Design Philosophy
//!
//! - **Numerical Stability**: careful handling of small arguments and
//!   degenerate brackets
//! - **Double Precision**: all routines operate on `f64`, matching the
//!   arithmetic of the standard credit model

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::if_not_else)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::return_self_not_must_use)]

pub mod epsilon;
pub mod error;
pub mod linear_algebra;
pub mod solvers;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::epsilon::{epsilon, epsilon_p, epsilon_pp};
    pub use crate::error::{MathError, MathResult};
    pub use crate::linear_algebra::solve_linear_system;
    pub use crate::solvers::{
        bisection, brent, newton_raphson, SolverConfig, SolverResult,
    };
}

pub use error::{MathError, MathResult};
