//! # Credex Core
//!
//! Core types, traits, and abstractions for the Credex credit analytics library.
//!
//! This crate provides the foundational building blocks used throughout Credex:
//!
//! - **Types**: the `Date` type used by schedule and curve construction
//! - **Day Count Conventions**: industry-standard year fraction calculations
//! - **Business Day Calendars**: weekend and holiday-list calendars with
//!   adjustment conventions
//!
//! ## Design Philosophy
//!
//! - **Type Safety**: newtypes prevent mixing incompatible values
//! - **Explicit Over Implicit**: clear, self-documenting APIs
//! - **Double Precision**: year fractions are IEEE doubles, matching the
//!   arithmetic of the standard credit model
//!
//! ## Example
//!
//! ```rust
//! use credex_core::prelude::*;
//!
//! let trade = Date::from_ymd(2013, 4, 21).unwrap();
//! let cal = WeekendCalendar;
//! let step_in = cal.add_business_days(trade, 1);
//! assert_eq!(step_in, Date::from_ymd(2013, 4, 22).unwrap());
//! ```

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
#![allow(clippy::unreadable_literal)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::cast_possible_truncation)]

pub mod calendars;
pub mod daycounts;
pub mod error;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::calendars::{BusinessDayConvention, Calendar, HolidayCalendar, WeekendCalendar};
    pub use crate::daycounts::{DayCount, DayCountConvention};
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::types::Date;
}

// Re-export commonly used types at crate root
pub use error::{CoreError, CoreResult};
pub use types::Date;
