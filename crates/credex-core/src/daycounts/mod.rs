//! Day count conventions for credit derivative calculations.
//!
//! Day count conventions determine how accrued premium and curve times
//! are measured by specifying how to count days between two dates and
//! the year basis.
//!
//! # Supported Conventions
//!
//! - [`Act360`]: Actual/360 - standard CDS premium accrual
//! - [`Act365Fixed`]: Actual/365 Fixed - standard CDS curve times
//! - [`Thirty360US`]: 30/360 US (Bond Basis)
//! - [`Thirty360E`]: 30E/360 (Eurobond Basis)
//!
//! # Usage
//!
//! ```rust
//! use credex_core::daycounts::{Act360, DayCount};
//! use credex_core::types::Date;
//!
//! let dc = Act360;
//! let start = Date::from_ymd(2013, 3, 20).unwrap();
//! let end = Date::from_ymd(2013, 6, 20).unwrap();
//!
//! let yf = dc.year_fraction(start, end);
//! assert!((yf - 92.0 / 360.0).abs() < 1e-15);
//! ```

mod act360;
mod act365;
mod thirty360;

pub use act360::Act360;
pub use act365::Act365Fixed;
pub use thirty360::{Thirty360E, Thirty360US};

use crate::types::Date;

/// Trait for day count conventions.
///
/// Implementations provide the year fraction calculation between two dates
/// according to specific market conventions. Year fractions are IEEE
/// doubles; the standard credit model is defined over doubles and the
/// reference numbers depend on it.
pub trait DayCount: Send + Sync {
    /// Returns the name of the day count convention.
    fn name(&self) -> &'static str;

    /// Calculates the year fraction between two dates.
    ///
    /// Can be negative if `end` is before `start`.
    fn year_fraction(&self, start: Date, end: Date) -> f64;

    /// Calculates the day count between two dates.
    ///
    /// For ACT conventions this is actual calendar days; for 30/360
    /// conventions it uses the 30-day month assumption.
    fn day_count(&self, start: Date, end: Date) -> i64;
}

/// Enumeration of the supported day count conventions.
///
/// Provides runtime selection of a convention, e.g. when configuring a
/// trade factory from market conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayCountConvention {
    /// Actual/360 - CDS premium accrual
    Act360,

    /// Actual/365 Fixed - CDS curve times
    Act365Fixed,

    /// 30/360 US (Bond Basis)
    Thirty360US,

    /// 30E/360 (Eurobond Basis)
    Thirty360E,
}

impl DayCountConvention {
    /// Creates a boxed day count implementation.
    #[must_use]
    pub fn to_day_count(&self) -> Box<dyn DayCount> {
        match self {
            DayCountConvention::Act360 => Box::new(Act360),
            DayCountConvention::Act365Fixed => Box::new(Act365Fixed),
            DayCountConvention::Thirty360US => Box::new(Thirty360US),
            DayCountConvention::Thirty360E => Box::new(Thirty360E),
        }
    }

    /// Returns the market name of the convention.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            DayCountConvention::Act360 => "ACT/360",
            DayCountConvention::Act365Fixed => "ACT/365F",
            DayCountConvention::Thirty360US => "30/360 US",
            DayCountConvention::Thirty360E => "30E/360",
        }
    }

    /// Computes the year fraction under this convention.
    #[must_use]
    pub fn year_fraction(&self, start: Date, end: Date) -> f64 {
        match self {
            DayCountConvention::Act360 => Act360.year_fraction(start, end),
            DayCountConvention::Act365Fixed => Act365Fixed.year_fraction(start, end),
            DayCountConvention::Thirty360US => Thirty360US.year_fraction(start, end),
            DayCountConvention::Thirty360E => Thirty360E.year_fraction(start, end),
        }
    }

    /// Returns the year basis (denominator) of the convention.
    #[must_use]
    pub const fn basis(&self) -> u32 {
        match self {
            DayCountConvention::Act360
            | DayCountConvention::Thirty360US
            | DayCountConvention::Thirty360E => 360,
            DayCountConvention::Act365Fixed => 365,
        }
    }
}

impl std::fmt::Display for DayCountConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_act360() {
        let dc = Act360;
        let start = Date::from_ymd(2013, 1, 1).unwrap();
        let end = Date::from_ymd(2013, 7, 1).unwrap();

        assert_eq!(dc.day_count(start, end), 181);
        assert_relative_eq!(dc.year_fraction(start, end), 181.0 / 360.0);
    }

    #[test]
    fn test_act365_fixed() {
        let dc = Act365Fixed;
        let start = Date::from_ymd(2013, 1, 1).unwrap();
        let end = Date::from_ymd(2014, 1, 1).unwrap();

        assert_eq!(dc.day_count(start, end), 365);
        assert_relative_eq!(dc.year_fraction(start, end), 1.0);
    }

    #[test]
    fn test_thirty360_us_full_year() {
        let dc = Thirty360US;
        let start = Date::from_ymd(2013, 1, 1).unwrap();
        let end = Date::from_ymd(2014, 1, 1).unwrap();

        assert_eq!(dc.day_count(start, end), 360);
        assert_relative_eq!(dc.year_fraction(start, end), 1.0);
    }

    #[test]
    fn test_convention_dispatch() {
        let start = Date::from_ymd(2013, 3, 20).unwrap();
        let end = Date::from_ymd(2013, 6, 20).unwrap();

        assert_relative_eq!(
            DayCountConvention::Act360.year_fraction(start, end),
            Act360.year_fraction(start, end)
        );
        assert_relative_eq!(
            DayCountConvention::Act365Fixed.year_fraction(start, end),
            Act365Fixed.year_fraction(start, end)
        );
    }

    #[test]
    fn test_convention_names() {
        assert_eq!(DayCountConvention::Act360.name(), "ACT/360");
        assert_eq!(DayCountConvention::Act365Fixed.name(), "ACT/365F");
        assert_eq!(DayCountConvention::Thirty360US.name(), "30/360 US");
        assert_eq!(DayCountConvention::Thirty360E.name(), "30E/360");
    }

    #[test]
    fn test_basis() {
        assert_eq!(DayCountConvention::Act360.basis(), 360);
        assert_eq!(DayCountConvention::Act365Fixed.basis(), 365);
    }
}
