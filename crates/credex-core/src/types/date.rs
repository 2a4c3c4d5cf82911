//! Calendar date for CDS schedule and curve date arithmetic.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Sub;

use crate::error::{CoreError, CoreResult};

/// A calendar date.
///
/// Wraps `chrono::NaiveDate` and exposes the small amount of date
/// arithmetic that premium schedules, roll date logic, and day counts
/// need: day and month offsets, day differences, and weekday queries.
///
/// # Example
///
/// ```rust
/// use credex_core::types::Date;
///
/// let trade = Date::from_ymd(2013, 4, 21)?;
/// let step_in = trade.add_days(1);
/// let maturity = trade.add_months(60)?;
/// assert_eq!(maturity, Date::from_ymd(2018, 4, 21)?);
/// assert_eq!(trade.days_between(&step_in), 1);
/// # Ok::<(), credex_core::CoreError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Date(NaiveDate);

impl Date {
    /// Creates a date from year, month, and day.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` for dates that do not exist.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> CoreResult<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Date)
            .ok_or_else(|| CoreError::invalid_date(format!("{year}-{month:02}-{day:02}")))
    }

    /// The year component.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// The month component, 1 through 12.
    #[must_use]
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// The day of month, 1 through 31.
    #[must_use]
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Offsets the date by a signed number of calendar days.
    #[must_use]
    pub fn add_days(&self, days: i64) -> Self {
        Date(self.0 + chrono::Duration::days(days))
    }

    /// Offsets the date by a signed number of months, clamping to the
    /// end of the target month when the day does not exist there
    /// (tenor arithmetic from a month-end date stays at month end).
    pub fn add_months(&self, months: i32) -> CoreResult<Self> {
        let months_since_epoch = self.year() * 12 + self.month() as i32 - 1 + months;
        let year = months_since_epoch.div_euclid(12);
        let month = (months_since_epoch.rem_euclid(12) + 1) as u32;
        let day = self.day().min(last_day_of_month(year, month)?);
        Self::from_ymd(year, month, day)
    }

    /// Signed calendar days from `self` to `other`.
    #[must_use]
    pub fn days_between(&self, other: &Date) -> i64 {
        (other.0 - self.0).num_days()
    }

    /// The day of week.
    #[must_use]
    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    /// Whether the date falls Monday through Friday.
    #[must_use]
    pub fn is_weekday(&self) -> bool {
        !matches!(self.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// The earlier of two dates.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        if self <= other {
            self
        } else {
            other
        }
    }

    /// The later of two dates.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        if self >= other {
            self
        } else {
            other
        }
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl Sub<Date> for Date {
    type Output = i64;

    /// Signed calendar days from `other` to `self`.
    fn sub(self, other: Date) -> Self::Output {
        other.days_between(&self)
    }
}

fn last_day_of_month(year: i32, month: u32) -> CoreResult<u32> {
    let first_of_next = if month == 12 {
        Date::from_ymd(year + 1, 1, 1)?
    } else {
        Date::from_ymd(year, month + 1, 1)?
    };
    Ok(first_of_next.add_days(-1).day())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn test_components() {
        let d = date(2013, 4, 21);
        assert_eq!((d.year(), d.month(), d.day()), (2013, 4, 21));
    }

    #[test]
    fn test_rejects_nonexistent_dates() {
        assert!(Date::from_ymd(2013, 2, 30).is_err());
        assert!(Date::from_ymd(2013, 13, 1).is_err());
        assert!(Date::from_ymd(2015, 2, 29).is_err());
    }

    #[test]
    fn test_add_months_clamps_to_month_end() {
        assert_eq!(date(2013, 1, 31).add_months(1).unwrap(), date(2013, 2, 28));
        assert_eq!(date(2016, 1, 31).add_months(1).unwrap(), date(2016, 2, 29));
        // A 3M step back across the year boundary
        assert_eq!(date(2013, 2, 20).add_months(-3).unwrap(), date(2012, 11, 20));
    }

    #[test]
    fn test_tenor_round_trips_on_the_twentieth() {
        // Roll dates are always the 20th, so tenor steps never clamp
        let roll = date(2013, 6, 20);
        let out = roll.add_months(60).unwrap();
        assert_eq!(out, date(2018, 6, 20));
        assert_eq!(out.add_months(-60).unwrap(), roll);
    }

    #[test]
    fn test_day_differences() {
        let trade = date(2013, 4, 21);
        let first_pillar = date(2013, 6, 20);
        assert_eq!(trade.days_between(&first_pillar), 60);
        assert_eq!(first_pillar - trade, 60);
        assert_eq!(trade - first_pillar, -60);
        assert_eq!(trade.add_days(60), first_pillar);
    }

    #[test]
    fn test_weekday_queries() {
        // 2013-04-21 is a Sunday
        assert!(!date(2013, 4, 21).is_weekday());
        assert!(date(2013, 4, 22).is_weekday());
        assert_eq!(date(2013, 4, 20).weekday(), chrono::Weekday::Sat);
    }

    #[test]
    fn test_min_max() {
        let near = date(2013, 1, 1);
        let far = date(2013, 6, 15);
        assert_eq!(near.min(far), near);
        assert_eq!(near.max(far), far);
    }

    #[test]
    fn test_serde_transparent() {
        let d = date(2013, 6, 20);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, "\"2013-06-20\"");
        assert_eq!(serde_json::from_str::<Date>(&json).unwrap(), d);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn add_days_round_trips(days in -20_000i64..20_000, offset in 0i64..15_000) {
                let base = date(1990, 1, 1).add_days(offset);
                let shifted = base.add_days(days);
                prop_assert_eq!(shifted.add_days(-days), base);
                prop_assert_eq!(base.days_between(&shifted), days);
            }

            #[test]
            fn add_months_lands_in_target_month(months in -600i32..600, offset in 0i64..15_000) {
                let base = date(1990, 1, 1).add_days(offset);
                let shifted = base.add_months(months).unwrap();
                let expected = base.year() * 12 + base.month() as i32 - 1 + months;
                prop_assert_eq!(shifted.year() * 12 + shifted.month() as i32 - 1, expected);
                // Month-end clamping can only move the day earlier
                prop_assert!(shifted.day() <= base.day());
            }
        }
    }
}
