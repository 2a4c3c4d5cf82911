//! 30/360 day count conventions.

use super::DayCount;
use crate::types::Date;

/// 30/360 US (Bond Basis) day count convention.
///
/// Assumes 30-day months and a 360-day year, with the US adjustment:
/// a start day of 31 counts as 30, and an end day of 31 counts as 30
/// when the (adjusted) start day is 30.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Thirty360US;

impl DayCount for Thirty360US {
    fn name(&self) -> &'static str {
        "30/360 US"
    }

    fn year_fraction(&self, start: Date, end: Date) -> f64 {
        self.day_count(start, end) as f64 / 360.0
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        let mut d1 = start.day() as i64;
        let mut d2 = end.day() as i64;

        if d1 == 31 {
            d1 = 30;
        }
        if d2 == 31 && d1 == 30 {
            d2 = 30;
        }

        360 * (end.year() as i64 - start.year() as i64)
            + 30 * (end.month() as i64 - start.month() as i64)
            + (d2 - d1)
    }
}

/// 30E/360 (Eurobond Basis) day count convention.
///
/// Assumes 30-day months and a 360-day year, truncating both start and
/// end days of 31 to 30 unconditionally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Thirty360E;

impl DayCount for Thirty360E {
    fn name(&self) -> &'static str {
        "30E/360"
    }

    fn year_fraction(&self, start: Date, end: Date) -> f64 {
        self.day_count(start, end) as f64 / 360.0
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        let d1 = (start.day() as i64).min(30);
        let d2 = (end.day() as i64).min(30);

        360 * (end.year() as i64 - start.year() as i64)
            + 30 * (end.month() as i64 - start.month() as i64)
            + (d2 - d1)
    }
}
