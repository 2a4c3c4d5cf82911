//! Business day adjustment conventions.

use serde::{Deserialize, Serialize};

use super::Calendar;
use crate::types::Date;

/// Business day adjustment conventions.
///
/// These conventions specify how to adjust a date that falls
/// on a non-business day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BusinessDayConvention {
    /// No adjustment - use the date as-is even if not a business day.
    Unadjusted,

    /// Move to the following business day.
    #[default]
    Following,

    /// Move to the following business day, unless it crosses a month boundary,
    /// in which case move to the preceding business day.
    ModifiedFollowing,

    /// Move to the preceding business day.
    Preceding,
}

impl std::fmt::Display for BusinessDayConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BusinessDayConvention::Unadjusted => "Unadjusted",
            BusinessDayConvention::Following => "Following",
            BusinessDayConvention::ModifiedFollowing => "Modified Following",
            BusinessDayConvention::Preceding => "Preceding",
        };
        write!(f, "{name}")
    }
}

/// Adjusts a date according to the given business day convention.
pub fn adjust<C: Calendar + ?Sized>(
    date: Date,
    convention: BusinessDayConvention,
    calendar: &C,
) -> Date {
    if calendar.is_business_day(date) {
        return date;
    }

    match convention {
        BusinessDayConvention::Unadjusted => date,

        BusinessDayConvention::Following => following(date, calendar),

        BusinessDayConvention::ModifiedFollowing => {
            let adjusted = following(date, calendar);
            if adjusted.month() != date.month() {
                preceding(date, calendar)
            } else {
                adjusted
            }
        }

        BusinessDayConvention::Preceding => preceding(date, calendar),
    }
}

/// Returns the next business day on or after the given date.
fn following<C: Calendar + ?Sized>(mut date: Date, calendar: &C) -> Date {
    while !calendar.is_business_day(date) {
        date = date.add_days(1);
    }
    date
}

/// Returns the previous business day on or before the given date.
fn preceding<C: Calendar + ?Sized>(mut date: Date, calendar: &C) -> Date {
    while !calendar.is_business_day(date) {
        date = date.add_days(-1);
    }
    date
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendars::WeekendCalendar;

    #[test]
    fn test_following() {
        let cal = WeekendCalendar;

        // Saturday rolls to Monday
        let saturday = Date::from_ymd(2013, 4, 20).unwrap();
        let adjusted = adjust(saturday, BusinessDayConvention::Following, &cal);

        assert_eq!(adjusted, Date::from_ymd(2013, 4, 22).unwrap());
    }

    #[test]
    fn test_preceding() {
        let cal = WeekendCalendar;

        let saturday = Date::from_ymd(2013, 4, 20).unwrap();
        let adjusted = adjust(saturday, BusinessDayConvention::Preceding, &cal);

        assert_eq!(adjusted, Date::from_ymd(2013, 4, 19).unwrap());
    }

    #[test]
    fn test_modified_following_month_boundary() {
        let cal = WeekendCalendar;

        // Saturday 2013-06-29: following would land in July, so roll back
        let saturday = Date::from_ymd(2013, 6, 29).unwrap();
        let adjusted = adjust(saturday, BusinessDayConvention::ModifiedFollowing, &cal);
        assert_eq!(adjusted, Date::from_ymd(2013, 6, 28).unwrap());

        // Sunday 2013-04-21 stays within April
        let sunday = Date::from_ymd(2013, 4, 21).unwrap();
        let adjusted = adjust(sunday, BusinessDayConvention::ModifiedFollowing, &cal);
        assert_eq!(adjusted, Date::from_ymd(2013, 4, 22).unwrap());
    }

    #[test]
    fn test_unadjusted() {
        let cal = WeekendCalendar;

        let saturday = Date::from_ymd(2013, 4, 20).unwrap();
        assert_eq!(
            adjust(saturday, BusinessDayConvention::Unadjusted, &cal),
            saturday
        );
    }

    #[test]
    fn test_business_day_unchanged() {
        let cal = WeekendCalendar;

        let monday = Date::from_ymd(2013, 4, 22).unwrap();
        assert_eq!(
            adjust(monday, BusinessDayConvention::Following, &cal),
            monday
        );
    }
}
