//! Standard roll date (IMM date) logic for credit default swaps.
//!
//! Single-name CDS roll on the 20th of March, June, September, and
//! December; credit indices roll on the 20th of March and September.
//! Standard contracts have accrual start on the roll date on or before
//! the trade date and maturities measured from the roll date after it.

use credex_core::types::Date;

use crate::error::IsdaResult;

/// The roll months for standard CDS dates.
const IMM_MONTHS: [u32; 4] = [3, 6, 9, 12];

/// Checks whether a date is a standard CDS roll date (20th of March,
/// June, September, or December).
#[must_use]
pub fn is_imm_date(date: Date) -> bool {
    date.day() == 20 && IMM_MONTHS.contains(&date.month())
}

/// Checks whether a date is a credit index roll date (20th of March or
/// September).
#[must_use]
pub fn is_index_roll_date(date: Date) -> bool {
    date.day() == 20 && (date.month() == 3 || date.month() == 9)
}

/// Returns the first standard roll date strictly after the given date.
pub fn next_imm_date(date: Date) -> IsdaResult<Date> {
    for month in IMM_MONTHS {
        let candidate = Date::from_ymd(date.year(), month, 20)?;
        if candidate > date {
            return Ok(candidate);
        }
    }
    Ok(Date::from_ymd(date.year() + 1, 3, 20)?)
}

/// Returns the last standard roll date on or before the given date.
pub fn prev_imm_date(date: Date) -> IsdaResult<Date> {
    for month in IMM_MONTHS.iter().rev() {
        let candidate = Date::from_ymd(date.year(), *month, 20)?;
        if candidate <= date {
            return Ok(candidate);
        }
    }
    Ok(Date::from_ymd(date.year() - 1, 12, 20)?)
}

/// Returns the next index roll date.
///
/// Index roll dates are 20 Mar and 20 Sep. A date already on a roll
/// date moves to the following one (six months later).
pub fn next_index_roll_date(date: Date) -> IsdaResult<Date> {
    if is_index_roll_date(date) {
        return Ok(date.add_months(6)?);
    }
    for month in [3, 9] {
        let candidate = Date::from_ymd(date.year(), month, 20)?;
        if candidate > date {
            return Ok(candidate);
        }
    }
    Ok(Date::from_ymd(date.year() + 1, 3, 20)?)
}

/// Generates `count` quarterly roll dates starting at `base` (which
/// should itself be a roll date).
pub fn imm_date_set(base: Date, count: usize) -> IsdaResult<Vec<Date>> {
    let mut dates = Vec::with_capacity(count);
    for i in 0..count {
        dates.push(base.add_months(3 * i as i32)?);
    }
    Ok(dates)
}

/// Generates roll dates as `base` plus each tenor in months, with each
/// result rounded forward to a roll date when it does not land on one.
///
/// Quarterly tenors from a roll date already land on roll dates; a
/// non-quarterly tenor (say +4M from 20 Jun) falls between rolls and is
/// moved to the next one.
pub fn imm_date_set_from_tenors(base: Date, tenor_months: &[u32]) -> IsdaResult<Vec<Date>> {
    let mut dates = Vec::with_capacity(tenor_months.len());
    for &months in tenor_months {
        let raw = base.add_months(months as i32)?;
        let date = if is_imm_date(raw) { raw } else { next_imm_date(raw)? };
        dates.push(date);
    }
    Ok(dates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn test_is_imm_date() {
        assert!(is_imm_date(date(2013, 6, 20)));
        assert!(is_imm_date(date(2013, 12, 20)));
        assert!(!is_imm_date(date(2013, 6, 21)));
        assert!(!is_imm_date(date(2013, 5, 20)));
    }

    #[test]
    fn test_next_imm_date() {
        assert_eq!(next_imm_date(date(2013, 4, 21)).unwrap(), date(2013, 6, 20));
        assert_eq!(next_imm_date(date(2013, 12, 25)).unwrap(), date(2014, 3, 20));
        // Strictly after: an IMM date rolls to the next one
        assert_eq!(next_imm_date(date(2013, 6, 20)).unwrap(), date(2013, 9, 20));
    }

    #[test]
    fn test_prev_imm_date() {
        assert_eq!(prev_imm_date(date(2013, 4, 21)).unwrap(), date(2013, 3, 20));
        assert_eq!(prev_imm_date(date(2013, 1, 5)).unwrap(), date(2012, 12, 20));
        // On or before: an IMM date is its own previous roll date
        assert_eq!(prev_imm_date(date(2013, 6, 20)).unwrap(), date(2013, 6, 20));
        assert_eq!(prev_imm_date(date(2013, 6, 21)).unwrap(), date(2013, 6, 20));
    }

    #[test]
    fn test_next_index_roll_date() {
        assert_eq!(
            next_index_roll_date(date(2014, 2, 6)).unwrap(),
            date(2014, 3, 20)
        );
        assert_eq!(
            next_index_roll_date(date(2014, 4, 1)).unwrap(),
            date(2014, 9, 20)
        );
        assert_eq!(
            next_index_roll_date(date(2014, 10, 1)).unwrap(),
            date(2015, 3, 20)
        );
        // On a roll date, move six months forward
        assert_eq!(
            next_index_roll_date(date(2013, 9, 20)).unwrap(),
            date(2014, 3, 20)
        );
    }

    #[test]
    fn test_imm_date_set() {
        let dates = imm_date_set(date(2013, 6, 20), 4).unwrap();
        assert_eq!(
            dates,
            vec![
                date(2013, 6, 20),
                date(2013, 9, 20),
                date(2013, 12, 20),
                date(2014, 3, 20)
            ]
        );
    }

    #[test]
    fn test_imm_date_set_from_tenors() {
        // 6M, 1Y, 5Y from the 2013-06-20 roll
        let dates = imm_date_set_from_tenors(date(2013, 6, 20), &[6, 12, 60]).unwrap();
        assert_eq!(
            dates,
            vec![date(2013, 12, 20), date(2014, 6, 20), date(2018, 6, 20)]
        );
        assert!(dates.iter().all(|d| is_imm_date(*d)));
    }

    #[test]
    fn test_imm_date_set_from_non_quarterly_tenors() {
        // +4M from 20 Jun lands on 20 Oct, which rounds forward to 20 Dec
        let dates = imm_date_set_from_tenors(date(2013, 6, 20), &[4, 7, 13]).unwrap();
        assert_eq!(
            dates,
            vec![date(2013, 12, 20), date(2014, 3, 20), date(2014, 9, 20)]
        );
        assert!(dates.iter().all(|d| is_imm_date(*d)));
    }
}
