//! Premium leg schedule generation for standard CDS contracts.
//!
//! Periods are generated on unadjusted dates (rolling backward from
//! maturity for front stubs, forward from the accrual start for back
//! stubs) and then business-day adjusted. The final accrual end date is
//! left unadjusted, with one extra day of accrual when the contract
//! protects from the period start date.

use credex_core::calendars::{adjust, BusinessDayConvention, Calendar};
use credex_core::types::Date;
use serde::{Deserialize, Serialize};

use crate::error::{IsdaError, IsdaResult};

/// Placement and handling of an irregular coupon period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StubType {
    /// Short period at the start of the schedule. The market standard
    /// for CDS.
    #[default]
    FrontShort,
    /// Stub merged into the first regular period, making it long.
    FrontLong,
    /// Short period at the end of the schedule.
    BackShort,
    /// Stub merged into the last regular period, making it long.
    BackLong,
    /// No stub allowed. The tenor must be an exact number of periods.
    None,
}

/// A single coupon period of the premium leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulePeriod {
    /// Accrual start date (business-day adjusted).
    pub accrual_start: Date,
    /// Accrual end date (adjusted, except the final period).
    pub accrual_end: Date,
    /// Premium payment date (always adjusted).
    pub payment_date: Date,
}

/// The full set of coupon periods for a CDS premium leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PremiumLegSchedule {
    periods: Vec<SchedulePeriod>,
}

impl PremiumLegSchedule {
    /// Builds the premium leg schedule between the accrual start and
    /// maturity dates.
    ///
    /// `protect_start` adds one day of accrual to the final period,
    /// matching contracts where protection covers the start date.
    pub fn new(
        accrual_start: Date,
        maturity: Date,
        payment_interval_months: u32,
        stub: StubType,
        convention: BusinessDayConvention,
        calendar: &dyn Calendar,
        protect_start: bool,
    ) -> IsdaResult<Self> {
        if maturity <= accrual_start {
            return Err(IsdaError::schedule_error(format!(
                "maturity {maturity} is not after accrual start {accrual_start}"
            )));
        }
        if payment_interval_months == 0 {
            return Err(IsdaError::schedule_error("payment interval must be positive"));
        }

        let unadjusted = unadjusted_dates(accrual_start, maturity, payment_interval_months, stub)?;

        let n = unadjusted.len() - 1;
        let mut periods = Vec::with_capacity(n);
        for i in 0..n {
            let acc_start = adjust(unadjusted[i], convention, calendar);
            let payment_date = adjust(unadjusted[i + 1], convention, calendar);
            // The final accrual end stays on the unadjusted maturity
            let acc_end = if i == n - 1 {
                if protect_start {
                    unadjusted[i + 1].add_days(1)
                } else {
                    unadjusted[i + 1]
                }
            } else {
                payment_date
            };
            periods.push(SchedulePeriod {
                accrual_start: acc_start,
                accrual_end: acc_end,
                payment_date,
            });
        }

        Ok(Self { periods })
    }

    /// Number of coupon periods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// True if the schedule has no periods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// The i-th coupon period.
    #[must_use]
    pub fn period(&self, index: usize) -> SchedulePeriod {
        self.periods[index]
    }

    /// All coupon periods in order.
    #[must_use]
    pub fn periods(&self) -> &[SchedulePeriod] {
        &self.periods
    }

    /// Accrual start of the first period.
    #[must_use]
    pub fn accrual_start(&self) -> Date {
        self.periods[0].accrual_start
    }

    /// Accrual end of the final period.
    #[must_use]
    pub fn accrual_end(&self) -> Date {
        self.periods[self.periods.len() - 1].accrual_end
    }

    /// Drops periods whose accrual has fully ended on or before the
    /// step-in date. The remaining first period keeps its original
    /// accrual start, so accrued interest to step-in can be computed.
    #[must_use]
    pub fn truncate(&self, step_in: Date) -> Self {
        let first = self
            .periods
            .iter()
            .position(|p| p.accrual_end > step_in)
            .unwrap_or(self.periods.len());
        Self {
            periods: self.periods[first..].to_vec(),
        }
    }
}

/// Generates the unadjusted period boundary dates, including both the
/// accrual start and the maturity.
fn unadjusted_dates(
    start: Date,
    end: Date,
    interval_months: u32,
    stub: StubType,
) -> IsdaResult<Vec<Date>> {
    match stub {
        StubType::FrontShort | StubType::FrontLong | StubType::None => {
            // Roll backward from maturity
            let mut dates = Vec::new();
            let mut k: i32 = 0;
            loop {
                let date = end.add_months(-k * interval_months as i32)?;
                if date <= start {
                    break;
                }
                dates.push(date);
                k += 1;
            }
            dates.reverse();
            let exact = end.add_months(-(dates.len() as i32) * interval_months as i32)? == start;
            if exact {
                dates.insert(0, start);
            } else {
                match stub {
                    StubType::None => {
                        return Err(IsdaError::schedule_error(format!(
                            "period from {start} to {end} is not a whole number of {interval_months}-month intervals and no stub is allowed"
                        )));
                    }
                    StubType::FrontLong if dates.len() > 1 => {
                        // Merge the stub into the first regular period
                        dates.remove(0);
                        dates.insert(0, start);
                    }
                    _ => dates.insert(0, start),
                }
            }
            Ok(dates)
        }
        StubType::BackShort | StubType::BackLong => {
            // Roll forward from the accrual start
            let mut dates = Vec::new();
            let mut k: i32 = 0;
            loop {
                let date = start.add_months(k * interval_months as i32)?;
                if date >= end {
                    break;
                }
                dates.push(date);
                k += 1;
            }
            let exact = start.add_months(dates.len() as i32 * interval_months as i32)? == end;
            if !exact && stub == StubType::BackLong && dates.len() > 1 {
                dates.pop();
            }
            dates.push(end);
            Ok(dates)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credex_core::calendars::WeekendCalendar;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    fn build(start: Date, end: Date, stub: StubType, protect_start: bool) -> PremiumLegSchedule {
        PremiumLegSchedule::new(
            start,
            end,
            3,
            stub,
            BusinessDayConvention::Following,
            &WeekendCalendar,
            protect_start,
        )
        .unwrap()
    }

    #[test]
    fn test_regular_quarterly_schedule() {
        let schedule = build(date(2013, 3, 20), date(2014, 6, 20), StubType::FrontShort, true);

        assert_eq!(schedule.len(), 5);
        assert_eq!(schedule.period(0).accrual_start, date(2013, 3, 20));
        assert_eq!(schedule.period(0).accrual_end, date(2013, 6, 20));
        assert_eq!(schedule.period(0).payment_date, date(2013, 6, 20));
        assert_eq!(schedule.period(4).accrual_start, date(2014, 3, 20));
        // Final accrual runs one day past maturity when protection
        // covers the start date
        assert_eq!(schedule.period(4).accrual_end, date(2014, 6, 21));
        assert_eq!(schedule.period(4).payment_date, date(2014, 6, 20));
    }

    #[test]
    fn test_final_accrual_without_protect_start() {
        let schedule = build(date(2013, 3, 20), date(2014, 6, 20), StubType::FrontShort, false);
        assert_eq!(schedule.accrual_end(), date(2014, 6, 20));
    }

    #[test]
    fn test_front_short_stub() {
        let schedule = build(date(2013, 3, 25), date(2013, 12, 20), StubType::FrontShort, false);

        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule.period(0).accrual_start, date(2013, 3, 25));
        assert_eq!(schedule.period(0).accrual_end, date(2013, 6, 20));
    }

    #[test]
    fn test_front_long_stub() {
        let schedule = build(date(2013, 3, 25), date(2013, 12, 20), StubType::FrontLong, false);

        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule.period(0).accrual_start, date(2013, 3, 25));
        assert_eq!(schedule.period(0).accrual_end, date(2013, 9, 20));
    }

    #[test]
    fn test_back_stubs() {
        let short = build(date(2013, 3, 20), date(2013, 12, 15), StubType::BackShort, false);
        assert_eq!(short.len(), 3);
        assert_eq!(short.period(2).accrual_start, date(2013, 9, 20));
        assert_eq!(short.period(2).accrual_end, date(2013, 12, 15));

        let long = build(date(2013, 3, 20), date(2013, 12, 15), StubType::BackLong, false);
        assert_eq!(long.len(), 2);
        assert_eq!(long.period(1).accrual_start, date(2013, 6, 20));
        assert_eq!(long.period(1).accrual_end, date(2013, 12, 15));
    }

    #[test]
    fn test_no_stub_requires_exact_multiple() {
        let err = PremiumLegSchedule::new(
            date(2013, 3, 25),
            date(2013, 12, 20),
            3,
            StubType::None,
            BusinessDayConvention::Following,
            &WeekendCalendar,
            false,
        );
        assert!(err.is_err());

        let ok = build(date(2013, 3, 20), date(2013, 12, 20), StubType::None, false);
        assert_eq!(ok.len(), 3);
    }

    #[test]
    fn test_short_contract_is_single_period() {
        let schedule = build(date(2013, 3, 20), date(2013, 5, 10), StubType::FrontShort, false);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.period(0).accrual_start, date(2013, 3, 20));
        assert_eq!(schedule.period(0).accrual_end, date(2013, 5, 10));
    }

    #[test]
    fn test_weekend_payment_adjustment() {
        // 2015-06-20 is a Saturday; payment rolls to Monday but the
        // final accrual end does not
        let schedule = build(date(2015, 3, 20), date(2015, 6, 20), StubType::FrontShort, true);
        assert_eq!(schedule.period(0).payment_date, date(2015, 6, 22));
        assert_eq!(schedule.period(0).accrual_end, date(2015, 6, 21));
    }

    #[test]
    fn test_truncate_drops_expired_periods() {
        let schedule = build(date(2012, 12, 20), date(2014, 6, 20), StubType::FrontShort, true);
        assert_eq!(schedule.len(), 6);

        let truncated = schedule.truncate(date(2013, 4, 22));
        assert_eq!(truncated.len(), 5);
        // The first remaining period keeps its original accrual start
        assert_eq!(truncated.period(0).accrual_start, date(2013, 3, 20));

        // Step-in on a payment date drops that period too
        let on_boundary = schedule.truncate(date(2013, 6, 20));
        assert_eq!(on_boundary.len(), 4);
    }
}
