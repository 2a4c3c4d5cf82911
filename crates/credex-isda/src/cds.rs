//! Date-free CDS contract representation and the trade factory.
//!
//! A [`CdsAnalytic`] converts a contract's dates into year fractions
//! measured from the trade date, which is all the pricer needs. The
//! [`CdsAnalyticFactory`] applies standard market conventions (quarterly
//! coupons rolling on IMM dates, T+1 step-in, T+3 cash settlement,
//! protection from the start date) to build contracts from a trade date
//! and a tenor.

use std::sync::Arc;

use credex_core::calendars::{adjust, BusinessDayConvention, Calendar, WeekendCalendar};
use credex_core::daycounts::DayCountConvention;
use credex_core::types::Date;

use crate::error::{IsdaError, IsdaResult};
use crate::imm::{imm_date_set, is_imm_date, next_imm_date, next_index_roll_date, prev_imm_date};
use crate::multi::MultiCdsAnalytic;
use crate::schedule::{PremiumLegSchedule, SchedulePeriod, StubType};

/// A single premium coupon expressed in year fractions from the trade
/// date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CdsCoupon {
    /// Accrual period start as a time for curve lookups. One day
    /// earlier than the nominal start when protection covers the start
    /// date. Negative for periods that began before the trade date.
    pub effective_start: f64,
    /// Accrual period end as a time for curve lookups.
    pub effective_end: f64,
    /// Premium payment time.
    pub payment_time: f64,
    /// Accrual year fraction of the period under the accrual day count.
    pub year_fraction: f64,
    /// Ratio of the accrual year fraction to the same period measured
    /// under the curve day count. Converts curve-time accrual lengths
    /// back to money.
    pub yf_ratio: f64,
}

impl CdsCoupon {
    pub(crate) fn new(
        trade_date: Date,
        period: SchedulePeriod,
        protect_start: bool,
        accrual_dcc: DayCountConvention,
        curve_dcc: DayCountConvention,
    ) -> Self {
        let offset: i64 = if protect_start { 1 } else { 0 };
        let effective_start =
            curve_dcc.year_fraction(trade_date, period.accrual_start.add_days(-offset));
        let effective_end =
            curve_dcc.year_fraction(trade_date, period.accrual_end.add_days(-offset));
        let payment_time = curve_dcc.year_fraction(trade_date, period.payment_date);
        let year_fraction = accrual_dcc.year_fraction(period.accrual_start, period.accrual_end);
        let yf_ratio =
            year_fraction / curve_dcc.year_fraction(period.accrual_start, period.accrual_end);
        Self {
            effective_start,
            effective_end,
            payment_time,
            year_fraction,
            yf_ratio,
        }
    }
}

/// A CDS contract with all dates resolved to year fractions from the
/// trade date.
#[derive(Debug, Clone, PartialEq)]
pub struct CdsAnalytic {
    step_in_time: f64,
    cash_settle_time: f64,
    acc_start: f64,
    effective_protection_start: f64,
    protection_end: f64,
    lgd: f64,
    accrued: f64,
    accrued_days: i64,
    pay_acc_on_default: bool,
    coupons: Vec<CdsCoupon>,
}

impl CdsAnalytic {
    /// Builds the contract from explicit dates and conventions.
    ///
    /// Coupon periods whose accrual ends on or before the step-in date
    /// are dropped; the first remaining period determines the accrued
    /// premium at step-in.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        trade_date: Date,
        step_in_date: Date,
        cash_settle_date: Date,
        accrual_start_date: Date,
        maturity: Date,
        payment_interval_months: u32,
        stub: StubType,
        pay_acc_on_default: bool,
        protect_start: bool,
        recovery_rate: f64,
        convention: BusinessDayConvention,
        calendar: &dyn Calendar,
        accrual_dcc: DayCountConvention,
        curve_dcc: DayCountConvention,
    ) -> IsdaResult<Self> {
        if step_in_date < trade_date {
            return Err(IsdaError::invalid_input(format!(
                "step-in date {step_in_date} is before trade date {trade_date}"
            )));
        }
        if cash_settle_date < trade_date {
            return Err(IsdaError::invalid_input(format!(
                "cash settlement date {cash_settle_date} is before trade date {trade_date}"
            )));
        }
        if !(0.0..=1.0).contains(&recovery_rate) {
            return Err(IsdaError::invalid_input(format!(
                "recovery rate {recovery_rate} is not in [0, 1]"
            )));
        }

        let step_in_time = curve_dcc.year_fraction(trade_date, step_in_date);
        let cash_settle_time = curve_dcc.year_fraction(trade_date, cash_settle_date);
        let protection_end = curve_dcc.year_fraction(trade_date, maturity);

        let protection_start_date = step_in_date.max(accrual_start_date);
        let effective_start_date = if protect_start {
            protection_start_date.add_days(-1)
        } else {
            protection_start_date
        };
        let effective_protection_start =
            curve_dcc.year_fraction(trade_date, effective_start_date);

        let schedule = PremiumLegSchedule::new(
            accrual_start_date,
            maturity,
            payment_interval_months,
            stub,
            convention,
            calendar,
            protect_start,
        )?
        .truncate(step_in_date);
        if schedule.is_empty() {
            return Err(IsdaError::schedule_error(format!(
                "contract maturing {maturity} has no premium periods after step-in {step_in_date}"
            )));
        }

        let coupons: Vec<CdsCoupon> = schedule
            .periods()
            .iter()
            .map(|&p| CdsCoupon::new(trade_date, p, protect_start, accrual_dcc, curve_dcc))
            .collect();

        let first_acc_start = schedule.accrual_start();
        let acc_start = curve_dcc.year_fraction(trade_date, first_acc_start);
        let (accrued, accrued_days) = if first_acc_start < step_in_date {
            (
                accrual_dcc.year_fraction(first_acc_start, step_in_date),
                step_in_date - first_acc_start,
            )
        } else {
            (0.0, 0)
        };

        Ok(Self {
            step_in_time,
            cash_settle_time,
            acc_start,
            effective_protection_start,
            protection_end,
            lgd: 1.0 - recovery_rate,
            accrued,
            accrued_days,
            pay_acc_on_default,
            coupons,
        })
    }

    /// Step-in (effective) time from the trade date.
    #[must_use]
    pub fn step_in_time(&self) -> f64 {
        self.step_in_time
    }

    /// Cash settlement time, where upfront amounts are valued.
    #[must_use]
    pub fn cash_settle_time(&self) -> f64 {
        self.cash_settle_time
    }

    /// Accrual start time of the first remaining period. Negative for
    /// seasoned trades.
    #[must_use]
    pub fn accrual_start_time(&self) -> f64 {
        self.acc_start
    }

    /// Start of the protected period, adjusted for protection from the
    /// start date.
    #[must_use]
    pub fn effective_protection_start(&self) -> f64 {
        self.effective_protection_start
    }

    /// End of the protected period.
    #[must_use]
    pub fn protection_end(&self) -> f64 {
        self.protection_end
    }

    /// Loss given default, `1 - recovery`.
    #[must_use]
    pub fn lgd(&self) -> f64 {
        self.lgd
    }

    /// Recovery rate as a fraction of notional.
    #[must_use]
    pub fn recovery_rate(&self) -> f64 {
        1.0 - self.lgd
    }

    /// Accrual year fraction from the period start to step-in.
    #[must_use]
    pub fn accrued_year_fraction(&self) -> f64 {
        self.accrued
    }

    /// Premium accrued at step-in for a given fractional spread.
    #[must_use]
    pub fn accrued_premium(&self, fractional_spread: f64) -> f64 {
        self.accrued * fractional_spread
    }

    /// Calendar days of accrual at step-in.
    #[must_use]
    pub fn accrued_days(&self) -> i64 {
        self.accrued_days
    }

    /// Whether accrued premium is paid on default.
    #[must_use]
    pub fn pay_accrual_on_default(&self) -> bool {
        self.pay_acc_on_default
    }

    /// The premium coupons in payment order.
    #[must_use]
    pub fn coupons(&self) -> &[CdsCoupon] {
        &self.coupons
    }

    /// Returns a copy of the contract with a different recovery rate.
    pub fn with_recovery_rate(&self, recovery_rate: f64) -> IsdaResult<Self> {
        if !(0.0..=1.0).contains(&recovery_rate) {
            return Err(IsdaError::invalid_input(format!(
                "recovery rate {recovery_rate} is not in [0, 1]"
            )));
        }
        let mut cds = self.clone();
        cds.lgd = 1.0 - recovery_rate;
        Ok(cds)
    }
}

/// Factory for standard CDS contracts.
///
/// Defaults follow the standard contract: T+1 step-in, cash settlement
/// three working days after trade, quarterly premiums with a short
/// front stub, protection from the start date, 40% recovery, ACT/360
/// premium accrual and ACT/365F curve times.
#[derive(Clone)]
pub struct CdsAnalyticFactory {
    step_in_days: i64,
    cash_settle_days: i32,
    pay_acc_on_default: bool,
    payment_interval_months: u32,
    stub: StubType,
    protect_start: bool,
    recovery_rate: f64,
    convention: BusinessDayConvention,
    calendar: Arc<dyn Calendar>,
    accrual_dcc: DayCountConvention,
    curve_dcc: DayCountConvention,
}

impl Default for CdsAnalyticFactory {
    fn default() -> Self {
        Self {
            step_in_days: 1,
            cash_settle_days: 3,
            pay_acc_on_default: true,
            payment_interval_months: 3,
            stub: StubType::FrontShort,
            protect_start: true,
            recovery_rate: 0.4,
            convention: BusinessDayConvention::Following,
            calendar: Arc::new(WeekendCalendar),
            accrual_dcc: DayCountConvention::Act360,
            curve_dcc: DayCountConvention::Act365Fixed,
        }
    }
}

impl CdsAnalyticFactory {
    /// Creates a factory with standard conventions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a factory with standard conventions and the given
    /// recovery rate.
    #[must_use]
    pub fn with_default_recovery(recovery_rate: f64) -> Self {
        Self {
            recovery_rate,
            ..Self::default()
        }
    }

    /// Sets the step-in offset in calendar days.
    #[must_use]
    pub fn with_step_in(mut self, days: i64) -> Self {
        self.step_in_days = days;
        self
    }

    /// Sets the cash settlement offset in working days.
    #[must_use]
    pub fn with_cash_settle(mut self, working_days: i32) -> Self {
        self.cash_settle_days = working_days;
        self
    }

    /// Sets whether accrued premium is paid on default.
    #[must_use]
    pub fn with_pay_accrual_on_default(mut self, pay: bool) -> Self {
        self.pay_acc_on_default = pay;
        self
    }

    /// Sets the premium payment interval in months.
    #[must_use]
    pub fn with_payment_interval(mut self, months: u32) -> Self {
        self.payment_interval_months = months;
        self
    }

    /// Sets the stub type.
    #[must_use]
    pub fn with_stub_type(mut self, stub: StubType) -> Self {
        self.stub = stub;
        self
    }

    /// Sets whether protection covers the start date.
    #[must_use]
    pub fn with_protect_start(mut self, protect_start: bool) -> Self {
        self.protect_start = protect_start;
        self
    }

    /// Sets the recovery rate.
    #[must_use]
    pub fn with_recovery_rate(mut self, recovery_rate: f64) -> Self {
        self.recovery_rate = recovery_rate;
        self
    }

    /// Sets the business day convention.
    #[must_use]
    pub fn with_business_day_convention(mut self, convention: BusinessDayConvention) -> Self {
        self.convention = convention;
        self
    }

    /// Sets the holiday calendar.
    #[must_use]
    pub fn with_calendar(mut self, calendar: Arc<dyn Calendar>) -> Self {
        self.calendar = calendar;
        self
    }

    /// Sets the premium accrual day count.
    #[must_use]
    pub fn with_accrual_day_count(mut self, dcc: DayCountConvention) -> Self {
        self.accrual_dcc = dcc;
        self
    }

    /// Sets the curve time day count.
    #[must_use]
    pub fn with_curve_day_count(mut self, dcc: DayCountConvention) -> Self {
        self.curve_dcc = dcc;
        self
    }

    fn step_in_date(&self, trade_date: Date) -> Date {
        trade_date.add_days(self.step_in_days)
    }

    fn cash_settle_date(&self, trade_date: Date) -> Date {
        self.calendar
            .add_business_days(trade_date, self.cash_settle_days)
    }

    /// Builds a contract from explicit accrual start and maturity
    /// dates using the factory conventions.
    pub fn make_cds(
        &self,
        trade_date: Date,
        accrual_start_date: Date,
        maturity: Date,
    ) -> IsdaResult<CdsAnalytic> {
        CdsAnalytic::new(
            trade_date,
            self.step_in_date(trade_date),
            self.cash_settle_date(trade_date),
            accrual_start_date,
            maturity,
            self.payment_interval_months,
            self.stub,
            self.pay_acc_on_default,
            self.protect_start,
            self.recovery_rate,
            self.convention,
            self.calendar.as_ref(),
            self.accrual_dcc,
            self.curve_dcc,
        )
    }

    /// Builds a standard contract: accrual starts on the IMM date on or
    /// before the trade date, maturity is the tenor measured from the
    /// next IMM date, rounded forward to an IMM date when the tenor is
    /// not a whole number of quarters.
    pub fn make_imm_cds(&self, trade_date: Date, tenor_months: u32) -> IsdaResult<CdsAnalytic> {
        let accrual_start = adjust(
            prev_imm_date(trade_date)?,
            self.convention,
            self.calendar.as_ref(),
        );
        let raw = next_imm_date(trade_date)?.add_months(tenor_months as i32)?;
        let maturity = if is_imm_date(raw) { raw } else { next_imm_date(raw)? };
        self.make_cds(trade_date, accrual_start, maturity)
    }

    /// Builds a strip of standard contracts for a set of tenors.
    pub fn make_imm_cds_strip(
        &self,
        trade_date: Date,
        tenors_months: &[u32],
    ) -> IsdaResult<Vec<CdsAnalytic>> {
        tenors_months
            .iter()
            .map(|&tenor| self.make_imm_cds(trade_date, tenor))
            .collect()
    }

    /// Builds a standard credit index contract. Index maturities are
    /// measured from the index roll date, which gives maturities three
    /// months shorter than the equivalent single-name tenor.
    pub fn make_cdx(&self, trade_date: Date, tenor_months: u32) -> IsdaResult<CdsAnalytic> {
        let accrual_start = adjust(
            prev_imm_date(trade_date)?,
            self.convention,
            self.calendar.as_ref(),
        );
        let roll = next_index_roll_date(trade_date)?;
        let maturity = roll.add_months(tenor_months as i32 - 3)?;
        self.make_cds(trade_date, accrual_start, maturity)
    }

    /// Builds a shared-schedule contract set maturing on consecutive
    /// quarterly IMM dates indexed from the first IMM date after the
    /// trade date.
    pub fn make_multi_imm_cds(
        &self,
        trade_date: Date,
        maturity_indices: &[u32],
    ) -> IsdaResult<MultiCdsAnalytic> {
        if maturity_indices.is_empty() {
            return Err(IsdaError::invalid_input(
                "at least one maturity index is required",
            ));
        }
        let accrual_start = adjust(
            prev_imm_date(trade_date)?,
            self.convention,
            self.calendar.as_ref(),
        );
        let reference = next_imm_date(trade_date)?;
        let count = *maturity_indices.iter().max().unwrap_or(&0) as usize + 1;
        let maturities = imm_date_set(reference, count)?;
        MultiCdsAnalytic::new(
            trade_date,
            self.step_in_date(trade_date),
            self.cash_settle_date(trade_date),
            accrual_start,
            &maturities,
            maturity_indices,
            self.payment_interval_months,
            self.stub,
            self.pay_acc_on_default,
            self.protect_start,
            self.recovery_rate,
            self.convention,
            self.calendar.as_ref(),
            self.accrual_dcc,
            self.curve_dcc,
        )
    }
}
