//! Yield curve bootstrap from money market and swap rates.
//!
//! The curve is built node by node in maturity order. Money market
//! deposits give a discount factor directly. For a par swap the final
//! discount factor follows in closed form from the already-built part
//! of the curve, with coupon dates past the last node read off its
//! flat extrapolation, so no root search is needed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use credex_core::calendars::{adjust, BusinessDayConvention, Calendar, WeekendCalendar};
use credex_core::daycounts::DayCountConvention;
use credex_core::types::Date;

use crate::curve::{Curve, YieldCurve};
use crate::error::{IsdaError, IsdaResult};

/// The kind of instrument quoted at a curve node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrumentType {
    /// A cash deposit with a single payment at maturity.
    MoneyMarket,
    /// A par interest rate swap quoted by its fixed rate.
    Swap,
}

/// Bootstrap builder for [`YieldCurve`]s.
///
/// Defaults follow the standard CDS model conventions: ACT/360 money
/// market accrual, 30/360 semiannual swap coupons, ACT/365F curve
/// times, modified following adjustment on a weekend calendar.
///
/// Each swap node is solved in closed form: coupon dates past the
/// partially-built curve's last node are discounted off its flat
/// zero-rate extrapolation rather than the node being solved for.
/// Input swaps therefore reprice to roughly basis-point accuracy, not
/// to solver tolerance.
#[derive(Clone)]
pub struct YieldCurveBuilder {
    trade_date: Date,
    spot_date: Date,
    money_market_dcc: DayCountConvention,
    swap_dcc: DayCountConvention,
    swap_interval_months: u32,
    curve_dcc: DayCountConvention,
    convention: BusinessDayConvention,
    calendar: Arc<dyn Calendar>,
}

impl YieldCurveBuilder {
    /// Creates a builder with standard conventions, with instruments
    /// spot-starting on the trade date.
    #[must_use]
    pub fn new(trade_date: Date) -> Self {
        Self {
            trade_date,
            spot_date: trade_date,
            money_market_dcc: DayCountConvention::Act360,
            swap_dcc: DayCountConvention::Thirty360US,
            swap_interval_months: 6,
            curve_dcc: DayCountConvention::Act365Fixed,
            convention: BusinessDayConvention::ModifiedFollowing,
            calendar: Arc::new(WeekendCalendar),
        }
    }

    /// Sets the spot date the instruments start on.
    pub fn with_spot_date(mut self, spot_date: Date) -> IsdaResult<Self> {
        if spot_date < self.trade_date {
            return Err(IsdaError::invalid_input(format!(
                "spot date {spot_date} is before trade date {}",
                self.trade_date
            )));
        }
        self.spot_date = spot_date;
        Ok(self)
    }

    /// Sets the money market day count.
    #[must_use]
    pub fn with_money_market_day_count(mut self, dcc: DayCountConvention) -> Self {
        self.money_market_dcc = dcc;
        self
    }

    /// Sets the swap fixed leg day count.
    #[must_use]
    pub fn with_swap_day_count(mut self, dcc: DayCountConvention) -> Self {
        self.swap_dcc = dcc;
        self
    }

    /// Sets the swap fixed leg payment interval in months.
    #[must_use]
    pub fn with_swap_interval(mut self, months: u32) -> Self {
        self.swap_interval_months = months;
        self
    }

    /// Sets the curve time day count.
    #[must_use]
    pub fn with_curve_day_count(mut self, dcc: DayCountConvention) -> Self {
        self.curve_dcc = dcc;
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

    /// Builds the curve from one rate per instrument, in strictly
    /// ascending maturity order.
    pub fn build(
        &self,
        types: &[InstrumentType],
        tenors_months: &[u32],
        rates: &[f64],
    ) -> IsdaResult<YieldCurve> {
        if types.is_empty() {
            return Err(IsdaError::invalid_input(
                "at least one instrument is required",
            ));
        }
        if types.len() != tenors_months.len() {
            return Err(IsdaError::length_mismatch(
                "types",
                types.len(),
                "tenors",
                tenors_months.len(),
            ));
        }
        if types.len() != rates.len() {
            return Err(IsdaError::length_mismatch(
                "types",
                types.len(),
                "rates",
                rates.len(),
            ));
        }

        let n = types.len();
        let mut times = Vec::with_capacity(n);
        let mut node_rates = Vec::with_capacity(n);
        let mut curve: Option<Curve> = None;

        for i in 0..n {
            let maturity = adjust(
                self.spot_date.add_months(tenors_months[i] as i32)?,
                self.convention,
                self.calendar.as_ref(),
            );
            let t = self.curve_dcc.year_fraction(self.trade_date, maturity);
            if let Some(&last) = times.last() {
                if t <= last {
                    return Err(IsdaError::invalid_input(
                        "instruments must be in strictly ascending maturity order",
                    ));
                }
            }

            let discount_factor = match types[i] {
                InstrumentType::MoneyMarket => {
                    let dcf = self
                        .money_market_dcc
                        .year_fraction(self.spot_date, maturity);
                    1.0 / (1.0 + rates[i] * dcf)
                }
                InstrumentType::Swap => {
                    self.swap_maturity_discount_factor(tenors_months[i], rates[i], curve.as_ref())?
                }
            };
            if discount_factor <= 0.0 {
                return Err(IsdaError::invalid_input(format!(
                    "rate {} at node {i} implies a non-positive discount factor",
                    rates[i]
                )));
            }

            times.push(t);
            node_rates.push(-discount_factor.ln() / t);
            curve = Some(Curve::new(times.clone(), node_rates.clone())?);
        }

        Ok(YieldCurve::from(Curve::new(times, node_rates)?))
    }

    /// Solves the discount factor at a par swap's maturity given the
    /// curve built so far.
    fn swap_maturity_discount_factor(
        &self,
        tenor_months: u32,
        fixed_rate: f64,
        partial: Option<&Curve>,
    ) -> IsdaResult<f64> {
        let periods = self.swap_periods(tenor_months)?;
        let last = periods.len() - 1;

        // Value of the earlier fixed coupons per unit of fixed rate
        let mut annuity = 0.0;
        for &(t, alpha) in &periods[..last] {
            let df = match partial {
                Some(curve) => curve.discount_factor(t),
                None => {
                    return Err(IsdaError::invalid_input(
                        "a swap cannot be the first curve instrument unless it has a single payment",
                    ))
                }
            };
            annuity += alpha * df;
        }
        let (_, alpha_n) = periods[last];
        Ok((1.0 - fixed_rate * annuity) / (1.0 + fixed_rate * alpha_n))
    }

    /// Fixed leg payment times and accrual fractions for a swap of the
    /// given tenor.
    fn swap_periods(&self, tenor_months: u32) -> IsdaResult<Vec<(f64, f64)>> {
        let maturity = self.spot_date.add_months(tenor_months as i32)?;
        let mut boundaries = Vec::new();
        let mut k: i32 = 0;
        loop {
            let date = maturity.add_months(-k * self.swap_interval_months as i32)?;
            if date <= self.spot_date {
                break;
            }
            boundaries.push(date);
            k += 1;
        }
        boundaries.push(self.spot_date);
        boundaries.reverse();

        let mut periods = Vec::with_capacity(boundaries.len() - 1);
        for pair in boundaries.windows(2) {
            let start = adjust(pair[0], self.convention, self.calendar.as_ref());
            let end = adjust(pair[1], self.convention, self.calendar.as_ref());
            let t = self.curve_dcc.year_fraction(self.trade_date, end);
            let alpha = self.swap_dcc.year_fraction(start, end);
            periods.push((t, alpha));
        }
        Ok(periods)
    }
}
