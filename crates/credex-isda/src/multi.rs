//! Pricing a strip of CDS contracts that share a premium schedule.
//!
//! Contracts on the same name traded on the same day differ only in
//! maturity, so their coupon periods coincide except for the final
//! accrual period of each maturity. Sharing the schedule lets the
//! strip be priced in one ascending pass instead of one full pricing
//! per maturity.

use credex_core::calendars::{adjust, BusinessDayConvention, Calendar};
use credex_core::daycounts::DayCountConvention;
use credex_core::types::Date;

use crate::cds::CdsCoupon;
use crate::curve::{CreditCurve, YieldCurve};
use crate::error::{IsdaError, IsdaResult};
use crate::pricer::{
    integration_points, AccrualOnDefaultFormula, AnalyticCdsPricer, PriceType, KNOT_TOL,
};
use crate::schedule::{PremiumLegSchedule, SchedulePeriod, StubType};

/// A set of CDS contracts differing only in maturity.
///
/// Coupon periods common to every maturity are stored once; each
/// maturity additionally carries its own terminal coupon, whose accrual
/// runs to the unadjusted maturity date.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiCdsAnalytic {
    step_in_time: f64,
    cash_settle_time: f64,
    acc_start: f64,
    effective_protection_start: f64,
    lgd: f64,
    accrued: f64,
    accrued_days: i64,
    pay_acc_on_default: bool,
    standard_coupons: Vec<CdsCoupon>,
    terminal_coupons: Vec<CdsCoupon>,
    // Number of standard coupons paid before each terminal coupon
    terminal_indices: Vec<usize>,
    protection_ends: Vec<f64>,
}

impl MultiCdsAnalytic {
    /// Builds the contract set from a quarterly maturity grid and the
    /// grid indices of the wanted maturities.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        trade_date: Date,
        step_in_date: Date,
        cash_settle_date: Date,
        accrual_start_date: Date,
        maturity_grid: &[Date],
        maturity_indices: &[u32],
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
        if maturity_indices.is_empty() {
            return Err(IsdaError::invalid_input(
                "at least one maturity index is required",
            ));
        }
        for pair in maturity_indices.windows(2) {
            if pair[1] <= pair[0] {
                return Err(IsdaError::invalid_input(
                    "maturity indices must be strictly increasing",
                ));
            }
        }
        let last_index = *maturity_indices.last().unwrap() as usize;
        if last_index >= maturity_grid.len() {
            return Err(IsdaError::invalid_input(format!(
                "maturity index {last_index} is beyond the maturity grid ({} dates)",
                maturity_grid.len()
            )));
        }
        if !(0.0..=1.0).contains(&recovery_rate) {
            return Err(IsdaError::invalid_input(format!(
                "recovery rate {recovery_rate} is not in [0, 1]"
            )));
        }

        let maturities: Vec<Date> = maturity_indices
            .iter()
            .map(|&i| maturity_grid[i as usize])
            .collect();
        let last_maturity = *maturities.last().unwrap();
        if maturities[0] <= step_in_date {
            return Err(IsdaError::schedule_error(format!(
                "earliest maturity {} is not after step-in {step_in_date}",
                maturities[0]
            )));
        }

        let step_in_time = curve_dcc.year_fraction(trade_date, step_in_date);
        let cash_settle_time = curve_dcc.year_fraction(trade_date, cash_settle_date);

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
            last_maturity,
            payment_interval_months,
            stub,
            convention,
            calendar,
            protect_start,
        )?
        .truncate(step_in_date);
        if schedule.is_empty() {
            return Err(IsdaError::schedule_error(format!(
                "no premium periods remain after step-in {step_in_date}"
            )));
        }

        // Every period in standard form: accrual runs to the adjusted
        // period end. Terminal coupons replace the last period of each
        // maturity below.
        let standard_coupons: Vec<CdsCoupon> = schedule
            .periods()
            .iter()
            .map(|&p| {
                let standardized = SchedulePeriod {
                    accrual_start: p.accrual_start,
                    accrual_end: p.payment_date,
                    payment_date: p.payment_date,
                };
                CdsCoupon::new(trade_date, standardized, protect_start, accrual_dcc, curve_dcc)
            })
            .collect();

        let mut terminal_coupons = Vec::with_capacity(maturities.len());
        let mut terminal_indices = Vec::with_capacity(maturities.len());
        let mut protection_ends = Vec::with_capacity(maturities.len());
        for &maturity in &maturities {
            let payment_date = adjust(maturity, convention, calendar);
            let index = schedule
                .periods()
                .iter()
                .position(|p| p.payment_date == payment_date)
                .ok_or_else(|| {
                    IsdaError::schedule_error(format!(
                        "maturity {maturity} does not fall on a period boundary"
                    ))
                })?;
            let accrual_end = if protect_start {
                maturity.add_days(1)
            } else {
                maturity
            };
            let terminal = SchedulePeriod {
                accrual_start: schedule.period(index).accrual_start,
                accrual_end,
                payment_date,
            };
            terminal_coupons.push(CdsCoupon::new(
                trade_date,
                terminal,
                protect_start,
                accrual_dcc,
                curve_dcc,
            ));
            terminal_indices.push(index);
            protection_ends.push(curve_dcc.year_fraction(trade_date, maturity));
        }

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
            lgd: 1.0 - recovery_rate,
            accrued,
            accrued_days,
            pay_acc_on_default,
            standard_coupons,
            terminal_coupons,
            terminal_indices,
            protection_ends,
        })
    }

    /// Number of maturities in the set.
    #[must_use]
    pub fn num_maturities(&self) -> usize {
        self.protection_ends.len()
    }

    /// Step-in time from the trade date.
    #[must_use]
    pub fn step_in_time(&self) -> f64 {
        self.step_in_time
    }

    /// Cash settlement time from the trade date.
    #[must_use]
    pub fn cash_settle_time(&self) -> f64 {
        self.cash_settle_time
    }

    /// Accrual start time of the first period.
    #[must_use]
    pub fn accrual_start_time(&self) -> f64 {
        self.acc_start
    }

    /// Start of the protected period.
    #[must_use]
    pub fn effective_protection_start(&self) -> f64 {
        self.effective_protection_start
    }

    /// End of the protected period for the i-th maturity.
    #[must_use]
    pub fn protection_end(&self, index: usize) -> f64 {
        self.protection_ends[index]
    }

    /// Protection ends for all maturities in ascending order.
    #[must_use]
    pub fn protection_ends(&self) -> &[f64] {
        &self.protection_ends
    }

    /// Loss given default.
    #[must_use]
    pub fn lgd(&self) -> f64 {
        self.lgd
    }

    /// Accrual year fraction at step-in, common to all maturities.
    #[must_use]
    pub fn accrued_year_fraction(&self) -> f64 {
        self.accrued
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

    /// Coupons common to every maturity, in payment order.
    #[must_use]
    pub fn standard_coupons(&self) -> &[CdsCoupon] {
        &self.standard_coupons
    }

    /// The final coupon of the i-th maturity.
    #[must_use]
    pub fn terminal_coupon(&self, index: usize) -> &CdsCoupon {
        &self.terminal_coupons[index]
    }

    /// Number of standard coupons paid before the terminal coupon of
    /// the i-th maturity.
    #[must_use]
    pub fn payments_before_terminal(&self, index: usize) -> usize {
        self.terminal_indices[index]
    }
}

/// Prices every maturity of a [`MultiCdsAnalytic`] in a single pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiCdsPricer {
    pricer: AnalyticCdsPricer,
}

impl MultiCdsPricer {
    /// Creates a pricer using the original ISDA accrual formula.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pricer: AnalyticCdsPricer::new(),
        }
    }

    /// Creates a pricer using the given accrual-on-default formula.
    #[must_use]
    pub fn with_formula(formula: AccrualOnDefaultFormula) -> Self {
        Self {
            pricer: AnalyticCdsPricer::with_formula(formula),
        }
    }

    /// Protection leg values per unit notional for each maturity,
    /// valued at the cash settlement date.
    ///
    /// Each maturity integrates the prefix of one shared knot set, cut
    /// at its own protection end, so the per-maturity values are the
    /// exact sums a stand-alone pricing of that maturity produces.
    #[must_use]
    pub fn protection_legs(
        &self,
        cds: &MultiCdsAnalytic,
        yield_curve: &YieldCurve,
        credit_curve: &CreditCurve,
    ) -> Vec<f64> {
        let settle_df = yield_curve.discount_factor(cds.cash_settle_time());
        self.protection_leg_values(cds, yield_curve, credit_curve)
            .into_iter()
            .map(|pv| pv / settle_df)
            .collect()
    }

    /// Protection leg values for each maturity at the trade date,
    /// before rebasing to cash settlement.
    fn protection_leg_values(
        &self,
        cds: &MultiCdsAnalytic,
        yield_curve: &YieldCurve,
        credit_curve: &CreditCurve,
    ) -> Vec<f64> {
        let ends = cds.protection_ends();
        let last_end = *ends.last().unwrap_or(&0.0);
        let start = cds.effective_protection_start();
        let knots = integration_points(
            start,
            last_end,
            yield_curve.curve().times(),
            credit_curve.curve().times(),
        );

        let cc = credit_curve.curve();
        let yc = yield_curve.curve();
        let segment = |ht0: f64, rt0: f64, b0: f64, t: f64| -> (f64, f64, f64, f64) {
            let ht1 = cc.rt(t);
            let rt1 = yc.rt(t);
            let b1 = (-ht1 - rt1).exp();
            let dht = ht1 - ht0;
            let dhrt = dht + (rt1 - rt0);
            let d_pv = if dhrt.abs() < 1e-5 {
                dht * b0 * credex_math::epsilon::epsilon(-dhrt)
            } else {
                (b0 - b1) * dht / dhrt
            };
            (d_pv, ht1, rt1, b1)
        };

        let ht_init = cc.rt(knots[0]);
        let rt_init = yc.rt(knots[0]);
        // State and running sum at the left knot of the current
        // segment, plus one knot back for ends that merge into it
        let mut left = (ht_init, rt_init, (-ht_init - rt_init).exp());
        let mut left_sum = 0.0;
        let mut prev = left;
        let mut prev_sum = 0.0;

        let mut results = Vec::with_capacity(ends.len());
        let mut target = 0;
        for j in 1..knots.len() {
            let t = knots[j];
            // A maturity ending in this segment integrates a final
            // partial segment from the last knot it keeps; an end
            // within the merge tolerance of the left knot displaces it
            while target < ends.len() && ends[target] > knots[j - 1] && ends[target] <= t {
                let e = ends[target];
                let pv = if j >= 2 && e - knots[j - 1] <= KNOT_TOL {
                    prev_sum + segment(prev.0, prev.1, prev.2, e).0
                } else {
                    left_sum + segment(left.0, left.1, left.2, e).0
                };
                results.push(pv * cds.lgd());
                target += 1;
            }
            let (d_pv, ht1, rt1, b1) = segment(left.0, left.1, left.2, t);
            prev = left;
            prev_sum = left_sum;
            left = (ht1, rt1, b1);
            left_sum += d_pv;
        }
        // Ends within tolerance above the final knot fold into it
        while target < ends.len() {
            results.push(left_sum * cds.lgd());
            target += 1;
        }
        results
    }

    /// Risky annuities for each maturity, valued at the cash
    /// settlement date.
    ///
    /// Coupon and accrual-on-default terms are evaluated once per
    /// shared coupon, then each maturity's annuity sums its terms in
    /// the order a stand-alone pricing uses (all coupon terms first,
    /// then all accrual terms), so the values match exactly.
    #[must_use]
    pub fn annuities(
        &self,
        cds: &MultiCdsAnalytic,
        yield_curve: &YieldCurve,
        credit_curve: &CreditCurve,
        price_type: PriceType,
    ) -> Vec<f64> {
        let settle_df = yield_curve.discount_factor(cds.cash_settle_time());
        self.annuity_values(cds, yield_curve, credit_curve, price_type)
            .into_iter()
            .map(|pv| pv / settle_df)
            .collect()
    }

    /// Annuity values for each maturity at the trade date, before
    /// rebasing to cash settlement.
    fn annuity_values(
        &self,
        cds: &MultiCdsAnalytic,
        yield_curve: &YieldCurve,
        credit_curve: &CreditCurve,
        price_type: PriceType,
    ) -> Vec<f64> {
        let n = cds.num_maturities();
        let last_end = cds.protection_end(n - 1);
        let settle_df = yield_curve.discount_factor(cds.cash_settle_time());

        let accrual_knots = if cds.pay_accrual_on_default() {
            integration_points(
                cds.accrual_start_time(),
                last_end,
                yield_curve.curve().times(),
                credit_curve.curve().times(),
            )
        } else {
            Vec::new()
        };

        let clean_adjustment = if price_type == PriceType::Clean {
            let protection_start = cds.effective_protection_start();
            let q = if protection_start == 0.0 {
                1.0
            } else {
                credit_curve.survival_probability(protection_start)
            };
            cds.accrued_year_fraction() * settle_df * q
        } else {
            0.0
        };

        let coupon_term = |coupon: &CdsCoupon| {
            coupon.year_fraction
                * yield_curve.discount_factor(coupon.payment_time)
                * credit_curve.survival_probability(coupon.effective_end)
        };
        let accrual_term = |coupon: &CdsCoupon| {
            self.pricer.single_period_accrual_on_default(
                coupon,
                cds.effective_protection_start(),
                &accrual_knots,
                yield_curve,
                credit_curve,
            )
        };

        let coupon_terms: Vec<f64> = cds.standard_coupons().iter().map(coupon_term).collect();
        let accrual_terms: Vec<f64> = if cds.pay_accrual_on_default() {
            cds.standard_coupons().iter().map(accrual_term).collect()
        } else {
            Vec::new()
        };

        let mut results = Vec::with_capacity(n);
        for i in 0..n {
            let count = cds.payments_before_terminal(i);
            let terminal = cds.terminal_coupon(i);
            let mut pv = 0.0;
            for term in &coupon_terms[..count] {
                pv += term;
            }
            pv += coupon_term(terminal);
            if cds.pay_accrual_on_default() {
                for term in &accrual_terms[..count] {
                    pv += term;
                }
                pv += accrual_term(terminal);
            }
            pv -= clean_adjustment;
            results.push(pv);
        }
        results
    }

    /// Present values per unit notional for the protection buyer at
    /// each maturity, one fractional spread per maturity.
    pub fn pv(
        &self,
        cds: &MultiCdsAnalytic,
        yield_curve: &YieldCurve,
        credit_curve: &CreditCurve,
        fractional_spreads: &[f64],
        price_type: PriceType,
    ) -> IsdaResult<Vec<f64>> {
        let n = cds.num_maturities();
        if fractional_spreads.len() != n {
            return Err(IsdaError::length_mismatch(
                "maturities",
                n,
                "spreads",
                fractional_spreads.len(),
            ));
        }
        let legs = self.protection_legs(cds, yield_curve, credit_curve);
        let annuities = self.annuities(cds, yield_curve, credit_curve, price_type);
        Ok(legs
            .iter()
            .zip(&annuities)
            .zip(fractional_spreads)
            .map(|((leg, annuity), spread)| leg - spread * annuity)
            .collect())
    }

    /// Par spreads for each maturity.
    ///
    /// The ratio is taken over the unrebased leg values, where the
    /// settlement discount factor cancels exactly.
    #[must_use]
    pub fn par_spreads(
        &self,
        cds: &MultiCdsAnalytic,
        yield_curve: &YieldCurve,
        credit_curve: &CreditCurve,
    ) -> Vec<f64> {
        let legs = self.protection_leg_values(cds, yield_curve, credit_curve);
        let annuities = self.annuity_values(cds, yield_curve, credit_curve, PriceType::Clean);
        legs.iter()
            .zip(&annuities)
            .map(|(leg, annuity)| leg / annuity)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cds::CdsAnalyticFactory;
    use crate::imm::{imm_date_set, next_imm_date, prev_imm_date};
    use approx::assert_relative_eq;
    use credex_core::calendars::WeekendCalendar;

    fn trade_date() -> Date {
        Date::from_ymd(2013, 4, 21).unwrap()
    }

    fn curves() -> (YieldCurve, CreditCurve) {
        let yc = YieldCurve::new(vec![1.0, 2.0, 5.0, 10.0], vec![0.01, 0.013, 0.02, 0.028])
            .unwrap();
        let cc = CreditCurve::new(vec![0.5, 1.0, 3.0, 5.0, 10.0], vec![
            0.008, 0.01, 0.015, 0.02, 0.023,
        ])
        .unwrap();
        (yc, cc)
    }

    fn single_equivalents(indices: &[u32]) -> Vec<crate::cds::CdsAnalytic> {
        let factory = CdsAnalyticFactory::new();
        let accrual_start = adjust(
            prev_imm_date(trade_date()).unwrap(),
            BusinessDayConvention::Following,
            &WeekendCalendar,
        );
        let reference = next_imm_date(trade_date()).unwrap();
        let grid = imm_date_set(reference, 20).unwrap();
        indices
            .iter()
            .map(|&i| {
                factory
                    .make_cds(trade_date(), accrual_start, grid[i as usize])
                    .unwrap()
            })
            .collect()
    }

    // Per-maturity values are the same sums a stand-alone pricing
    // produces, so equality holds to the last bit
    #[test]
    #[allow(clippy::float_cmp)]
    fn test_matches_single_contract_pricing() {
        let indices = [0u32, 1, 2, 4, 7, 11, 19];
        let multi = CdsAnalyticFactory::new()
            .make_multi_imm_cds(trade_date(), &indices)
            .unwrap();
        let singles = single_equivalents(&indices);
        let (yc, cc) = curves();

        let multi_pricer = MultiCdsPricer::new();
        let single_pricer = AnalyticCdsPricer::new();

        let legs = multi_pricer.protection_legs(&multi, &yc, &cc);
        let clean = multi_pricer.annuities(&multi, &yc, &cc, PriceType::Clean);
        let dirty = multi_pricer.annuities(&multi, &yc, &cc, PriceType::Dirty);
        let spreads = multi_pricer.par_spreads(&multi, &yc, &cc);
        assert_eq!(legs.len(), indices.len());

        for (i, single) in singles.iter().enumerate() {
            assert_eq!(legs[i], single_pricer.protection_leg(single, &yc, &cc));
            assert_eq!(
                clean[i],
                single_pricer.annuity(single, &yc, &cc, PriceType::Clean)
            );
            assert_eq!(
                dirty[i],
                single_pricer.annuity(single, &yc, &cc, PriceType::Dirty)
            );
            assert_eq!(
                spreads[i],
                single_pricer.par_spread(single, &yc, &cc).unwrap()
            );
        }
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_matches_single_with_markit_fix_formula() {
        let indices = [1u32, 3, 7, 19];
        let multi = CdsAnalyticFactory::new()
            .make_multi_imm_cds(trade_date(), &indices)
            .unwrap();
        let singles = single_equivalents(&indices);
        let (yc, cc) = curves();

        let multi_pricer = MultiCdsPricer::with_formula(AccrualOnDefaultFormula::MarkitFix);
        let single_pricer = AnalyticCdsPricer::with_formula(AccrualOnDefaultFormula::MarkitFix);

        let annuities = multi_pricer.annuities(&multi, &yc, &cc, PriceType::Clean);
        for (i, single) in singles.iter().enumerate() {
            assert_eq!(
                annuities[i],
                single_pricer.annuity(single, &yc, &cc, PriceType::Clean)
            );
        }
    }

    #[test]
    fn test_pv_at_quoted_spreads() {
        let indices = [0u32, 3, 7];
        let multi = CdsAnalyticFactory::new()
            .make_multi_imm_cds(trade_date(), &indices)
            .unwrap();
        let (yc, cc) = curves();
        let pricer = MultiCdsPricer::new();

        let spreads = pricer.par_spreads(&multi, &yc, &cc);
        let pvs = pricer
            .pv(&multi, &yc, &cc, &spreads, PriceType::Clean)
            .unwrap();
        for pv in pvs {
            assert!(pv.abs() < 1e-15);
        }

        // Wrong number of spreads is rejected
        assert!(pricer.pv(&multi, &yc, &cc, &[0.01], PriceType::Clean).is_err());
    }

    #[test]
    fn test_maturity_indices_validation() {
        let factory = CdsAnalyticFactory::new();
        assert!(factory.make_multi_imm_cds(trade_date(), &[]).is_err());
        assert!(factory
            .make_multi_imm_cds(trade_date(), &[2, 2, 3])
            .is_err());
        assert!(factory
            .make_multi_imm_cds(trade_date(), &[3, 1])
            .is_err());
    }

    #[test]
    fn test_shared_accrued_matches_single() {
        let multi = CdsAnalyticFactory::new()
            .make_multi_imm_cds(trade_date(), &[0, 4])
            .unwrap();
        let single = CdsAnalyticFactory::new()
            .make_imm_cds(trade_date(), 12)
            .unwrap();
        assert_eq!(multi.accrued_days(), single.accrued_days());
        assert_relative_eq!(
            multi.accrued_year_fraction(),
            single.accrued_year_fraction(),
            epsilon = 1e-15
        );
    }
}
