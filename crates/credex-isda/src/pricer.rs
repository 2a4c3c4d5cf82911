//! Analytic CDS pricing.
//!
//! Both legs are integrals of piecewise exponential functions, since
//! the discount and survival curves have piecewise constant forward
//! rates. The integrals are evaluated in closed form segment by
//! segment over the union of the two curves' knots. Small exponents
//! are handled by the stable kernels in [`credex_math::epsilon`].

use serde::{Deserialize, Serialize};

use credex_math::epsilon::{epsilon, epsilon_p, epsilon_pp};

use crate::cds::{CdsAnalytic, CdsCoupon};
use crate::curve::{CreditCurve, YieldCurve};
use crate::error::{IsdaError, IsdaResult};

/// Tolerance below which neighboring integration knots are merged.
pub(crate) const KNOT_TOL: f64 = 1e-10;

/// Half a day under ACT/365F, the accrual-on-default day offset of the
/// original ISDA model.
const HALF_DAY: f64 = 1.0 / 730.0;

/// Whether a present value includes premium accrued at step-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceType {
    /// Market quote convention. Accrued premium is excluded.
    Clean,
    /// Full value including accrued premium.
    Dirty,
}

/// Treatment of the accrual-on-default integral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccrualOnDefaultFormula {
    /// The original ISDA model, which accrues from half a day before
    /// the period start.
    #[default]
    OriginalIsda,
    /// The Markit fix of 2009, which removes the half day offset.
    MarkitFix,
}

/// Analytic pricer for CDS present values, par spreads, and credit
/// curve sensitivities.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticCdsPricer {
    formula: AccrualOnDefaultFormula,
    omega: f64,
}

impl AnalyticCdsPricer {
    /// Creates a pricer using the original ISDA accrual formula.
    #[must_use]
    pub fn new() -> Self {
        Self::with_formula(AccrualOnDefaultFormula::OriginalIsda)
    }

    /// Creates a pricer using the given accrual-on-default formula.
    #[must_use]
    pub fn with_formula(formula: AccrualOnDefaultFormula) -> Self {
        let omega = match formula {
            AccrualOnDefaultFormula::OriginalIsda => HALF_DAY,
            AccrualOnDefaultFormula::MarkitFix => 0.0,
        };
        Self { formula, omega }
    }

    /// The accrual-on-default formula in use.
    #[must_use]
    pub fn formula(&self) -> AccrualOnDefaultFormula {
        self.formula
    }

    /// Present value per unit notional for the protection buyer, valued
    /// at the cash settlement date.
    #[must_use]
    pub fn pv(
        &self,
        cds: &CdsAnalytic,
        yield_curve: &YieldCurve,
        credit_curve: &CreditCurve,
        fractional_spread: f64,
        price_type: PriceType,
    ) -> f64 {
        self.pv_at(
            cds,
            yield_curve,
            credit_curve,
            fractional_spread,
            price_type,
            cds.cash_settle_time(),
        )
    }

    /// Present value per unit notional, valued at an arbitrary time.
    #[must_use]
    pub fn pv_at(
        &self,
        cds: &CdsAnalytic,
        yield_curve: &YieldCurve,
        credit_curve: &CreditCurve,
        fractional_spread: f64,
        price_type: PriceType,
        valuation_time: f64,
    ) -> f64 {
        if cds.protection_end() <= 0.0 {
            return 0.0;
        }
        // Value both legs at the trade date, then rebase
        let protection = self.protection_leg_at(cds, yield_curve, credit_curve, 0.0);
        let annuity = self.annuity_at(cds, yield_curve, credit_curve, price_type, 0.0);
        let pv = protection - fractional_spread * annuity;
        pv / yield_curve.discount_factor(valuation_time)
    }

    /// The spread at which the contract has zero clean value.
    pub fn par_spread(
        &self,
        cds: &CdsAnalytic,
        yield_curve: &YieldCurve,
        credit_curve: &CreditCurve,
    ) -> IsdaResult<f64> {
        if cds.protection_end() <= 0.0 {
            return Err(IsdaError::invalid_input(
                "cannot compute par spread of an expired CDS",
            ));
        }
        let protection = self.protection_leg_at(cds, yield_curve, credit_curve, 0.0);
        let annuity = self.annuity_at(cds, yield_curve, credit_curve, PriceType::Clean, 0.0);
        Ok(protection / annuity)
    }

    /// Expected value of the protection payment per unit notional,
    /// valued at the cash settlement date.
    #[must_use]
    pub fn protection_leg(
        &self,
        cds: &CdsAnalytic,
        yield_curve: &YieldCurve,
        credit_curve: &CreditCurve,
    ) -> f64 {
        self.protection_leg_at(cds, yield_curve, credit_curve, cds.cash_settle_time())
    }

    /// Protection leg value rebased to an arbitrary valuation time.
    #[must_use]
    pub fn protection_leg_at(
        &self,
        cds: &CdsAnalytic,
        yield_curve: &YieldCurve,
        credit_curve: &CreditCurve,
        valuation_time: f64,
    ) -> f64 {
        if cds.protection_end() <= 0.0 {
            return 0.0;
        }
        let knots = integration_points(
            cds.effective_protection_start(),
            cds.protection_end(),
            yield_curve.curve().times(),
            credit_curve.curve().times(),
        );

        let mut ht0 = credit_curve.curve().rt(knots[0]);
        let mut rt0 = yield_curve.curve().rt(knots[0]);
        let mut b0 = (-ht0 - rt0).exp();
        let mut pv = 0.0;
        for &t in &knots[1..] {
            let ht1 = credit_curve.curve().rt(t);
            let rt1 = yield_curve.curve().rt(t);
            let b1 = (-ht1 - rt1).exp();
            let dht = ht1 - ht0;
            let drt = rt1 - rt0;
            let dhrt = dht + drt;

            // The segment integral is dht/(dht+drt)*(b0-b1); as the
            // denominator vanishes it tends to dht*b0
            let d_pv = if dhrt.abs() < 1e-5 {
                dht * b0 * epsilon(-dhrt)
            } else {
                (b0 - b1) * dht / dhrt
            };
            pv += d_pv;
            ht0 = ht1;
            rt0 = rt1;
            b0 = b1;
        }
        pv *= cds.lgd();
        pv / yield_curve.discount_factor(valuation_time)
    }

    /// Present value of the premium leg per unit of spread (the risky
    /// annuity), valued at the cash settlement date.
    #[must_use]
    pub fn annuity(
        &self,
        cds: &CdsAnalytic,
        yield_curve: &YieldCurve,
        credit_curve: &CreditCurve,
        price_type: PriceType,
    ) -> f64 {
        self.annuity_at(
            cds,
            yield_curve,
            credit_curve,
            price_type,
            cds.cash_settle_time(),
        )
    }

    /// Risky annuity rebased to an arbitrary valuation time.
    #[must_use]
    pub fn annuity_at(
        &self,
        cds: &CdsAnalytic,
        yield_curve: &YieldCurve,
        credit_curve: &CreditCurve,
        price_type: PriceType,
        valuation_time: f64,
    ) -> f64 {
        let mut pv = self.dirty_annuity(cds, yield_curve, credit_curve);
        let valuation_df = yield_curve.discount_factor(valuation_time);

        if price_type == PriceType::Clean {
            let protection_start = cds.effective_protection_start();
            let settle_df = yield_curve.discount_factor(cds.cash_settle_time());
            let q = if protection_start == 0.0 {
                1.0
            } else {
                credit_curve.survival_probability(protection_start)
            };
            pv -= cds.accrued_year_fraction() * settle_df * q;
        }
        pv / valuation_df
    }

    /// Risky annuity including accrued premium, valued at the trade
    /// date.
    #[must_use]
    pub fn dirty_annuity(
        &self,
        cds: &CdsAnalytic,
        yield_curve: &YieldCurve,
        credit_curve: &CreditCurve,
    ) -> f64 {
        if cds.protection_end() <= 0.0 {
            return 0.0;
        }
        let mut pv = 0.0;
        for coupon in cds.coupons() {
            let q = credit_curve.survival_probability(coupon.effective_end);
            let p = yield_curve.discount_factor(coupon.payment_time);
            pv += coupon.year_fraction * p * q;
        }

        if cds.pay_accrual_on_default() {
            let start = if cds.coupons().len() == 1 {
                cds.effective_protection_start()
            } else {
                cds.accrual_start_time()
            };
            let knots = integration_points(
                start,
                cds.protection_end(),
                yield_curve.curve().times(),
                credit_curve.curve().times(),
            );
            for coupon in cds.coupons() {
                pv += self.single_period_accrual_on_default(
                    coupon,
                    cds.effective_protection_start(),
                    &knots,
                    yield_curve,
                    credit_curve,
                );
            }
        }
        pv
    }

    /// Sensitivity of the clean pv (per unit notional) to the zero
    /// hazard rate at one credit curve node.
    #[must_use]
    pub fn pv_credit_sensitivity(
        &self,
        cds: &CdsAnalytic,
        yield_curve: &YieldCurve,
        credit_curve: &CreditCurve,
        fractional_spread: f64,
        node: usize,
    ) -> f64 {
        if cds.protection_end() <= 0.0 {
            return 0.0;
        }
        let annuity_sense =
            self.premium_leg_credit_sensitivity(cds, yield_curve, credit_curve, node);
        let protection_sense =
            self.protection_leg_credit_sensitivity(cds, yield_curve, credit_curve, node);
        protection_sense - fractional_spread * annuity_sense
    }

    /// Sensitivity of the par spread to the zero hazard rate at one
    /// credit curve node.
    pub fn par_spread_credit_sensitivity(
        &self,
        cds: &CdsAnalytic,
        yield_curve: &YieldCurve,
        credit_curve: &CreditCurve,
        node: usize,
    ) -> IsdaResult<f64> {
        if cds.protection_end() <= 0.0 {
            return Err(IsdaError::invalid_input(
                "cannot compute par spread sensitivity of an expired CDS",
            ));
        }
        let a = self.protection_leg(cds, yield_curve, credit_curve);
        let b = self.annuity(cds, yield_curve, credit_curve, PriceType::Clean);
        let spread = a / b;
        let dadh = self.protection_leg_credit_sensitivity(cds, yield_curve, credit_curve, node);
        let dbdh = self.premium_leg_credit_sensitivity(cds, yield_curve, credit_curve, node);
        Ok(spread * (dadh / a - dbdh / b))
    }

    /// Sensitivity of the protection leg (valued at cash settlement) to
    /// the zero hazard rate at one credit curve node.
    #[must_use]
    pub fn protection_leg_credit_sensitivity(
        &self,
        cds: &CdsAnalytic,
        yield_curve: &YieldCurve,
        credit_curve: &CreditCurve,
        node: usize,
    ) -> f64 {
        let cc = credit_curve.curve();
        let n_nodes = cc.node_count();
        // A node outside the protection window has no effect
        if (node != 0 && cds.protection_end() <= cc.time(node - 1))
            || (node != n_nodes - 1 && cds.effective_protection_start() >= cc.time(node + 1))
        {
            return 0.0;
        }

        let knots = integration_points(
            cds.effective_protection_start(),
            cds.protection_end(),
            yield_curve.curve().times(),
            cc.times(),
        );

        let mut t = knots[0];
        let mut ht0 = cc.rt(t);
        let mut rt0 = yield_curve.curve().rt(t);
        let mut dqdr0 = cc.single_node_discount_factor_sensitivity(t, node);
        let mut q0 = (-ht0).exp();
        let mut p0 = (-rt0).exp();
        let mut pv_sense = 0.0;
        for &knot in &knots[1..] {
            t = knot;
            let ht1 = cc.rt(t);
            let dqdr1 = cc.single_node_discount_factor_sensitivity(t, node);
            let rt1 = yield_curve.curve().rt(t);
            let q1 = (-ht1).exp();
            let p1 = (-rt1).exp();

            if dqdr0 == 0.0 && dqdr1 == 0.0 {
                ht0 = ht1;
                rt0 = rt1;
                p0 = p1;
                q0 = q1;
                continue;
            }

            let h_bar = ht1 - ht0;
            let f_bar = rt1 - rt0;
            let fh_bar = h_bar + f_bar;

            let d_pv_sense = if fh_bar.abs() < 1e-5 {
                let e = epsilon(-fh_bar);
                let e_p = epsilon_p(-fh_bar);
                let d_pv_dq0 = p0 * ((1.0 + h_bar) * e - h_bar * e_p);
                let d_pv_dq1 = -p0 * q0 / q1 * (e - h_bar * e_p);
                d_pv_dq0 * dqdr0 + d_pv_dq1 * dqdr1
            } else {
                let w = f_bar / fh_bar * (p0 * q0 - p1 * q1);
                ((w / q0 + h_bar * p0) / fh_bar) * dqdr0
                    - ((w / q1 + h_bar * p1) / fh_bar) * dqdr1
            };
            pv_sense += d_pv_sense;
            ht0 = ht1;
            rt0 = rt1;
            p0 = p1;
            q0 = q1;
            dqdr0 = dqdr1;
        }
        pv_sense *= cds.lgd();
        pv_sense / yield_curve.discount_factor(cds.cash_settle_time())
    }

    /// Sensitivity of the clean risky annuity (valued at cash
    /// settlement) to the zero hazard rate at one credit curve node.
    #[must_use]
    pub fn premium_leg_credit_sensitivity(
        &self,
        cds: &CdsAnalytic,
        yield_curve: &YieldCurve,
        credit_curve: &CreditCurve,
        node: usize,
    ) -> f64 {
        let cc = credit_curve.curve();
        let mut pv_sense = 0.0;
        for coupon in cds.coupons() {
            let dqdh = cc.single_node_discount_factor_sensitivity(coupon.effective_end, node);
            if dqdh == 0.0 {
                continue;
            }
            let p = yield_curve.discount_factor(coupon.payment_time);
            pv_sense += coupon.year_fraction * p * dqdh;
        }

        if cds.pay_accrual_on_default() {
            let start = if cds.coupons().len() == 1 {
                cds.effective_protection_start()
            } else {
                cds.accrual_start_time()
            };
            let knots = integration_points(
                start,
                cds.protection_end(),
                yield_curve.curve().times(),
                cc.times(),
            );
            for coupon in cds.coupons() {
                pv_sense += self.single_period_accrual_credit_sensitivity(
                    coupon,
                    cds.effective_protection_start(),
                    &knots,
                    yield_curve,
                    credit_curve,
                    node,
                );
            }
        }
        pv_sense / yield_curve.discount_factor(cds.cash_settle_time())
    }

    pub(crate) fn single_period_accrual_on_default(
        &self,
        coupon: &CdsCoupon,
        effective_start: f64,
        integration_knots: &[f64],
        yield_curve: &YieldCurve,
        credit_curve: &CreditCurve,
    ) -> f64 {
        let start = coupon.effective_start.max(effective_start);
        if start >= coupon.effective_end {
            return 0.0;
        }
        let knots = truncate_set_inclusive(start, coupon.effective_end, integration_knots);

        let mut t = knots[0];
        let mut ht0 = credit_curve.curve().rt(t);
        let mut rt0 = yield_curve.curve().rt(t);
        let mut b0 = (-rt0 - ht0).exp();

        let mut t0 = match self.formula {
            AccrualOnDefaultFormula::MarkitFix => 0.0,
            AccrualOnDefaultFormula::OriginalIsda => t - coupon.effective_start + self.omega,
        };
        let mut pv = 0.0;
        for j in 1..knots.len() {
            t = knots[j];
            let ht1 = credit_curve.curve().rt(t);
            let rt1 = yield_curve.curve().rt(t);
            let b1 = (-rt1 - ht1).exp();
            let dt = knots[j] - knots[j - 1];
            let dht = ht1 - ht0;
            let drt = rt1 - rt0;
            let dhrt = dht + drt;

            let t_pv = match self.formula {
                AccrualOnDefaultFormula::MarkitFix => {
                    if dhrt.abs() < 1e-5 {
                        dht * dt * b0 * epsilon_p(-dhrt)
                    } else {
                        dht * dt / dhrt * ((b0 - b1) / dhrt - b1)
                    }
                }
                AccrualOnDefaultFormula::OriginalIsda => {
                    let t1 = t - coupon.effective_start + self.omega;
                    let t_pv = if dhrt.abs() < 1e-5 {
                        dht * b0 * (t0 * epsilon(-dhrt) + dt * epsilon_p(-dhrt))
                    } else {
                        dht / dhrt * (t0 * b0 - t1 * b1 + dt / dhrt * (b0 - b1))
                    };
                    t0 = t1;
                    t_pv
                }
            };
            pv += t_pv;
            ht0 = ht1;
            rt0 = rt1;
            b0 = b1;
        }
        coupon.yf_ratio * pv
    }

    #[allow(clippy::too_many_lines)]
    fn single_period_accrual_credit_sensitivity(
        &self,
        coupon: &CdsCoupon,
        effective_start: f64,
        integration_knots: &[f64],
        yield_curve: &YieldCurve,
        credit_curve: &CreditCurve,
        node: usize,
    ) -> f64 {
        let start = coupon.effective_start.max(effective_start);
        if start >= coupon.effective_end {
            return 0.0;
        }
        let cc = credit_curve.curve();
        let knots = truncate_set_inclusive(start, coupon.effective_end, integration_knots);

        let mut t = knots[0];
        let mut ht0 = cc.rt(t);
        let mut rt0 = yield_curve.curve().rt(t);
        let mut p0 = (-rt0).exp();
        let mut q0 = (-ht0).exp();
        let mut b0 = p0 * q0;
        let mut dqdr0 = cc.single_node_discount_factor_sensitivity(t, node);

        let mut t0 = match self.formula {
            AccrualOnDefaultFormula::MarkitFix => 0.0,
            AccrualOnDefaultFormula::OriginalIsda => t - coupon.effective_start + self.omega,
        };
        let mut pv_sense = 0.0;
        for j in 1..knots.len() {
            t = knots[j];
            let ht1 = cc.rt(t);
            let rt1 = yield_curve.curve().rt(t);
            let p1 = (-rt1).exp();
            let q1 = (-ht1).exp();
            let b1 = p1 * q1;
            let dqdr1 = cc.single_node_discount_factor_sensitivity(t, node);
            let dt = knots[j] - knots[j - 1];
            let dht = ht1 - ht0;
            let drt = rt1 - rt0;
            // Nudged away from zero for consistency with the ISDA C
            // code in the degenerate flat case
            let dhrt = dht + drt + 1e-50;

            let t_pv_sense = match self.formula {
                AccrualOnDefaultFormula::MarkitFix => {
                    if dhrt.abs() < 1e-5 {
                        let e_p = epsilon_p(-dhrt);
                        let e_pp = epsilon_pp(-dhrt);
                        let d_pv_dq0 = p0 * dt * ((1.0 + dht) * e_p - dht * e_pp);
                        let d_pv_dq1 = b0 * dt / q1 * (-e_p + dht * e_pp);
                        d_pv_dq0 * dqdr0 + d_pv_dq1 * dqdr1
                    } else {
                        let w1 = (b0 - b1) / dhrt;
                        let w2 = w1 - b1;
                        let w3 = dht / dhrt;
                        let w4 = dt / dhrt;
                        let w5 = (1.0 - w3) * w2;
                        let d_pv_dq0 = w4 / q0 * (w5 + w3 * (b0 - w1));
                        let d_pv_dq1 = w4 / q1 * (w5 + w3 * (b1 * (1.0 + dhrt) - w1));
                        d_pv_dq0 * dqdr0 - d_pv_dq1 * dqdr1
                    }
                }
                AccrualOnDefaultFormula::OriginalIsda => {
                    let t1 = t - coupon.effective_start + self.omega;
                    let t_pv_sense = if dhrt.abs() < 1e-5 {
                        let e = epsilon(-dhrt);
                        let e_p = epsilon_p(-dhrt);
                        let e_pp = epsilon_pp(-dhrt);
                        let w1 = t0 * e + dt * e_p;
                        let w2 = t0 * e_p + dt * e_pp;
                        let d_pv_dq0 = p0 * ((1.0 + dht) * w1 - dht * w2);
                        let d_pv_dq1 = b0 / q1 * (-w1 + dht * w2);
                        d_pv_dq0 * dqdr0 + d_pv_dq1 * dqdr1
                    } else {
                        let w1 = dt / dhrt;
                        let w2 = dht / dhrt;
                        let w3 = (t0 + w1) * b0 - (t1 + w1) * b1;
                        let w4 = (1.0 - w2) / dhrt;
                        let w5 = w1 / dhrt * (b0 - b1);
                        let d_pv_dq0 = w4 * w3 / q0 + w2 * ((t0 + w1) * p0 - w5 / q0);
                        let d_pv_dq1 = w4 * w3 / q1 + w2 * ((t1 + w1) * p1 - w5 / q1);
                        d_pv_dq0 * dqdr0 - d_pv_dq1 * dqdr1
                    };
                    t0 = t1;
                    t_pv_sense
                }
            };
            pv_sense += t_pv_sense;
            ht0 = ht1;
            rt0 = rt1;
            p0 = p1;
            q0 = q1;
            b0 = b1;
            dqdr0 = dqdr1;
        }
        coupon.yf_ratio * pv_sense
    }
}

/// Builds the integration grid for the interval `(start, end)`: both
/// endpoints plus every knot of either curve strictly inside.
pub(crate) fn integration_points(start: f64, end: f64, set_a: &[f64], set_b: &[f64]) -> Vec<f64> {
    let mut combined: Vec<f64> = set_a
        .iter()
        .chain(set_b.iter())
        .copied()
        .filter(|&t| t > start && t < end)
        .collect();
    combined.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    truncate_set_inclusive(start, end, &combined)
}

/// Restricts a sorted knot set to `[lower, upper]`, making the bounds
/// the first and last points and merging knots closer than the
/// tolerance.
pub(crate) fn truncate_set_inclusive(lower: f64, upper: f64, set: &[f64]) -> Vec<f64> {
    let mut result = Vec::with_capacity(set.len() + 2);
    result.push(lower);
    for &x in set.iter().filter(|&&x| x > lower && x < upper) {
        if x - result[result.len() - 1] > KNOT_TOL {
            result.push(x);
        }
    }
    let last = result[result.len() - 1];
    if result.len() == 1 || upper - last > KNOT_TOL {
        result.push(upper);
    } else {
        let n = result.len();
        result[n - 1] = upper;
    }
    result
}
