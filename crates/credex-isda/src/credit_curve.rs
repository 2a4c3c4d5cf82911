//! Credit curve calibration from market CDS quotes.
//!
//! The curve is bootstrapped pillar by pillar: the hazard rate at each
//! node is solved so the corresponding CDS reprices its quote, with
//! earlier nodes already fixed. Newton iteration with the analytic
//! credit sensitivity is tried first, falling back to a bracketed
//! Brent solve.

use serde::{Deserialize, Serialize};

use credex_math::solvers::{brent, newton_raphson, SolverConfig};

use crate::cds::CdsAnalytic;
use crate::curve::{CreditCurve, YieldCurve};
use crate::error::{IsdaError, IsdaResult};
use crate::pricer::{AccrualOnDefaultFormula, AnalyticCdsPricer, PriceType};

/// A market quote for a CDS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CdsQuote {
    /// The breakeven spread of the contract; no upfront payment.
    ParSpread(f64),
    /// A spread quoted against a standard coupon. Converted to an
    /// upfront amount through its own flat hazard curve.
    QuotedSpread {
        /// The standard running coupon, as a fraction.
        coupon: f64,
        /// The quoted spread, as a fraction.
        spread: f64,
    },
    /// A standard coupon plus a clean upfront amount per unit notional.
    PointsUpFront {
        /// The standard running coupon, as a fraction.
        coupon: f64,
        /// The upfront payment as a fraction of notional.
        points: f64,
    },
}

/// What to do when a calibrated hazard rate implies a negative forward
/// hazard rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArbitrageHandling {
    /// Accept the solved rate as is.
    #[default]
    Ignore,
    /// Reject the calibration.
    Fail,
    /// Clamp the node so the forward hazard rate is zero.
    ZeroHazardRate,
}

/// Bootstrap calibrator for [`CreditCurve`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreditCurveBuilder {
    pricer: AnalyticCdsPricer,
    arbitrage: ArbitrageHandling,
}

impl CreditCurveBuilder {
    /// Creates a calibrator using the original ISDA accrual formula.
    /// Negative forward hazard rates are accepted as calibrated; use
    /// [`with_arbitrage_handling`](Self::with_arbitrage_handling) to
    /// clamp or reject them.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the accrual-on-default formula.
    #[must_use]
    pub fn with_formula(mut self, formula: AccrualOnDefaultFormula) -> Self {
        self.pricer = AnalyticCdsPricer::with_formula(formula);
        self
    }

    /// Sets the handling of negative forward hazard rates.
    #[must_use]
    pub fn with_arbitrage_handling(mut self, arbitrage: ArbitrageHandling) -> Self {
        self.arbitrage = arbitrage;
        self
    }

    /// Calibrates a credit curve to par spread quotes.
    pub fn calibrate_par_spreads(
        &self,
        cds_strip: &[CdsAnalytic],
        spreads: &[f64],
        yield_curve: &YieldCurve,
    ) -> IsdaResult<CreditCurve> {
        let quotes: Vec<CdsQuote> = spreads.iter().map(|&s| CdsQuote::ParSpread(s)).collect();
        self.calibrate(cds_strip, &quotes, yield_curve)
    }

    /// Calibrates a credit curve to one quote per contract.
    ///
    /// Contracts must be in ascending maturity order. The curve nodes
    /// sit at the protection end times of the contracts.
    pub fn calibrate(
        &self,
        cds_strip: &[CdsAnalytic],
        quotes: &[CdsQuote],
        yield_curve: &YieldCurve,
    ) -> IsdaResult<CreditCurve> {
        if cds_strip.is_empty() {
            return Err(IsdaError::invalid_input(
                "at least one CDS is required for calibration",
            ));
        }
        if cds_strip.len() != quotes.len() {
            return Err(IsdaError::length_mismatch(
                "cds_strip",
                cds_strip.len(),
                "quotes",
                quotes.len(),
            ));
        }
        let times: Vec<f64> = cds_strip.iter().map(CdsAnalytic::protection_end).collect();
        for pair in times.windows(2) {
            if pair[1] <= pair[0] {
                return Err(IsdaError::invalid_input(
                    "contracts must be in strictly ascending maturity order",
                ));
            }
        }

        // Normalize every quote to a running coupon and an upfront
        let mut coupons = Vec::with_capacity(quotes.len());
        let mut upfronts = Vec::with_capacity(quotes.len());
        for (cds, quote) in cds_strip.iter().zip(quotes) {
            let (coupon, upfront) = self.coupon_and_upfront(cds, *quote, yield_curve)?;
            coupons.push(coupon);
            upfronts.push(upfront);
        }

        let guesses: Vec<f64> = cds_strip
            .iter()
            .zip(&coupons)
            .map(|(cds, coupon)| coupon / cds.lgd())
            .collect();
        let mut curve = CreditCurve::new(times.clone(), guesses.clone())?;

        for (index, cds) in cds_strip.iter().enumerate() {
            let rate = self.solve_pillar(
                cds,
                yield_curve,
                &curve,
                index,
                coupons[index],
                upfronts[index],
                guesses[index],
            )?;
            let rate = self.apply_arbitrage_handling(&curve, &times, index, rate)?;
            curve = curve.with_rate(rate, index);
        }
        Ok(curve)
    }

    /// Converts a quote to its (coupon, clean upfront) form.
    fn coupon_and_upfront(
        &self,
        cds: &CdsAnalytic,
        quote: CdsQuote,
        yield_curve: &YieldCurve,
    ) -> IsdaResult<(f64, f64)> {
        match quote {
            CdsQuote::ParSpread(spread) => Ok((spread, 0.0)),
            CdsQuote::PointsUpFront { coupon, points } => Ok((coupon, points)),
            CdsQuote::QuotedSpread { coupon, spread } => {
                // A quoted spread is the par spread of a flat hazard
                // curve; price the standard coupon against that curve
                let flat = self.calibrate(
                    std::slice::from_ref(cds),
                    &[CdsQuote::ParSpread(spread)],
                    yield_curve,
                )?;
                let points = self
                    .pricer
                    .pv(cds, yield_curve, &flat, coupon, PriceType::Clean);
                Ok((coupon, points))
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn solve_pillar(
        &self,
        cds: &CdsAnalytic,
        yield_curve: &YieldCurve,
        curve: &CreditCurve,
        index: usize,
        coupon: f64,
        upfront: f64,
        guess: f64,
    ) -> IsdaResult<f64> {
        let f = |h: f64| {
            self.pricer.pv(
                cds,
                yield_curve,
                &curve.with_rate(h, index),
                coupon,
                PriceType::Clean,
            ) - upfront
        };
        let df = |h: f64| {
            self.pricer.pv_credit_sensitivity(
                cds,
                yield_curve,
                &curve.with_rate(h, index),
                coupon,
                index,
            )
        };

        let config = SolverConfig::default();
        if let Ok(result) = newton_raphson(&f, &df, guess, &config) {
            return Ok(polish_root(&f, &df, result.root));
        }
        log::debug!(
            "Newton iteration failed at pillar {index}; falling back to bracketed solve"
        );

        // Grow an upper bound until the pv changes sign
        let lower = 0.0;
        let f_lower = f(lower);
        let mut upper = (2.0 * guess).max(0.01);
        for _ in 0..60 {
            if f_lower * f(upper) <= 0.0 {
                let result = brent(&f, lower, upper, &config).map_err(|err| match err {
                    credex_math::MathError::ConvergenceFailed {
                        iterations,
                        residual,
                    } => IsdaError::calibration_failed(index, iterations, residual),
                    other => IsdaError::from(other),
                })?;
                return Ok(polish_root(&f, &df, result.root));
            }
            upper *= 2.0;
        }
        Err(IsdaError::calibration_failed(
            index,
            config.max_iterations,
            f_lower,
        ))
    }

    fn apply_arbitrage_handling(
        &self,
        curve: &CreditCurve,
        times: &[f64],
        index: usize,
        rate: f64,
    ) -> IsdaResult<f64> {
        // The smallest hazard rate at this node keeping the forward
        // hazard rate non-negative
        let min_rate = if index == 0 {
            0.0
        } else {
            curve.curve().rate(index - 1) * times[index - 1] / times[index]
        };
        if rate >= min_rate {
            return Ok(rate);
        }
        match self.arbitrage {
            ArbitrageHandling::Ignore => Ok(rate),
            ArbitrageHandling::Fail => Err(IsdaError::ArbitrageViolation {
                pillar: index,
                hazard_rate: rate,
            }),
            ArbitrageHandling::ZeroHazardRate => {
                log::warn!(
                    "clamping hazard rate {rate:.6} at pillar {index} to keep the forward hazard rate non-negative"
                );
                Ok(min_rate)
            }
        }
    }
}

/// Drives the root to the numerical noise floor with a few extra
/// Newton steps, so pillar quotes reprice to machine precision.
fn polish_root(f: &impl Fn(f64) -> f64, df: &impl Fn(f64) -> f64, root: f64) -> f64 {
    let mut x = root;
    let mut fx = f(x);
    for _ in 0..3 {
        if fx.abs() < 1e-15 {
            break;
        }
        let dfx = df(x);
        if dfx.abs() < 1e-15 {
            break;
        }
        let next = x - fx / dfx;
        let f_next = f(next);
        if f_next.abs() >= fx.abs() {
            break;
        }
        x = next;
        fx = f_next;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cds::CdsAnalyticFactory;
    use approx::assert_relative_eq;
    use credex_core::types::Date;

    fn trade_date() -> Date {
        Date::from_ymd(2013, 4, 21).unwrap()
    }

    fn standard_strip() -> Vec<CdsAnalytic> {
        CdsAnalyticFactory::new()
            .make_imm_cds_strip(trade_date(), &[6, 12, 24, 36, 60, 84, 120])
            .unwrap()
    }

    #[test]
    fn test_pillars_reprice_par_spreads() {
        let strip = standard_strip();
        let spreads = [0.005, 0.007, 0.008, 0.0095, 0.01, 0.0095, 0.008];
        let yc = YieldCurve::flat(0.05).unwrap();

        let curve = CreditCurveBuilder::new()
            .calibrate_par_spreads(&strip, &spreads, &yc)
            .unwrap();

        let pricer = AnalyticCdsPricer::new();
        for (cds, &spread) in strip.iter().zip(&spreads) {
            let pv = pricer.pv(cds, &yc, &curve, spread, PriceType::Clean);
            assert!(pv.abs() < 1e-14, "pillar pv {pv}");
            assert_relative_eq!(
                pricer.par_spread(cds, &yc, &curve).unwrap(),
                spread,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_points_up_front_quotes_reprice() {
        let strip = standard_strip();
        let yc = YieldCurve::flat(0.05).unwrap();
        let quotes: Vec<CdsQuote> = [
            -0.002, -0.001, 0.0005, 0.002, 0.004, 0.005, 0.0055,
        ]
        .iter()
        .map(|&points| CdsQuote::PointsUpFront {
            coupon: 0.01,
            points,
        })
        .collect();

        let curve = CreditCurveBuilder::new()
            .calibrate(&strip, &quotes, &yc)
            .unwrap();

        let pricer = AnalyticCdsPricer::new();
        for (cds, quote) in strip.iter().zip(&quotes) {
            let CdsQuote::PointsUpFront { coupon, points } = *quote else {
                unreachable!()
            };
            let pv = pricer.pv(cds, &yc, &curve, coupon, PriceType::Clean);
            assert_relative_eq!(pv, points, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_quoted_spread_single_pillar_matches_par_spread() {
        // With one pillar the curve is flat, so a quoted spread and a
        // par spread quote give the same curve
        let strip = &standard_strip()[4..5];
        let yc = YieldCurve::flat(0.05).unwrap();
        let builder = CreditCurveBuilder::new();

        let from_par = builder
            .calibrate(strip, &[CdsQuote::ParSpread(0.01)], &yc)
            .unwrap();
        let from_quoted = builder
            .calibrate(
                strip,
                &[CdsQuote::QuotedSpread {
                    coupon: 0.005,
                    spread: 0.01,
                }],
                &yc,
            )
            .unwrap();
        assert_relative_eq!(
            from_par.curve().rate(0),
            from_quoted.curve().rate(0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_inverted_spreads_trip_arbitrage_handling() {
        let strip = standard_strip();
        // Steeply inverted: long-dated protection cheaper than the
        // short end implies negative forward hazard rates
        let spreads = [0.05, 0.04, 0.02, 0.01, 0.005, 0.003, 0.002];
        let yc = YieldCurve::flat(0.05).unwrap();

        let failed = CreditCurveBuilder::new()
            .with_arbitrage_handling(ArbitrageHandling::Fail)
            .calibrate_par_spreads(&strip, &spreads, &yc);
        assert!(matches!(
            failed,
            Err(IsdaError::ArbitrageViolation { .. })
        ));

        let clamped = CreditCurveBuilder::new()
            .with_arbitrage_handling(ArbitrageHandling::ZeroHazardRate)
            .calibrate_par_spreads(&strip, &spreads, &yc)
            .unwrap();
        // Clamped nodes have flat survival, so rt is non-decreasing
        let c = clamped.curve();
        for i in 1..c.node_count() {
            assert!(c.rate(i) * c.time(i) >= c.rate(i - 1) * c.time(i - 1) - 1e-12);
        }

        let ignored = CreditCurveBuilder::new()
            .with_arbitrage_handling(ArbitrageHandling::Ignore)
            .calibrate_par_spreads(&strip, &spreads, &yc)
            .unwrap();
        // Repricing still holds when the violation is accepted
        let pricer = AnalyticCdsPricer::new();
        for (cds, &spread) in strip.iter().zip(&spreads) {
            let pv = pricer.pv(cds, &yc, &ignored, spread, PriceType::Clean);
            assert!(pv.abs() < 1e-13);
        }
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let strip = standard_strip();
        let yc = YieldCurve::flat(0.05).unwrap();
        let result = CreditCurveBuilder::new().calibrate_par_spreads(&strip, &[0.01], &yc);
        assert!(matches!(result, Err(IsdaError::LengthMismatch { .. })));
    }

    #[test]
    fn test_markit_fix_formula_calibrates() {
        let strip = standard_strip();
        let spreads = [0.005, 0.007, 0.008, 0.0095, 0.01, 0.0095, 0.008];
        let yc = YieldCurve::flat(0.05).unwrap();

        let builder =
            CreditCurveBuilder::new().with_formula(AccrualOnDefaultFormula::MarkitFix);
        let curve = builder.calibrate_par_spreads(&strip, &spreads, &yc).unwrap();

        let pricer = AnalyticCdsPricer::with_formula(AccrualOnDefaultFormula::MarkitFix);
        for (cds, &spread) in strip.iter().zip(&spreads) {
            let pv = pricer.pv(cds, &yc, &curve, spread, PriceType::Clean);
            assert!(pv.abs() < 1e-14);
        }
    }
}
