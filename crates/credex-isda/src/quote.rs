//! Conversions between the CDS quote conventions.
//!
//! Since the 2009 big bang, single names trade with a standard coupon
//! plus an upfront payment, quoted either as points upfront or as the
//! quoted spread of an equivalent flat hazard curve. Legacy par spread
//! quotes remain for curve building. Each conversion goes through a
//! calibrated hazard curve: flat for quoted spreads, the full bootstrap
//! for par spreads.

use crate::cds::CdsAnalytic;
use crate::credit_curve::{CdsQuote, CreditCurveBuilder};
use crate::curve::{CreditCurve, YieldCurve};
use crate::error::IsdaResult;
use crate::pricer::{AccrualOnDefaultFormula, AnalyticCdsPricer, PriceType};

/// Converter between points upfront, quoted spreads, and par spreads.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketQuoteConverter {
    pricer: AnalyticCdsPricer,
    builder: CreditCurveBuilder,
}

impl MarketQuoteConverter {
    /// Creates a converter using the original ISDA accrual formula.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a converter using the given accrual-on-default formula.
    #[must_use]
    pub fn with_formula(formula: AccrualOnDefaultFormula) -> Self {
        Self {
            pricer: AnalyticCdsPricer::with_formula(formula),
            builder: CreditCurveBuilder::new().with_formula(formula),
        }
    }

    /// Clean price of the contract at the given running premium, per
    /// unit notional. Positive when the protection buyer pays upfront.
    #[must_use]
    pub fn points_up_front(
        &self,
        cds: &CdsAnalytic,
        premium: f64,
        yield_curve: &YieldCurve,
        credit_curve: &CreditCurve,
    ) -> f64 {
        self.pricer
            .pv(cds, yield_curve, credit_curve, premium, PriceType::Clean)
    }

    /// Points upfront for each contract of a strip against one credit
    /// curve.
    #[must_use]
    pub fn strip_points_up_front(
        &self,
        cds_strip: &[CdsAnalytic],
        premium: f64,
        yield_curve: &YieldCurve,
        credit_curve: &CreditCurve,
    ) -> Vec<f64> {
        cds_strip
            .iter()
            .map(|cds| self.points_up_front(cds, premium, yield_curve, credit_curve))
            .collect()
    }

    /// The quoted spread equivalent to an upfront amount: the par
    /// spread of the flat hazard curve that reprices the upfront.
    pub fn puf_to_quoted_spread(
        &self,
        cds: &CdsAnalytic,
        premium: f64,
        yield_curve: &YieldCurve,
        points: f64,
    ) -> IsdaResult<f64> {
        let flat = self.builder.calibrate(
            std::slice::from_ref(cds),
            &[CdsQuote::PointsUpFront {
                coupon: premium,
                points,
            }],
            yield_curve,
        )?;
        self.pricer.par_spread(cds, yield_curve, &flat)
    }

    /// The upfront amount equivalent to a quoted spread.
    pub fn quoted_spread_to_puf(
        &self,
        cds: &CdsAnalytic,
        premium: f64,
        yield_curve: &YieldCurve,
        quoted_spread: f64,
    ) -> IsdaResult<f64> {
        let flat = self.builder.calibrate(
            std::slice::from_ref(cds),
            &[CdsQuote::ParSpread(quoted_spread)],
            yield_curve,
        )?;
        Ok(self.points_up_front(cds, premium, yield_curve, &flat))
    }

    /// Points upfront for a strip quoted in par spreads. The whole
    /// strip is priced off one bootstrapped curve.
    pub fn par_spreads_to_puf(
        &self,
        cds_strip: &[CdsAnalytic],
        premium: f64,
        yield_curve: &YieldCurve,
        par_spreads: &[f64],
    ) -> IsdaResult<Vec<f64>> {
        let curve = self
            .builder
            .calibrate_par_spreads(cds_strip, par_spreads, yield_curve)?;
        Ok(self.strip_points_up_front(cds_strip, premium, yield_curve, &curve))
    }

    /// Par spreads for a strip quoted in points upfront.
    pub fn puf_to_par_spreads(
        &self,
        cds_strip: &[CdsAnalytic],
        premium: f64,
        yield_curve: &YieldCurve,
        points: &[f64],
    ) -> IsdaResult<Vec<f64>> {
        let quotes: Vec<CdsQuote> = points
            .iter()
            .map(|&p| CdsQuote::PointsUpFront {
                coupon: premium,
                points: p,
            })
            .collect();
        let curve = self.builder.calibrate(cds_strip, &quotes, yield_curve)?;
        cds_strip
            .iter()
            .map(|cds| self.pricer.par_spread(cds, yield_curve, &curve))
            .collect()
    }

    /// Par spreads for a strip quoted in quoted spreads. Each quoted
    /// spread converts to an upfront through its own flat curve, then
    /// the strip is bootstrapped jointly.
    pub fn quoted_spreads_to_par_spreads(
        &self,
        cds_strip: &[CdsAnalytic],
        premium: f64,
        yield_curve: &YieldCurve,
        quoted_spreads: &[f64],
    ) -> IsdaResult<Vec<f64>> {
        let points = cds_strip
            .iter()
            .zip(quoted_spreads)
            .map(|(cds, &spread)| self.quoted_spread_to_puf(cds, premium, yield_curve, spread))
            .collect::<IsdaResult<Vec<f64>>>()?;
        self.puf_to_par_spreads(cds_strip, premium, yield_curve, &points)
    }

    /// Quoted spreads for a strip quoted in par spreads.
    pub fn par_spreads_to_quoted_spreads(
        &self,
        cds_strip: &[CdsAnalytic],
        premium: f64,
        yield_curve: &YieldCurve,
        par_spreads: &[f64],
    ) -> IsdaResult<Vec<f64>> {
        let points = self.par_spreads_to_puf(cds_strip, premium, yield_curve, par_spreads)?;
        cds_strip
            .iter()
            .zip(&points)
            .map(|(cds, &p)| self.puf_to_quoted_spread(cds, premium, yield_curve, p))
            .collect()
    }

    /// Converts a clean upfront amount to the dirty amount actually
    /// exchanged at settlement.
    #[must_use]
    pub fn clean_to_dirty(&self, cds: &CdsAnalytic, premium: f64, clean: f64) -> f64 {
        clean - cds.accrued_premium(premium)
    }

    /// Converts a dirty settlement amount to the clean quote.
    #[must_use]
    pub fn dirty_to_clean(&self, cds: &CdsAnalytic, premium: f64, dirty: f64) -> f64 {
        dirty + cds.accrued_premium(premium)
    }
}
