//! # Credex ISDA
//!
//! Standard-model CDS analytics for the Credex credit analytics
//! library: curve construction, credit curve calibration, analytic
//! pricing, quote conversion, and spread risk.
//!
//! This crate provides:
//!
//! - **Curves**: zero curves with piecewise constant forward rates,
//!   the interpolation the standard model is defined on
//! - **Contracts**: date-free CDS representations built by a factory
//!   carrying the standard market conventions
//! - **Pricing**: closed-form protection and premium legs, par
//!   spreads, and analytic credit curve sensitivities
//! - **Calibration**: yield curve bootstrap from deposits and swaps,
//!   credit curve bootstrap from par spreads, quoted spreads, or
//!   points upfront
//! - **Risk**: parallel and bucketed CS01, by bump-and-reprice or
//!   through the par spread Jacobian
//!
//! ## Example
//!
//! ```rust
//! use credex_core::types::Date;
//! use credex_isda::prelude::*;
//!
//! let trade_date = Date::from_ymd(2013, 4, 21).unwrap();
//! let factory = CdsAnalyticFactory::new();
//!
//! // A standard 5Y contract and the quote pillars
//! let cds = factory.make_imm_cds(trade_date, 60).unwrap();
//! let pillars = factory
//!     .make_imm_cds_strip(trade_date, &[12, 36, 60, 120])
//!     .unwrap();
//!
//! let yield_curve = YieldCurve::flat(0.05).unwrap();
//! let credit_curve = CreditCurveBuilder::new()
//!     .calibrate_par_spreads(&pillars, &[0.006, 0.008, 0.009, 0.011], &yield_curve)
//!     .unwrap();
//!
//! let pricer = AnalyticCdsPricer::new();
//! let spread = pricer.par_spread(&cds, &yield_curve, &credit_curve).unwrap();
//! assert!(spread > 0.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::if_not_else)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::return_self_not_must_use)]

pub mod cds;
pub mod credit_curve;
pub mod cs01;
pub mod curve;
pub mod error;
pub mod imm;
pub mod multi;
pub mod pricer;
pub mod quote;
pub mod schedule;
pub mod yield_curve;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::cds::{CdsAnalytic, CdsAnalyticFactory, CdsCoupon};
    pub use crate::credit_curve::{ArbitrageHandling, CdsQuote, CreditCurveBuilder};
    pub use crate::cs01::{BumpType, SpreadSensitivityCalculator};
    pub use crate::curve::{CreditCurve, Curve, YieldCurve};
    pub use crate::error::{IsdaError, IsdaResult};
    pub use crate::multi::{MultiCdsAnalytic, MultiCdsPricer};
    pub use crate::pricer::{
        AccrualOnDefaultFormula, AnalyticCdsPricer, PriceType,
    };
    pub use crate::quote::MarketQuoteConverter;
    pub use crate::schedule::{PremiumLegSchedule, SchedulePeriod, StubType};
    pub use crate::yield_curve::{InstrumentType, YieldCurveBuilder};
}

pub use error::{IsdaError, IsdaResult};
