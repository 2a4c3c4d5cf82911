//! Piecewise constant forward rate curves.
//!
//! A curve stores zero rates at node times and interpolates linearly in
//! `rate * time`, which is equivalent to piecewise constant forward
//! rates. Extrapolation is flat in the zero rate on both sides. Both
//! discounting and survival curves share this representation; the
//! newtypes [`YieldCurve`] and [`CreditCurve`] supply the domain
//! vocabulary.

use std::sync::Arc;

use crate::error::{IsdaError, IsdaResult};

/// A zero rate curve interpolated linearly in `rate * time`.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    times: Arc<[f64]>,
    rates: Vec<f64>,
    // Cached rates[i] * times[i]
    rt: Vec<f64>,
}

impl Curve {
    /// Creates a curve from node times and zero rates.
    ///
    /// Times must be positive and strictly increasing.
    pub fn new(times: Vec<f64>, rates: Vec<f64>) -> IsdaResult<Self> {
        if times.is_empty() {
            return Err(IsdaError::invalid_input("curve must have at least one node"));
        }
        if times.len() != rates.len() {
            return Err(IsdaError::length_mismatch(
                "times",
                times.len(),
                "rates",
                rates.len(),
            ));
        }
        if times[0] <= 0.0 {
            return Err(IsdaError::invalid_input("node times must be positive"));
        }
        for window in times.windows(2) {
            if window[1] <= window[0] {
                return Err(IsdaError::invalid_input(
                    "node times must be strictly increasing",
                ));
            }
        }

        let rt = times.iter().zip(&rates).map(|(t, r)| r * t).collect();
        Ok(Self {
            times: times.into(),
            rates,
            rt,
        })
    }

    /// Number of curve nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.times.len()
    }

    /// Node times in ascending order.
    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Zero rates at the nodes.
    #[must_use]
    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    /// Time of the i-th node.
    #[must_use]
    pub fn time(&self, index: usize) -> f64 {
        self.times[index]
    }

    /// Zero rate at the i-th node.
    #[must_use]
    pub fn rate(&self, index: usize) -> f64 {
        self.rates[index]
    }

    /// Interpolated `rate * time` at an arbitrary time.
    #[must_use]
    pub fn rt(&self, t: f64) -> f64 {
        let n = self.times.len();
        if t <= self.times[0] {
            return self.rates[0] * t;
        }
        if t >= self.times[n - 1] {
            return self.rates[n - 1] * t;
        }
        match self.search(t) {
            Ok(index) => self.rt[index],
            Err(ip) => {
                let t1 = self.times[ip - 1];
                let t2 = self.times[ip];
                let dt = t2 - t1;
                ((t2 - t) * self.rt[ip - 1] + (t - t1) * self.rt[ip]) / dt
            }
        }
    }

    /// Discount factor (or survival probability) to time `t`.
    #[must_use]
    pub fn discount_factor(&self, t: f64) -> f64 {
        (-self.rt(t)).exp()
    }

    /// Continuously compounded zero rate to time `t`.
    #[must_use]
    pub fn zero_rate(&self, t: f64) -> f64 {
        if t == 0.0 {
            return self.rates[0];
        }
        self.rt(t) / t
    }

    /// Forward rate between two times, constant on each node interval.
    #[must_use]
    pub fn forward_rate(&self, t1: f64, t2: f64) -> f64 {
        (self.rt(t2) - self.rt(t1)) / (t2 - t1)
    }

    /// Sensitivity of the zero rate at `t` to each node rate.
    #[must_use]
    pub fn node_sensitivity(&self, t: f64) -> Vec<f64> {
        let n = self.times.len();
        let mut result = vec![0.0; n];
        if t <= self.times[0] {
            result[0] = 1.0;
            return result;
        }
        if t >= self.times[n - 1] {
            result[n - 1] = 1.0;
            return result;
        }
        match self.search(t) {
            Ok(index) => result[index] = 1.0,
            Err(ip) => {
                let t1 = self.times[ip - 1];
                let t2 = self.times[ip];
                let dt = t2 - t1;
                result[ip - 1] = t1 * (t2 - t) / (dt * t);
                result[ip] = t2 * (t - t1) / (dt * t);
            }
        }
        result
    }

    /// Sensitivity of the zero rate at `t` to a single node rate.
    #[must_use]
    pub fn single_node_sensitivity(&self, t: f64, node: usize) -> f64 {
        let n = self.times.len();
        if t <= self.times[0] {
            return if node == 0 { 1.0 } else { 0.0 };
        }
        if t >= self.times[n - 1] {
            return if node == n - 1 { 1.0 } else { 0.0 };
        }
        match self.search(t) {
            Ok(index) => {
                if node == index {
                    1.0
                } else {
                    0.0
                }
            }
            Err(ip) => {
                if node == ip - 1 {
                    let t1 = self.times[ip - 1];
                    let t2 = self.times[ip];
                    t1 * (t2 - t) / ((t2 - t1) * t)
                } else if node == ip {
                    let t1 = self.times[ip - 1];
                    let t2 = self.times[ip];
                    t2 * (t - t1) / ((t2 - t1) * t)
                } else {
                    0.0
                }
            }
        }
    }

    /// Sensitivity of the discount factor at `t` to a single node rate.
    #[must_use]
    pub fn single_node_discount_factor_sensitivity(&self, t: f64, node: usize) -> f64 {
        let n = self.times.len();
        if t <= self.times[0] {
            return if node == 0 {
                -t * (-t * self.rates[0]).exp()
            } else {
                0.0
            };
        }
        match self.search(t) {
            Ok(index) => {
                if node == index {
                    -t * (-self.rt[index]).exp()
                } else {
                    0.0
                }
            }
            Err(ip) => {
                if ip == n {
                    return if node == n - 1 {
                        -t * self.discount_factor(t)
                    } else {
                        0.0
                    };
                }
                if node != ip && node != ip - 1 {
                    return 0.0;
                }
                let t1 = self.times[ip - 1];
                let t2 = self.times[ip];
                let dt = t2 - t1;
                let rt = ((t2 - t) * self.rt[ip - 1] + (t - t1) * self.rt[ip]) / dt;
                let p = (-rt).exp();
                if node == ip {
                    -t2 * (t - t1) * p / dt
                } else {
                    -t1 * (t2 - t) * p / dt
                }
            }
        }
    }

    /// Returns a copy of the curve with one node rate replaced.
    #[must_use]
    pub fn with_rate(&self, rate: f64, index: usize) -> Self {
        let mut rates = self.rates.clone();
        let mut rt = self.rt.clone();
        rates[index] = rate;
        rt[index] = rate * self.times[index];
        Self {
            times: Arc::clone(&self.times),
            rates,
            rt,
        }
    }

    /// Returns a copy of the curve with all node rates replaced.
    pub fn with_rates(&self, rates: Vec<f64>) -> IsdaResult<Self> {
        if rates.len() != self.times.len() {
            return Err(IsdaError::length_mismatch(
                "times",
                self.times.len(),
                "rates",
                rates.len(),
            ));
        }
        let rt = self.times.iter().zip(&rates).map(|(t, r)| r * t).collect();
        Ok(Self {
            times: Arc::clone(&self.times),
            rates,
            rt,
        })
    }

    // Binary search over node times. Ok(i) for an exact node hit,
    // Err(ip) for the insertion point.
    fn search(&self, t: f64) -> Result<usize, usize> {
        self.times
            .binary_search_by(|node| node.partial_cmp(&t).unwrap_or(std::cmp::Ordering::Less))
    }
}

/// A discount curve built from zero rates.
#[derive(Debug, Clone, PartialEq)]
pub struct YieldCurve(Curve);

impl YieldCurve {
    /// Creates a yield curve from node times and zero rates.
    pub fn new(times: Vec<f64>, rates: Vec<f64>) -> IsdaResult<Self> {
        Ok(Self(Curve::new(times, rates)?))
    }

    /// Creates a flat curve at a single zero rate.
    pub fn flat(rate: f64) -> IsdaResult<Self> {
        Self::new(vec![1.0], vec![rate])
    }

    /// Discount factor to time `t`.
    #[must_use]
    pub fn discount_factor(&self, t: f64) -> f64 {
        self.0.discount_factor(t)
    }

    /// Continuously compounded zero rate to time `t`.
    #[must_use]
    pub fn zero_rate(&self, t: f64) -> f64 {
        self.0.zero_rate(t)
    }

    /// Instantaneous forward rate between two times.
    #[must_use]
    pub fn forward_rate(&self, t1: f64, t2: f64) -> f64 {
        self.0.forward_rate(t1, t2)
    }

    /// The underlying curve.
    #[must_use]
    pub fn curve(&self) -> &Curve {
        &self.0
    }
}

impl From<Curve> for YieldCurve {
    fn from(curve: Curve) -> Self {
        Self(curve)
    }
}

/// A survival curve built from zero hazard rates.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditCurve(Curve);

impl CreditCurve {
    /// Creates a credit curve from node times and zero hazard rates.
    pub fn new(times: Vec<f64>, hazard_rates: Vec<f64>) -> IsdaResult<Self> {
        Ok(Self(Curve::new(times, hazard_rates)?))
    }

    /// Creates a flat curve at a single hazard rate.
    pub fn flat(hazard_rate: f64) -> IsdaResult<Self> {
        Self::new(vec![1.0], vec![hazard_rate])
    }

    /// Survival probability to time `t`.
    #[must_use]
    pub fn survival_probability(&self, t: f64) -> f64 {
        self.0.discount_factor(t)
    }

    /// Zero hazard rate to time `t`.
    #[must_use]
    pub fn zero_hazard_rate(&self, t: f64) -> f64 {
        self.0.zero_rate(t)
    }

    /// Forward hazard rate between two times.
    #[must_use]
    pub fn forward_hazard_rate(&self, t1: f64, t2: f64) -> f64 {
        self.0.forward_rate(t1, t2)
    }

    /// Returns a copy with the hazard rate at one node replaced.
    #[must_use]
    pub fn with_rate(&self, hazard_rate: f64, index: usize) -> Self {
        Self(self.0.with_rate(hazard_rate, index))
    }

    /// The underlying curve.
    #[must_use]
    pub fn curve(&self) -> &Curve {
        &self.0
    }
}

impl From<Curve> for CreditCurve {
    fn from(curve: Curve) -> Self {
        Self(curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_curve() -> Curve {
        Curve::new(
            vec![0.5, 1.0, 3.0, 5.0, 10.0],
            vec![0.01, 0.015, 0.02, 0.025, 0.03],
        )
        .unwrap()
    }

    #[test]
    fn test_construction_validation() {
        assert!(Curve::new(vec![], vec![]).is_err());
        assert!(Curve::new(vec![1.0, 2.0], vec![0.01]).is_err());
        assert!(Curve::new(vec![-1.0, 2.0], vec![0.01, 0.02]).is_err());
        assert!(Curve::new(vec![2.0, 1.0], vec![0.01, 0.02]).is_err());
    }

    #[test]
    fn test_values_at_nodes() {
        let curve = sample_curve();
        for i in 0..curve.node_count() {
            let t = curve.time(i);
            assert_relative_eq!(curve.zero_rate(t), curve.rate(i), epsilon = 1e-15);
            assert_relative_eq!(
                curve.discount_factor(t),
                (-curve.rate(i) * t).exp(),
                epsilon = 1e-15
            );
        }
    }

    #[test]
    fn test_interpolation_is_linear_in_rt() {
        let curve = sample_curve();
        let t = 2.0;
        // Node interval [1.0, 3.0]
        let rt1 = 0.015 * 1.0;
        let rt2 = 0.02 * 3.0;
        let expected = ((3.0 - t) * rt1 + (t - 1.0) * rt2) / 2.0;
        assert_relative_eq!(curve.rt(t), expected, epsilon = 1e-15);
    }

    #[test]
    fn test_flat_extrapolation() {
        let curve = sample_curve();
        assert_relative_eq!(curve.zero_rate(0.25), 0.01, epsilon = 1e-15);
        assert_relative_eq!(curve.zero_rate(20.0), 0.03, epsilon = 1e-15);
        assert_relative_eq!(curve.zero_rate(0.0), 0.01, epsilon = 1e-15);
    }

    #[test]
    fn test_forward_rate_constant_within_interval() {
        let curve = sample_curve();
        let f1 = curve.forward_rate(1.2, 1.8);
        let f2 = curve.forward_rate(2.0, 2.9);
        assert_relative_eq!(f1, f2, epsilon = 1e-12);
    }

    #[test]
    fn test_node_sensitivity() {
        let curve = sample_curve();

        let before = curve.node_sensitivity(0.25);
        assert_relative_eq!(before[0], 1.0);
        assert!(before[1..].iter().all(|&s| s == 0.0));

        let after = curve.node_sensitivity(15.0);
        assert_relative_eq!(after[4], 1.0);

        let at_node = curve.node_sensitivity(3.0);
        assert_relative_eq!(at_node[2], 1.0);
        assert_relative_eq!(at_node[1], 0.0);

        let t = 2.0;
        let between = curve.node_sensitivity(t);
        assert_relative_eq!(between[1], 1.0 * (3.0 - t) / (2.0 * t), epsilon = 1e-15);
        assert_relative_eq!(between[2], 3.0 * (t - 1.0) / (2.0 * t), epsilon = 1e-15);
        assert_relative_eq!(between[0], 0.0);
        assert_relative_eq!(between[3], 0.0);
    }

    #[test]
    fn test_single_node_sensitivity_matches_vector() {
        let curve = sample_curve();
        for &t in &[0.25, 0.5, 2.0, 3.0, 7.5, 12.0] {
            let full = curve.node_sensitivity(t);
            for i in 0..curve.node_count() {
                assert_relative_eq!(
                    curve.single_node_sensitivity(t, i),
                    full[i],
                    epsilon = 1e-15
                );
            }
        }
    }

    #[test]
    fn test_discount_factor_sensitivity_finite_difference() {
        let curve = sample_curve();
        let bump = 1e-7;
        for &t in &[0.25, 0.5, 2.0, 3.0, 7.5, 12.0] {
            for i in 0..curve.node_count() {
                let analytic = curve.single_node_discount_factor_sensitivity(t, i);
                let up = curve.with_rate(curve.rate(i) + bump, i).discount_factor(t);
                let down = curve.with_rate(curve.rate(i) - bump, i).discount_factor(t);
                let numeric = (up - down) / (2.0 * bump);
                assert_relative_eq!(analytic, numeric, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_with_rate() {
        let curve = sample_curve();
        let bumped = curve.with_rate(0.03, 1);
        assert_relative_eq!(bumped.zero_rate(1.0), 0.03, epsilon = 1e-15);
        // Other nodes untouched
        assert_relative_eq!(bumped.zero_rate(5.0), 0.025, epsilon = 1e-15);
        // Original unchanged
        assert_relative_eq!(curve.zero_rate(1.0), 0.015, epsilon = 1e-15);
    }

    #[test]
    fn test_credit_curve_vocabulary() {
        let credit = CreditCurve::flat(0.02).unwrap();
        assert_relative_eq!(
            credit.survival_probability(3.0),
            (-0.06f64).exp(),
            epsilon = 1e-15
        );
        assert_relative_eq!(credit.zero_hazard_rate(7.0), 0.02, epsilon = 1e-15);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        // Node times strictly increasing and rt non-decreasing, the
        // shape every calibrated arbitrage-free curve has
        fn arb_curve() -> impl Strategy<Value = Curve> {
            (2usize..8).prop_flat_map(|n| {
                (
                    proptest::collection::vec(0.05f64..2.0, n),
                    proptest::collection::vec(0.0f64..0.2, n),
                )
                    .prop_map(|(gaps, increments)| {
                        let mut t = 0.0;
                        let times: Vec<f64> = gaps
                            .iter()
                            .map(|gap| {
                                t += gap;
                                t
                            })
                            .collect();
                        let mut rt = 0.0;
                        let rates: Vec<f64> = increments
                            .iter()
                            .zip(&times)
                            .map(|(dr, &time)| {
                                rt += dr;
                                rt / time
                            })
                            .collect();
                        Curve::new(times, rates).unwrap()
                    })
            })
        }

        proptest! {
            #[test]
            fn discount_factors_decrease_for_positive_rates(
                curve in arb_curve(), t in 0.01f64..30.0
            ) {
                let df = curve.discount_factor(t);
                prop_assert!(df > 0.0 && df <= 1.0);
                let later = curve.discount_factor(t + 1.0);
                prop_assert!(later <= df + 1e-15);
            }

            #[test]
            fn single_node_sensitivity_matches_vector(
                curve in arb_curve(), t in 0.01f64..30.0
            ) {
                let full = curve.node_sensitivity(t);
                for i in 0..curve.node_count() {
                    prop_assert_eq!(curve.single_node_sensitivity(t, i), full[i]);
                }
            }

            #[test]
            fn with_rate_only_moves_adjacent_intervals(
                curve in arb_curve(), bump in 1e-4f64..0.05
            ) {
                let n = curve.node_count();
                let bumped = curve.with_rate(curve.rate(0) + bump, 0);
                if n > 2 {
                    // Beyond the second node the first rate has no reach
                    let t = curve.time(2);
                    prop_assert_eq!(bumped.rt(t), curve.rt(t));
                }
                prop_assert!(bumped.rt(curve.time(0)) > curve.rt(curve.time(0)));
            }
        }
    }
}
