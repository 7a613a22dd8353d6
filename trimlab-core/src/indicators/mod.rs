//! Concrete indicator implementations.
//!
//! Every indicator implements the `Indicator` trait from
//! `components::indicator` over a plain `&[f64]` series. They are computed
//! once per ticker before the day loop (see `engine::precompute`) and read by
//! index afterwards. Undefined values are `NaN` and surface as `None` through
//! `TickerIndicators`.

pub mod momentum;
pub mod rolling_median;
pub mod sma;
pub mod volatility;

pub use momentum::Momentum;
pub use rolling_median::RollingMedian;
pub use sma::Sma;
pub use volatility::RealizedVolatility;

use serde::{Deserialize, Serialize};

/// Trading days per year, used for annualization and year counts.
pub const TRADING_DAYS_PER_YEAR: usize = 252;

/// Window lengths for the derived series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorWindows {
    pub moving_average: usize,
    pub momentum: usize,
    pub volatility: usize,
    pub volatility_median: usize,
}

impl Default for IndicatorWindows {
    fn default() -> Self {
        Self {
            moving_average: 200,
            momentum: 20,
            volatility: 30,
            volatility_median: 252,
        }
    }
}

/// Mean of the defined values in `series[end - window..end]` (the `window`
/// points strictly before `end`). `None` if the range holds no defined value.
pub fn trailing_mean(series: &[f64], end: usize, window: usize) -> Option<f64> {
    let end = end.min(series.len());
    let start = end.saturating_sub(window);
    let (sum, count) = series[start..end]
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::indicator::Indicator;

    #[test]
    fn trailing_mean_excludes_current_point() {
        let s = [1.0, 2.0, 3.0, 100.0];
        assert_eq!(trailing_mean(&s, 3, 3), Some(2.0));
        assert_eq!(trailing_mean(&s, 3, 2), Some(2.5));
    }

    #[test]
    fn trailing_mean_skips_undefined() {
        let s = [f64::NAN, f64::NAN, 4.0, 6.0, 0.0];
        assert_eq!(trailing_mean(&s, 4, 4), Some(5.0));
        assert_eq!(trailing_mean(&s, 2, 2), None);
        assert_eq!(trailing_mean(&s, 0, 5), None);
    }

    /// No indicator value at t may depend on data after t.
    #[test]
    fn no_lookahead_truncated_matches_full() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + (i as f64 * 0.37).sin() * 10.0 + i as f64 * 0.1)
            .collect();
        let indicators: Vec<Box<dyn Indicator>> = vec![
            Box::new(Sma::new(20)),
            Box::new(Momentum::new(10)),
            Box::new(RealizedVolatility::new(15, TRADING_DAYS_PER_YEAR)),
            Box::new(RollingMedian::new(9)),
        ];
        for ind in &indicators {
            let full = ind.compute(&closes);
            let cut = ind.compute(&closes[..80]);
            for i in 0..80 {
                let (a, b) = (full[i], cut[i]);
                assert!(
                    (a.is_nan() && b.is_nan()) || (a - b).abs() < 1e-12,
                    "{} differs at {i}: full={a} truncated={b}",
                    ind.name()
                );
            }
        }
    }

    #[test]
    fn warmup_is_nan_up_to_lookback() {
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        let sma = Sma::new(10);
        let out = sma.compute(&closes);
        assert!(out[..sma.lookback()].iter().all(|v| v.is_nan()));
        assert!(!out[sma.lookback()].is_nan());
    }
}
