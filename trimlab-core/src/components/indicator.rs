//! Indicator trait and the per-ticker precomputed series.
//!
//! Indicators are pure functions: a price (or derived) series in, a numeric
//! series of the same length out. They are computed once before the day loop.
//! No recomputation on each day.

use crate::domain::TickerId;

/// Trait for indicators.
///
/// The first `lookback()` values of the output are `f64::NAN` (warmup).
///
/// # Look-ahead contamination guard
/// No value at index t may depend on input at t+1 or later. Every indicator
/// must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_200", "realized_vol_30").
    fn name(&self) -> &str;

    /// Number of points needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator over the whole series.
    fn compute(&self, series: &[f64]) -> Vec<f64>;
}

/// Precomputed derived series for one ticker.
///
/// Accessors return `None` while a series is still warming up, so callers
/// cannot mistake "not enough history" for a zero signal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickerIndicators {
    pub moving_average: Vec<f64>,
    pub momentum: Vec<f64>,
    pub volatility: Vec<f64>,
    pub volatility_median: Vec<f64>,
}

fn defined(series: &[f64], day: usize) -> Option<f64> {
    series.get(day).copied().filter(|v| v.is_finite())
}

impl TickerIndicators {
    pub fn moving_average(&self, day: usize) -> Option<f64> {
        defined(&self.moving_average, day)
    }

    pub fn momentum(&self, day: usize) -> Option<f64> {
        defined(&self.momentum, day)
    }

    pub fn volatility(&self, day: usize) -> Option<f64> {
        defined(&self.volatility, day)
    }

    pub fn volatility_median(&self, day: usize) -> Option<f64> {
        defined(&self.volatility_median, day)
    }

    /// Short-window volatility over its long-window median.
    pub fn volatility_ratio(&self, day: usize) -> Option<f64> {
        let vol = self.volatility(day)?;
        let median = self.volatility_median(day).filter(|m| *m > 0.0)?;
        Some(vol / median)
    }
}

/// Indicators for every ticker of a price table, indexed by `TickerId`.
/// Read-only once built; shared across all strategy variants of a grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSet {
    per_ticker: Vec<TickerIndicators>,
}

impl IndicatorSet {
    pub fn new(per_ticker: Vec<TickerIndicators>) -> Self {
        Self { per_ticker }
    }

    pub fn ticker(&self, id: TickerId) -> &TickerIndicators {
        &self.per_ticker[id.index()]
    }

    pub fn len(&self) -> usize {
        self.per_ticker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_ticker.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_hide_warmup() {
        let ind = TickerIndicators {
            moving_average: vec![f64::NAN, 100.0],
            momentum: vec![f64::NAN, -0.01],
            volatility: vec![f64::NAN, 0.3],
            volatility_median: vec![f64::NAN, 0.2],
        };
        assert_eq!(ind.moving_average(0), None);
        assert_eq!(ind.moving_average(1), Some(100.0));
        assert_eq!(ind.momentum(1), Some(-0.01));
        assert_eq!(ind.volatility(5), None); // out of bounds
    }

    #[test]
    fn volatility_ratio_requires_positive_median() {
        let mut ind = TickerIndicators {
            volatility: vec![0.3],
            volatility_median: vec![0.2],
            ..Default::default()
        };
        assert!((ind.volatility_ratio(0).unwrap() - 1.5).abs() < 1e-12);
        ind.volatility_median = vec![0.0];
        assert_eq!(ind.volatility_ratio(0), None);
    }
}
