//! Simple Moving Average (SMA).
//!
//! Rolling mean of a series over a trailing window.
//! Lookback: period - 1 (first valid value at index period-1).

use crate::components::indicator::Indicator;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, series: &[f64]) -> Vec<f64> {
        let n = series.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        let mut sum: f64 = series[..self.period].iter().sum();
        result[self.period - 1] = sum / self.period as f64;

        // Roll the window forward. NaN inputs poison the running sum, so
        // rescan the window whenever one is involved.
        for i in self.period..n {
            let leaving = series[i - self.period];
            let entering = series[i];
            if leaving.is_nan() || entering.is_nan() || sum.is_nan() {
                sum = series[(i + 1 - self.period)..=i].iter().sum();
            } else {
                sum = sum - leaving + entering;
            }
            result[i] = sum / self.period as f64;
        }

        result
    }
}
