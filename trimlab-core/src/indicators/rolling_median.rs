//! Trailing rolling median.
//!
//! Applied to a derived series (realized volatility) to form a regime
//! baseline. A window containing any undefined value is undefined, so the
//! first valid output sits `period - 1` points after the input's first
//! valid point.

use crate::components::indicator::Indicator;

#[derive(Debug, Clone)]
pub struct RollingMedian {
    period: usize,
    name: String,
}

impl RollingMedian {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "median period must be >= 1");
        Self {
            period,
            name: format!("median_{period}"),
        }
    }
}

impl Indicator for RollingMedian {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, series: &[f64]) -> Vec<f64> {
        let n = series.len();
        let mut result = vec![f64::NAN; n];
        let mut scratch = Vec::with_capacity(self.period);

        for i in (self.period - 1)..n {
            let window = &series[(i + 1 - self.period)..=i];
            if window.iter().any(|v| v.is_nan()) {
                continue;
            }
            scratch.clear();
            scratch.extend_from_slice(window);
            scratch.sort_by(|a, b| a.total_cmp(b));
            let mid = self.period / 2;
            result[i] = if self.period % 2 == 0 {
                (scratch[mid - 1] + scratch[mid]) / 2.0
            } else {
                scratch[mid]
            };
        }

        result
    }
}
