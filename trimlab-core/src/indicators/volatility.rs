//! Annualized realized volatility.
//!
//! Daily simple returns r[t] = close[t]/close[t-1] - 1 (undefined at t=0),
//! then the sample standard deviation (n-1) of the trailing `period` returns,
//! scaled by sqrt(annualization). First valid value at index `period`.

use crate::components::indicator::Indicator;

#[derive(Debug, Clone)]
pub struct RealizedVolatility {
    period: usize,
    annualization: f64,
    name: String,
}

impl RealizedVolatility {
    pub fn new(period: usize, annualization: usize) -> Self {
        assert!(period >= 2, "volatility period must be >= 2");
        Self {
            period,
            annualization: annualization as f64,
            name: format!("realized_vol_{period}"),
        }
    }
}

impl Indicator for RealizedVolatility {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, series: &[f64]) -> Vec<f64> {
        let n = series.len();
        let mut result = vec![f64::NAN; n];
        if n <= self.period {
            return result;
        }

        let mut returns = vec![f64::NAN; n];
        for i in 1..n {
            returns[i] = series[i] / series[i - 1] - 1.0;
        }

        let scale = self.annualization.sqrt();
        for i in self.period..n {
            let window = &returns[(i + 1 - self.period)..=i];
            if window.iter().any(|r| !r.is_finite()) {
                continue;
            }
            result[i] = sample_std(window) * scale;
        }

        result
    }
}

fn sample_std(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}
