//! Rolling-window CAGR and drawdown.
//!
//! Every trailing window of `window` trading days (window + 1 value points)
//! gets its own CAGR and max drawdown. The summary reports the mean and
//! standard deviation of rolling CAGR and the mean and worst rolling
//! drawdown. Undefined for series no longer than the window.

use serde::{Deserialize, Serialize};
use trimlab_core::indicators::TRADING_DAYS_PER_YEAR;

use crate::metrics::{max_drawdown, mean_f64, std_dev};

/// One trailing window ending on `end_day`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingPoint {
    pub end_day: usize,
    pub cagr: f64,
    pub max_drawdown: f64,
}

/// Summary of all rolling windows for one value series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingMetrics {
    pub window: usize,
    pub windows: usize,
    pub cagr_mean: f64,
    pub cagr_std: f64,
    pub drawdown_mean: f64,
    pub drawdown_worst: f64,
}

/// The rolling series: one point per window end `window..len`.
pub fn rolling_points(values: &[f64], window: usize) -> Vec<RollingPoint> {
    if window == 0 || values.len() <= window {
        return Vec::new();
    }
    let years = window as f64 / TRADING_DAYS_PER_YEAR as f64;
    (window..values.len())
        .map(|end| {
            let segment = &values[end - window..=end];
            let (first, last) = (segment[0], segment[window]);
            let cagr = if first > 0.0 && last > 0.0 {
                (last / first).powf(1.0 / years) - 1.0
            } else {
                0.0
            };
            RollingPoint {
                end_day: end,
                cagr,
                max_drawdown: max_drawdown(segment),
            }
        })
        .collect()
}

/// Summarise the rolling series, or `None` when the series is too short.
pub fn rolling_metrics(values: &[f64], window: usize) -> Option<RollingMetrics> {
    let points = rolling_points(values, window);
    if points.is_empty() {
        return None;
    }
    let cagrs: Vec<f64> = points.iter().map(|p| p.cagr).collect();
    let drawdowns: Vec<f64> = points.iter().map(|p| p.max_drawdown).collect();
    Some(RollingMetrics {
        window,
        windows: points.len(),
        cagr_mean: mean_f64(&cagrs),
        cagr_std: std_dev(&cagrs),
        drawdown_mean: mean_f64(&drawdowns),
        drawdown_worst: drawdowns.iter().copied().fold(0.0, f64::min),
    })
}
