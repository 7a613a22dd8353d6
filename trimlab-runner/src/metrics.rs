//! Performance metrics: pure functions over a portfolio value series.
//!
//! Every metric is a pure function: value series in, scalar out. Years are
//! counted in trading days (`len / 252`) everywhere. Daily returns are
//! clipped to a symmetric band before any annualized statistic.

use serde::{Deserialize, Serialize};
use trimlab_core::indicators::TRADING_DAYS_PER_YEAR;

const DAYS: f64 = TRADING_DAYS_PER_YEAR as f64;

/// Point metrics for a single simulated value series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub final_value: f64,
    pub total_return: f64,
    pub cagr: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub max_drawdown: f64,
    pub volatility: f64,
    /// Daily returns that exceeded the clip bound.
    pub clipped_returns: usize,
}

impl PerformanceMetrics {
    /// Compute all point metrics. `initial_capital` is the CAGR and total
    /// return base; `clip` bounds each daily return to `[-clip, clip]`.
    pub fn compute(values: &[f64], initial_capital: f64, clip: f64) -> Self {
        let (returns, clipped_returns) = clip_returns(&daily_returns(values), clip);
        Self::from_clipped(values, initial_capital, &returns, clipped_returns)
    }

    /// Same as `compute`, for callers that already hold the clipped daily
    /// returns of `values` (the runner reuses them for the bootstrap).
    pub fn from_clipped(
        values: &[f64],
        initial_capital: f64,
        returns: &[f64],
        clipped_returns: usize,
    ) -> Self {
        Self {
            final_value: values.last().copied().unwrap_or(initial_capital),
            total_return: total_return(initial_capital, values),
            cagr: cagr(initial_capital, values),
            sharpe: sharpe_ratio(returns),
            sortino: sortino_ratio(returns),
            max_drawdown: max_drawdown(values),
            volatility: annualized_volatility(returns),
            clipped_returns,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction of `initial`.
pub fn total_return(initial: f64, values: &[f64]) -> f64 {
    match values.last() {
        Some(&last) if initial > 0.0 => last / initial - 1.0,
        _ => 0.0,
    }
}

/// Compound Annual Growth Rate: `(final/initial)^(252/len) - 1`.
///
/// Returns 0.0 for an empty series or non-positive endpoints.
pub fn cagr(initial: f64, values: &[f64]) -> f64 {
    let Some(&last) = values.last() else {
        return 0.0;
    };
    if initial <= 0.0 || last <= 0.0 {
        return 0.0;
    }
    let years = values.len() as f64 / DAYS;
    (last / initial).powf(1.0 / years) - 1.0
}

/// Annualized Sharpe ratio with a zero risk-free rate.
///
/// Sharpe = mean * 252 / (std * sqrt(252)). Returns 0.0 if the standard
/// deviation is zero or fewer than 2 returns.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(returns) * DAYS / (std * DAYS.sqrt())
}

/// Annualized Sortino ratio: the denominator is the sample standard
/// deviation of the negative returns only.
///
/// Returns 0.0 with fewer than two losing days or a zero downside deviation.
pub fn sortino_ratio(returns: &[f64]) -> f64 {
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    if downside.len() < 2 {
        return 0.0;
    }
    let downside_std = std_dev(&downside);
    if downside_std < 1e-15 {
        return 0.0;
    }
    mean_f64(returns) * DAYS / (downside_std * DAYS.sqrt())
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if the series is constant or monotonically increasing.
pub fn max_drawdown(values: &[f64]) -> f64 {
    let Some(&first) = values.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &v in values {
        if v > peak {
            peak = v;
        }
        if peak > 0.0 {
            max_dd = max_dd.min((v - peak) / peak);
        }
    }
    max_dd
}

/// Annualized volatility of daily returns.
pub fn annualized_volatility(returns: &[f64]) -> f64 {
    std_dev(returns) * DAYS.sqrt()
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Compute daily returns from a value series.
pub fn daily_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

/// Clip returns to `[-bound, bound]`, logging a warning per clipped day.
/// Returns the clipped series and the number of days clipped.
pub fn clip_returns(returns: &[f64], bound: f64) -> (Vec<f64>, usize) {
    let mut clipped = 0;
    let out = returns
        .iter()
        .enumerate()
        .map(|(i, &r)| {
            if r.abs() > bound {
                clipped += 1;
                tracing::warn!(
                    day = i + 1,
                    daily_return = r,
                    bound,
                    "extreme daily return clipped"
                );
                r.clamp(-bound, bound)
            } else {
                r
            }
        })
        .collect();
    (out, clipped)
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
