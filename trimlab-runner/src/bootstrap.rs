//! Bootstrap confidence intervals for CAGR and Sharpe.
//!
//! Daily returns are resampled with replacement (i.i.d.) to build empirical
//! distributions of CAGR and annualized Sharpe. Iterations run in parallel
//! with rayon; iteration `i` draws from its own `StdRng` seeded by
//! `RngHierarchy::sub_seed("bootstrap", key, i)`, so the interval depends only
//! on the master seed and the variant key, never on thread scheduling.

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use trimlab_core::indicators::TRADING_DAYS_PER_YEAR;
use trimlab_core::rng::RngHierarchy;

use crate::metrics::sharpe_ratio;

// ─── Configuration ───────────────────────────────────────────────────

/// Configuration for the return bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Number of resamples (default 1000).
    pub iterations: usize,
    /// Two-sided confidence level (default 0.95).
    pub confidence: f64,
    /// Master seed for reproducibility.
    pub seed: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            confidence: 0.95,
            seed: 42,
        }
    }
}

// ─── Result types ────────────────────────────────────────────────────

/// Percentile bounds for CAGR and Sharpe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BootstrapResult {
    pub cagr_ci_lower: f64,
    pub cagr_ci_upper: f64,
    pub sharpe_ci_lower: f64,
    pub sharpe_ci_upper: f64,
    pub iterations: usize,
    pub sample_size: usize,
}

impl BootstrapResult {
    /// Whether a point CAGR lies inside its own interval.
    pub fn contains_cagr(&self, cagr: f64) -> bool {
        self.cagr_ci_lower <= cagr && cagr <= self.cagr_ci_upper
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum BootstrapError {
    #[error("insufficient data: {sample_size} daily returns, need at least 2")]
    InsufficientData { sample_size: usize },
    #[error("invalid bootstrap config: {0}")]
    InvalidConfig(String),
}

// ─── Bootstrap ───────────────────────────────────────────────────────

/// Bootstrap CAGR and Sharpe from daily `returns`.
///
/// Each resample has the same length as `returns`; its CAGR is
/// `prod(1 + r)^(252 / (n + 1)) - 1`, matching the point CAGR's year count
/// for a value series of `n + 1` points. Bounds are the `(1-c)/2` and
/// `(1+c)/2` percentiles with linear interpolation.
pub fn bootstrap_returns(
    returns: &[f64],
    key: &str,
    config: &BootstrapConfig,
) -> Result<BootstrapResult, BootstrapError> {
    let n = returns.len();
    if n < 2 {
        return Err(BootstrapError::InsufficientData { sample_size: n });
    }
    if config.iterations == 0 {
        return Err(BootstrapError::InvalidConfig("iterations must be > 0".into()));
    }
    if !(config.confidence > 0.0 && config.confidence < 1.0) {
        return Err(BootstrapError::InvalidConfig(format!(
            "confidence {} must be in (0, 1)",
            config.confidence
        )));
    }

    let hierarchy = RngHierarchy::new(config.seed);
    let years = (n + 1) as f64 / TRADING_DAYS_PER_YEAR as f64;

    let (mut cagrs, mut sharpes): (Vec<f64>, Vec<f64>) = (0..config.iterations)
        .into_par_iter()
        .map(|i| {
            let mut rng = hierarchy.rng_for("bootstrap", key, i as u64);
            let sample: Vec<f64> = (0..n).map(|_| returns[rng.gen_range(0..n)]).collect();
            let growth: f64 = sample.iter().map(|r| 1.0 + r).product();
            let cagr = if growth > 0.0 {
                growth.powf(1.0 / years) - 1.0
            } else {
                -1.0
            };
            (cagr, sharpe_ratio(&sample))
        })
        .unzip();

    cagrs.sort_by(f64::total_cmp);
    sharpes.sort_by(f64::total_cmp);

    let lo = (1.0 - config.confidence) / 2.0 * 100.0;
    let hi = (1.0 + config.confidence) / 2.0 * 100.0;
    Ok(BootstrapResult {
        cagr_ci_lower: percentile_sorted(&cagrs, lo),
        cagr_ci_upper: percentile_sorted(&cagrs, hi),
        sharpe_ci_lower: percentile_sorted(&sharpes, lo),
        sharpe_ci_upper: percentile_sorted(&sharpes, hi),
        iterations: config.iterations,
        sample_size: n,
    })
}

/// Percentile (0-100) of sorted data by linear interpolation.
pub fn percentile_sorted(sorted: &[f64], pct: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = (pct / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let frac = rank - lower as f64;
            sorted[lower] + frac * (sorted[upper] - sorted[lower])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wavy_returns(n: usize) -> Vec<f64> {
        (0..n).map(|i| 0.0005 + 0.01 * (i as f64 * 0.7).sin()).collect()
    }

    #[test]
    fn deterministic_for_same_seed_and_key() {
        let r = wavy_returns(500);
        let cfg = BootstrapConfig {
            iterations: 200,
            ..Default::default()
        };
        let a = bootstrap_returns(&r, "trim_50pct_cash", &cfg).unwrap();
        let b = bootstrap_returns(&r, "trim_50pct_cash", &cfg).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_keys_draw_different_samples() {
        let r = wavy_returns(500);
        let cfg = BootstrapConfig {
            iterations: 200,
            ..Default::default()
        };
        let a = bootstrap_returns(&r, "a", &cfg).unwrap();
        let b = bootstrap_returns(&r, "b", &cfg).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn bounds_are_ordered() {
        let r = wavy_returns(756);
        let res = bootstrap_returns(&r, "k", &BootstrapConfig::default()).unwrap();
        assert!(res.cagr_ci_lower <= res.cagr_ci_upper);
        assert!(res.sharpe_ci_lower <= res.sharpe_ci_upper);
        assert_eq!(res.iterations, 1000);
        assert_eq!(res.sample_size, 756);
    }

    #[test]
    fn constant_returns_collapse_the_interval() {
        let r = vec![0.001; 252];
        let res = bootstrap_returns(&r, "k", &BootstrapConfig::default()).unwrap();
        assert!((res.cagr_ci_upper - res.cagr_ci_lower).abs() < 1e-12);
        // constant returns have zero deviation: Sharpe falls back to zero
        assert_eq!(res.sharpe_ci_lower, 0.0);
        assert_eq!(res.sharpe_ci_upper, 0.0);
    }

    #[test]
    fn point_cagr_usually_inside_interval() {
        let r = wavy_returns(756);
        let mut value = 100.0;
        let mut values = vec![value];
        for x in &r {
            value *= 1.0 + x;
            values.push(value);
        }
        let point = crate::metrics::cagr(100.0, &values);
        let res = bootstrap_returns(&r, "k", &BootstrapConfig::default()).unwrap();
        assert!(res.contains_cagr(point), "{point} not in {res:?}");
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            bootstrap_returns(&[0.01], "k", &BootstrapConfig::default()),
            Err(BootstrapError::InsufficientData { sample_size: 1 })
        );
        let cfg = BootstrapConfig {
            confidence: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            bootstrap_returns(&[0.01, 0.02], "k", &cfg),
            Err(BootstrapError::InvalidConfig(_))
        ));
    }

    #[test]
    fn percentile_interpolates() {
        let d = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile_sorted(&d, 0.0), 1.0);
        assert_eq!(percentile_sorted(&d, 50.0), 3.0);
        assert_eq!(percentile_sorted(&d, 100.0), 5.0);
        assert!((percentile_sorted(&d, 2.5) - 1.1).abs() < 1e-12);
        assert_eq!(percentile_sorted(&[], 50.0), 0.0);
    }
}
