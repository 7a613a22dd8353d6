//! Strategy grid: enumerate trigger × parameter × mode and run every cell.
//!
//! Indicators are precomputed once and shared read-only. Each variant gets
//! its own trigger and policy instance, so nothing mutable crosses variants
//! and parallel and sequential execution produce identical results. A
//! variant that errors is recorded as a failure; the rest still complete.

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use thiserror::Error;

use trimlab_core::data::DroppedTicker;
use trimlab_core::domain::{TargetWeights, WeightsError};
use trimlab_core::engine::precompute_indicators;
use trimlab_core::fingerprint::{RunFingerprint, StrategyVariant};

use crate::config::{BacktestConfig, ConfigError};
use crate::data_loader::LoadedPrices;
use crate::fitness::FitnessMetric;
use crate::result::{VariantFailure, VariantRun};
use crate::runner::{run_variant, RunContext, RunError};

/// Errors that prevent the grid from starting.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("weights error: {0}")]
    Weights(#[from] WeightsError),
}

/// Everything one grid run produces.
#[derive(Debug, Clone)]
pub struct GridOutcome {
    /// Successful variants, best first by `ranking`.
    pub runs: Vec<VariantRun>,
    pub failures: Vec<VariantFailure>,
    pub ranking: FitnessMetric,
    pub fingerprint: RunFingerprint,
    pub dropped: Vec<DroppedTicker>,
    /// Run-level notes: data quality and weight resolution.
    pub warnings: Vec<String>,
    pub has_synthetic: bool,
}

impl GridOutcome {
    pub fn best(&self) -> Option<&VariantRun> {
        self.runs.first()
    }

    pub fn get(&self, slug: &str) -> Option<&VariantRun> {
        self.runs.iter().find(|r| r.result.slug == slug)
    }
}

/// All variants the config describes: buy-and-hold first (when enabled),
/// then every trigger configuration crossed with every mode.
pub fn enumerate_variants(config: &BacktestConfig) -> Vec<StrategyVariant> {
    let modes = config.reinvestment.modes();
    let mut variants = Vec::new();
    if config.grid.include_buy_and_hold {
        variants.push(StrategyVariant::buy_and_hold());
    }
    for trim in config.triggers.policies() {
        for reinvestment in &modes {
            variants.push(StrategyVariant {
                trim: trim.clone(),
                reinvestment: reinvestment.clone(),
            });
        }
    }
    variants
}

/// Split per-variant outcomes into successes and recorded failures, keeping
/// enumeration order.
fn partition_outcomes(
    variants: &[StrategyVariant],
    results: Vec<Result<VariantRun, RunError>>,
) -> (Vec<VariantRun>, Vec<VariantFailure>) {
    let mut runs = Vec::with_capacity(variants.len());
    let mut failures = Vec::new();
    for (variant, outcome) in variants.iter().zip(results) {
        match outcome {
            Ok(run) => runs.push(run),
            Err(e) => failures.push(VariantFailure {
                name: variant.name(),
                slug: variant.slug(),
                error: e.to_string(),
            }),
        }
    }
    (runs, failures)
}

/// Run the full grid against loaded prices.
pub fn run_grid(config: &BacktestConfig, prices: &LoadedPrices) -> Result<GridOutcome, GridError> {
    run_grid_with_progress(config, prices, |_, _, _| {})
}

/// Run the full grid, invoking `progress(done, total, name)` after each
/// variant completes (in completion order, which is not deterministic in
/// parallel mode).
pub fn run_grid_with_progress<F>(
    config: &BacktestConfig,
    prices: &LoadedPrices,
    progress: F,
) -> Result<GridOutcome, GridError>
where
    F: Fn(usize, usize, &str) + Send + Sync,
{
    config.validate()?;
    let table = &prices.table;
    let (weights, weight_warnings) = TargetWeights::resolve(&config.portfolio.weights, table)?;
    for w in &weight_warnings {
        tracing::warn!("{w}");
    }

    let indicators = precompute_indicators(table, &config.indicators);
    let ctx = RunContext {
        table,
        indicators: &indicators,
        weights: &weights,
        simulation: config.simulation_config(),
        metrics: &config.metrics,
    };

    let variants = enumerate_variants(config);
    let total = variants.len();
    let done = AtomicUsize::new(0);
    tracing::info!(variants = total, parallel = config.grid.parallel, "starting strategy grid");

    let run_one = |variant: &StrategyVariant| {
        let outcome = run_variant(&ctx, variant);
        let n = done.fetch_add(1, Ordering::Relaxed) + 1;
        let name = variant.name();
        match &outcome {
            Ok(run) => tracing::info!(
                done = n,
                total,
                variant = %name,
                final_value = run.result.final_value,
                "variant finished"
            ),
            Err(e) => tracing::warn!(done = n, total, variant = %name, error = %e, "variant failed"),
        }
        progress(n, total, &name);
        outcome
    };

    let results: Vec<_> = if config.grid.parallel {
        variants.par_iter().map(run_one).collect()
    } else {
        variants.iter().map(run_one).collect()
    };

    let (mut runs, failures) = partition_outcomes(&variants, results);

    let ranking = config.grid.ranking;
    runs.sort_by(|a, b| ranking.compare(&a.result, &b.result));

    let fingerprint = RunFingerprint::new(
        config.config_hash()?,
        prices.dataset_hash.clone(),
        config.metrics.seed,
        table,
        config.backtest.initial_capital,
    );

    let mut warnings = prices.warnings.clone();
    warnings.extend(weight_warnings);
    if prices.has_synthetic {
        warnings.push("results computed on synthetic prices".to_string());
    }

    tracing::info!(
        succeeded = runs.len(),
        failed = failures.len(),
        run_id = %fingerprint.run_id,
        "strategy grid complete"
    );

    Ok(GridOutcome {
        runs,
        failures,
        ranking,
        fingerprint,
        dropped: prices.dropped.clone(),
        warnings,
        has_synthetic: prices.has_synthetic,
    })
}
