//! Single-variant runner: wires together components, simulator, and metrics.
//!
//! One call to `run_variant` is one independently retriable unit of the
//! grid: fresh trigger, fresh policy state, shared read-only price table and
//! indicators. Any error aborts this variant only.

use thiserror::Error;

use trimlab_core::components::{
    create_reinvestment, create_trigger, IndicatorSet, PolicyError, ReinvestmentPolicy,
    TrimTrigger,
};
use trimlab_core::domain::{PriceTable, TargetWeights};
use trimlab_core::engine::{simulate, validate_run, Finding, SimulationConfig, SimulationError};
use trimlab_core::fingerprint::StrategyVariant;

use crate::bootstrap::bootstrap_returns;
use crate::config::MetricsSection;
use crate::metrics::{clip_returns, daily_returns, PerformanceMetrics};
use crate::result::{StrategyResult, VariantRun};
use crate::rolling::rolling_metrics;

/// Errors that abort one strategy variant.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
    #[error("independent validation failed: {}", summarize(findings))]
    Validation { findings: Vec<Finding> },
}

fn summarize(findings: &[Finding]) -> String {
    let mut parts: Vec<String> = findings
        .iter()
        .take(3)
        .map(|f| match f.day {
            Some(day) => format!("{} on day {day}: {}", f.check, f.detail),
            None => format!("{}: {}", f.check, f.detail),
        })
        .collect();
    if findings.len() > 3 {
        parts.push(format!("and {} more", findings.len() - 3));
    }
    parts.join("; ")
}

/// Read-only inputs shared by every variant of a grid.
#[derive(Debug, Clone, Copy)]
pub struct RunContext<'a> {
    pub table: &'a PriceTable,
    pub indicators: &'a IndicatorSet,
    pub weights: &'a TargetWeights,
    pub simulation: SimulationConfig,
    pub metrics: &'a MetricsSection,
}

/// Simulate one variant and compute its metrics.
///
/// The result is checked by the independent validator (value series
/// re-derived from holdings, proceeds identity per trade, CAGR recomputed)
/// before it is returned. A point CAGR outside its own bootstrap interval is
/// kept but flagged in the warnings.
pub fn run_variant(ctx: &RunContext<'_>, variant: &StrategyVariant) -> Result<VariantRun, RunError> {
    let trigger = create_trigger(&variant.trim)?;
    let (mut policy, warnings) = create_reinvestment(&variant.reinvestment, ctx.table)?;
    run_with(ctx, variant, trigger.as_ref(), policy.as_mut(), warnings)
}

/// Body of `run_variant` once the trigger and policy exist.
fn run_with(
    ctx: &RunContext<'_>,
    variant: &StrategyVariant,
    trigger: &dyn TrimTrigger,
    policy: &mut dyn ReinvestmentPolicy,
    mut warnings: Vec<String>,
) -> Result<VariantRun, RunError> {
    let name = variant.name();
    let slug = variant.slug();

    let outcome = simulate(
        ctx.table,
        ctx.indicators,
        ctx.weights,
        trigger,
        policy,
        &ctx.simulation,
    )?;

    let values = outcome.value_series();
    let initial = ctx.simulation.initial_capital;
    let (returns, clipped) = clip_returns(&daily_returns(&values), ctx.metrics.return_clip);
    let metrics = PerformanceMetrics::from_clipped(&values, initial, &returns, clipped);
    if metrics.clipped_returns > 0 {
        warnings.push(format!(
            "{} daily returns clipped to ±{:.0}%",
            metrics.clipped_returns,
            ctx.metrics.return_clip * 100.0
        ));
    }

    let findings = validate_run(
        ctx.table,
        &outcome,
        initial,
        Some(metrics.cagr),
        ctx.simulation.reconciliation_tolerance,
    );
    if !findings.is_empty() {
        tracing::error!(variant = %name, findings = findings.len(), "validation failed");
        return Err(RunError::Validation { findings });
    }

    let rolling = rolling_metrics(&values, ctx.metrics.rolling_window);
    if rolling.is_none() {
        warnings.push(format!(
            "series of {} days is too short for the {}-day rolling window",
            values.len(),
            ctx.metrics.rolling_window
        ));
    }

    let bootstrap = match bootstrap_returns(&returns, &slug, &ctx.metrics.bootstrap_config()) {
        Ok(b) => Some(b),
        Err(e) => {
            warnings.push(format!("bootstrap skipped: {e}"));
            None
        }
    };

    let mut result =
        StrategyResult::build(variant, &outcome, &metrics, rolling, bootstrap, warnings);
    if result.cagr_within_ci() == Some(false) {
        tracing::warn!(variant = %name, cagr = result.cagr, "point CAGR outside its bootstrap interval");
        result
            .warnings
            .push("CAGR lies outside its bootstrap confidence interval".to_string());
    }

    tracing::debug!(
        variant = %name,
        final_value = result.final_value,
        trades = result.trade_count,
        "variant complete"
    );
    Ok(VariantRun { result, outcome })
}
