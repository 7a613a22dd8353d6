//! Per-variant result record.

use serde::{Deserialize, Serialize};
use trimlab_core::domain::ReinvestmentTrigger;
use trimlab_core::engine::SimulationOutcome;
use trimlab_core::fingerprint::StrategyVariant;

use crate::bootstrap::BootstrapResult;
use crate::metrics::PerformanceMetrics;
use crate::rolling::RollingMetrics;

/// Current schema version for persisted result records.
pub const SCHEMA_VERSION: u32 = 1;

/// The output record for one strategy variant. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub name: String,
    pub slug: String,
    pub variant: StrategyVariant,

    pub final_value: f64,
    pub total_return: f64,
    pub cagr: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub max_drawdown: f64,
    pub volatility: f64,

    /// `None` when the series is not longer than the rolling window.
    pub rolling: Option<RollingMetrics>,
    /// `None` when there were too few returns to resample.
    pub bootstrap: Option<BootstrapResult>,

    pub trade_count: usize,
    pub reinvestment_count: usize,
    pub dip_buy_count: usize,
    /// Mean index drop at dip-buy time; 0 without dip buys.
    pub avg_dip_size: f64,
    pub total_transaction_costs: f64,
    pub total_capital_gains_tax: f64,
    pub total_costs_and_taxes: f64,
    /// Uninvested cash on the last day.
    pub cash_held: f64,
    pub clipped_returns: usize,
    pub warnings: Vec<String>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl StrategyResult {
    pub fn build(
        variant: &StrategyVariant,
        outcome: &SimulationOutcome,
        metrics: &PerformanceMetrics,
        rolling: Option<RollingMetrics>,
        bootstrap: Option<BootstrapResult>,
        warnings: Vec<String>,
    ) -> Self {
        let dips: Vec<f64> = outcome
            .reinvestments
            .iter()
            .filter_map(|e| match e.trigger {
                ReinvestmentTrigger::Dip { drop } => Some(drop),
                _ => None,
            })
            .collect();
        let avg_dip_size = if dips.is_empty() {
            0.0
        } else {
            dips.iter().sum::<f64>() / dips.len() as f64
        };

        Self {
            schema_version: SCHEMA_VERSION,
            name: variant.name(),
            slug: variant.slug(),
            variant: variant.clone(),
            final_value: metrics.final_value,
            total_return: metrics.total_return,
            cagr: metrics.cagr,
            sharpe: metrics.sharpe,
            sortino: metrics.sortino,
            max_drawdown: metrics.max_drawdown,
            volatility: metrics.volatility,
            rolling,
            bootstrap,
            trade_count: outcome.trade_count(),
            reinvestment_count: outcome.reinvestments.len(),
            dip_buy_count: dips.len(),
            avg_dip_size,
            total_transaction_costs: outcome.total_transaction_costs,
            total_capital_gains_tax: outcome.total_capital_gains_tax,
            total_costs_and_taxes: outcome.total_costs_and_taxes(),
            cash_held: outcome.final_cash(),
            clipped_returns: metrics.clipped_returns,
            warnings,
        }
    }

    /// Whether the point CAGR lies inside its bootstrap interval. `None`
    /// without a bootstrap.
    pub fn cagr_within_ci(&self) -> Option<bool> {
        self.bootstrap.map(|b| b.contains_cagr(self.cagr))
    }
}

/// A finished variant: its result plus the full simulation record, which
/// export needs for the per-day and per-event files.
#[derive(Debug, Clone)]
pub struct VariantRun {
    pub result: StrategyResult,
    pub outcome: SimulationOutcome,
}

/// A variant that aborted, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantFailure {
    pub name: String,
    pub slug: String,
    pub error: String,
}
