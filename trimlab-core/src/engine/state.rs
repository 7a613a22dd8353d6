//! Simulation configuration, errors and run outcome types.

use super::accounting::CostModel;
use crate::domain::{ReinvestmentEvent, TradeEvent};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub initial_capital: f64,
    /// Fraction of the current holding sold per trim.
    pub trim_fraction: f64,
    /// After a threshold trim the cost basis becomes `price * markup`.
    pub cost_basis_markup: f64,
    pub costs: CostModel,
    /// Relative tolerance of the daily reconciliation check.
    pub reconciliation_tolerance: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            trim_fraction: 0.20,
            cost_basis_markup: 1.05,
            costs: CostModel::frictionless(),
            reconciliation_tolerance: 1e-6,
        }
    }
}

/// Errors that abort a single simulation run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("invalid simulation config: {0}")]
    InvalidConfig(String),
    #[error("{weights} target weights for {tickers} tickers")]
    WeightsMismatch { weights: usize, tickers: usize },
    /// Simulator logic produced an impossible state. Never a data condition.
    #[error("invariant violated on {date} (day {day}): {detail}")]
    InvariantViolation {
        day: usize,
        date: NaiveDate,
        detail: String,
    },
}

/// End-of-day record of holdings and cash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub day: usize,
    pub date: NaiveDate,
    /// Shares per ticker, indexed by `TickerId`.
    pub holdings: Vec<f64>,
    pub cash: f64,
    pub total_value: f64,
}

/// Everything a simulation run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub snapshots: Vec<DailySnapshot>,
    pub trades: Vec<TradeEvent>,
    pub reinvestments: Vec<ReinvestmentEvent>,
    /// Sell and buy side.
    pub total_transaction_costs: f64,
    pub total_capital_gains_tax: f64,
}

impl SimulationOutcome {
    /// Total portfolio value per day.
    pub fn value_series(&self) -> Vec<f64> {
        self.snapshots.iter().map(|s| s.total_value).collect()
    }

    pub fn final_value(&self) -> f64 {
        self.snapshots.last().map_or(0.0, |s| s.total_value)
    }

    /// Uninvested cash on the last day.
    pub fn final_cash(&self) -> f64 {
        self.snapshots.last().map_or(0.0, |s| s.cash)
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    pub fn total_costs_and_taxes(&self) -> f64 {
        self.total_transaction_costs + self.total_capital_gains_tax
    }
}
