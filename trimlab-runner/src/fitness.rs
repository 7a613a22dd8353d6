//! Ranking metric: configurable selector for sorting the comparison table.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::result::StrategyResult;

/// Which metric to sort the comparison table by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessMetric {
    #[default]
    FinalValue,
    TotalReturn,
    Cagr,
    Sharpe,
    Sortino,
    MaxDrawdown,
    Volatility,
    RollingCagrMean,
}

impl FitnessMetric {
    /// Extract the relevant metric value from a result. Missing rolling
    /// statistics rank last.
    pub fn extract(&self, result: &StrategyResult) -> f64 {
        match self {
            Self::FinalValue => result.final_value,
            Self::TotalReturn => result.total_return,
            Self::Cagr => result.cagr,
            Self::Sharpe => result.sharpe,
            Self::Sortino => result.sortino,
            Self::MaxDrawdown => result.max_drawdown,
            Self::Volatility => result.volatility,
            Self::RollingCagrMean => result
                .rolling
                .as_ref()
                .map_or(f64::NEG_INFINITY, |r| r.cagr_mean),
        }
    }

    /// Whether higher values are better for this metric.
    ///
    /// MaxDrawdown is negative, so less negative (higher) is better too.
    /// Volatility: lower is better.
    pub fn is_higher_better(&self) -> bool {
        !matches!(self, Self::Volatility)
    }

    /// Returns true if `a` is strictly better than `b`.
    pub fn is_better(&self, a: f64, b: f64) -> bool {
        if self.is_higher_better() {
            a > b
        } else {
            a < b
        }
    }

    /// Best-first ordering of two results; ties keep the input order when
    /// used with a stable sort.
    pub fn compare(&self, a: &StrategyResult, b: &StrategyResult) -> Ordering {
        let (x, y) = (self.extract(a), self.extract(b));
        let ord = y.total_cmp(&x);
        if self.is_higher_better() {
            ord
        } else {
            ord.reverse()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trimlab_core::fingerprint::StrategyVariant;

    fn result(final_value: f64, volatility: f64) -> StrategyResult {
        StrategyResult {
            schema_version: 1,
            name: "Buy-and-Hold".into(),
            slug: "buy_and_hold".into(),
            variant: StrategyVariant::buy_and_hold(),
            final_value,
            total_return: final_value / 100_000.0 - 1.0,
            cagr: 0.1,
            sharpe: 1.5,
            sortino: 2.0,
            max_drawdown: -0.10,
            volatility,
            rolling: None,
            bootstrap: None,
            trade_count: 0,
            reinvestment_count: 0,
            dip_buy_count: 0,
            avg_dip_size: 0.0,
            total_transaction_costs: 0.0,
            total_capital_gains_tax: 0.0,
            total_costs_and_taxes: 0.0,
            cash_held: 0.0,
            clipped_returns: 0,
            warnings: vec![],
        }
    }

    #[test]
    fn extract_values() {
        let r = result(150_000.0, 0.2);
        assert_eq!(FitnessMetric::FinalValue.extract(&r), 150_000.0);
        assert!((FitnessMetric::MaxDrawdown.extract(&r) - (-0.10)).abs() < 1e-10);
        assert_eq!(FitnessMetric::RollingCagrMean.extract(&r), f64::NEG_INFINITY);
    }

    #[test]
    fn default_is_final_value() {
        assert_eq!(FitnessMetric::default(), FitnessMetric::FinalValue);
    }

    #[test]
    fn is_better_direction() {
        assert!(FitnessMetric::Sharpe.is_better(2.0, 1.5));
        assert!(FitnessMetric::MaxDrawdown.is_better(-0.05, -0.20));
        assert!(FitnessMetric::Volatility.is_better(0.1, 0.2));
    }

    #[test]
    fn sorts_best_first() {
        let mut rows = vec![result(1.0, 0.3), result(3.0, 0.1), result(2.0, 0.2)];
        rows.sort_by(|a, b| FitnessMetric::FinalValue.compare(a, b));
        let order: Vec<f64> = rows.iter().map(|r| r.final_value).collect();
        assert_eq!(order, vec![3.0, 2.0, 1.0]);

        rows.sort_by(|a, b| FitnessMetric::Volatility.compare(a, b));
        let order: Vec<f64> = rows.iter().map(|r| r.volatility).collect();
        assert_eq!(order, vec![0.1, 0.2, 0.3]);
    }
}
