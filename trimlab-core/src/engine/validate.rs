//! Independent re-check of a finished run.
//!
//! Recomputes everything derivable from the outcome's own records rather
//! than trusting the loop's running totals: each day's value from holdings,
//! cash and prices; each trade's proceeds identity; the tax floor; and the
//! CAGR of the value series straight from its endpoints.

use super::state::SimulationOutcome;
use crate::domain::PriceTable;
use crate::indicators::TRADING_DAYS_PER_YEAR;
use serde::{Deserialize, Serialize};

/// One discrepancy found by `validate_run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub day: Option<usize>,
    pub check: String,
    pub detail: String,
}

/// `(final/initial)^(252/num_days) - 1`, with `num_days` the series length.
pub fn direct_cagr(initial: f64, values: &[f64]) -> f64 {
    match values.last() {
        Some(&last) if initial > 0.0 && last > 0.0 => {
            let years = values.len() as f64 / TRADING_DAYS_PER_YEAR as f64;
            (last / initial).powf(1.0 / years) - 1.0
        }
        _ => 0.0,
    }
}

/// Validate `outcome` against `table`. An empty result means the run is
/// internally consistent. `reported_cagr`, when given, is compared with the
/// CAGR recomputed from the value series.
pub fn validate_run(
    table: &PriceTable,
    outcome: &SimulationOutcome,
    initial_capital: f64,
    reported_cagr: Option<f64>,
    tolerance: f64,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut push = |day: Option<usize>, check: &str, detail: String| {
        findings.push(Finding {
            day,
            check: check.to_string(),
            detail,
        })
    };

    if outcome.snapshots.len() != table.len() {
        push(
            None,
            "snapshot_count",
            format!("{} snapshots for {} days", outcome.snapshots.len(), table.len()),
        );
    }

    for snap in &outcome.snapshots {
        if snap.day >= table.len() {
            push(Some(snap.day), "snapshot_day", "day outside price table".into());
            continue;
        }
        let prices = table.day_closes(snap.day);
        let invested: f64 = snap.holdings.iter().zip(&prices).map(|(h, p)| h * p).sum();
        let expected = invested + snap.cash;
        if (expected - snap.total_value).abs() > tolerance * expected.abs().max(1.0) {
            push(
                Some(snap.day),
                "value_reconciliation",
                format!("recorded {} vs recomputed {}", snap.total_value, expected),
            );
        }
        if snap.holdings.iter().any(|h| *h < 0.0) || snap.cash < 0.0 {
            push(Some(snap.day), "non_negative", "negative holding or cash".into());
        }
    }

    for trade in &outcome.trades {
        let net = trade.recomputed_net();
        if (net - trade.net_proceeds).abs() > tolerance * trade.gross_proceeds.abs().max(1.0) {
            push(
                Some(trade.day),
                "proceeds_identity",
                format!("{}: net {} vs gross-cost-tax {}", trade.ticker, trade.net_proceeds, net),
            );
        }
        if trade.capital_gains_tax < 0.0 {
            push(
                Some(trade.day),
                "tax_non_negative",
                format!("{}: tax {}", trade.ticker, trade.capital_gains_tax),
            );
        }
    }

    if let Some(reported) = reported_cagr {
        let direct = direct_cagr(initial_capital, &outcome.value_series());
        if (direct - reported).abs() > 1e-9 {
            push(
                None,
                "cagr",
                format!("reported {reported} vs direct {direct}"),
            );
        }
    }

    findings
}
