//! Append-only simulation event records.

use super::ticker::Ticker;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One executed trim. Never mutated after the simulator records it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub day: usize,
    pub date: NaiveDate,
    pub ticker: Ticker,
    pub shares_sold: f64,
    pub price: f64,
    pub gross_proceeds: f64,
    pub transaction_cost: f64,
    pub capital_gains_tax: f64,
    pub net_proceeds: f64,
    /// `(price - cost_basis) / cost_basis` at the moment of the trim.
    pub realized_gain_fraction: f64,
}

impl TradeEvent {
    /// `gross - cost - tax`, recomputed from the stored components.
    pub fn recomputed_net(&self) -> f64 {
        self.gross_proceeds - self.transaction_cost - self.capital_gains_tax
    }
}

/// Why a reinvestment happened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReinvestmentTrigger {
    /// Proceeds redeployed on the day of the trim.
    Immediate,
    /// Scheduled partial release of a queue.
    Scheduled { fraction: f64 },
    /// Whole queue released because volatility normalised.
    VolatilityNormalized,
    /// Partial release gated on volatility being below its recent average.
    VolatilityGated { fraction: f64 },
    /// Reference ticker fell `drop` (fraction) from its running high.
    Dip { drop: f64 },
}

impl ReinvestmentTrigger {
    pub fn label(&self) -> String {
        match self {
            Self::Immediate => "immediate".to_string(),
            Self::Scheduled { fraction } => format!("scheduled {:.0}%", fraction * 100.0),
            Self::VolatilityNormalized => "volatility normalized".to_string(),
            Self::VolatilityGated { fraction } => {
                format!("volatility gated {:.0}%", fraction * 100.0)
            }
            Self::Dip { drop } => format!("dip {:.2}%", drop * 100.0),
        }
    }
}

/// Capital moved from proceeds or a queue into one or more tickers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReinvestmentEvent {
    pub day: usize,
    pub date: NaiveDate,
    /// Destination tickers with the dollar amount each received before costs.
    pub allocations: Vec<(Ticker, f64)>,
    /// Total amount drawn, before the buy-side transaction cost.
    pub amount: f64,
    pub transaction_cost: f64,
    pub trigger: ReinvestmentTrigger,
}

impl ReinvestmentEvent {
    pub fn invested(&self) -> f64 {
        self.amount - self.transaction_cost
    }

    pub fn destinations(&self) -> String {
        self.allocations
            .iter()
            .map(|(t, _)| t.as_str())
            .collect::<Vec<_>>()
            .join("|")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_labels() {
        assert_eq!(ReinvestmentTrigger::Immediate.label(), "immediate");
        assert_eq!(
            ReinvestmentTrigger::Scheduled { fraction: 0.25 }.label(),
            "scheduled 25%"
        );
        assert_eq!(ReinvestmentTrigger::Dip { drop: 0.06 }.label(), "dip 6.00%");
    }

    #[test]
    fn trigger_serializes_tagged() {
        let json = serde_json::to_string(&ReinvestmentTrigger::Dip { drop: 0.05 }).unwrap();
        assert_eq!(json, r#"{"kind":"dip","drop":0.05}"#);
    }

    #[test]
    fn reinvestment_destinations_joined() {
        let ev = ReinvestmentEvent {
            day: 3,
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            allocations: vec![
                (Ticker::parse("SPY").unwrap(), 60.0),
                (Ticker::parse("QQQ").unwrap(), 40.0),
            ],
            amount: 100.0,
            transaction_cost: 1.0,
            trigger: ReinvestmentTrigger::Immediate,
        };
        assert_eq!(ev.destinations(), "SPY|QQQ");
        assert_eq!(ev.invested(), 99.0);
    }
}
