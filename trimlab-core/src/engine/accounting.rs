//! Trim proceeds and the daily reconciliation identity.

use serde::{Deserialize, Serialize};

/// Frictions applied to every sell and buy. A zero rate disables the charge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Fraction of traded notional, charged on both sides.
    pub transaction_cost_rate: f64,
    /// Fraction of realized gains; losses are never taxed.
    pub capital_gains_tax_rate: f64,
}

impl CostModel {
    pub fn frictionless() -> Self {
        Self {
            transaction_cost_rate: 0.0,
            capital_gains_tax_rate: 0.0,
        }
    }

    pub fn buy_cost(&self, amount: f64) -> f64 {
        amount * self.transaction_cost_rate
    }
}

/// The money side of one trim.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimProceeds {
    pub shares: f64,
    pub gross: f64,
    pub transaction_cost: f64,
    pub capital_gains_tax: f64,
    pub net: f64,
}

impl TrimProceeds {
    /// Sell `shares` at `price` against a per-share `cost_basis`.
    ///
    /// gain = (gross - cost) - shares * basis; tax = max(0, gain * rate);
    /// net = gross - cost - tax.
    pub fn compute(shares: f64, price: f64, cost_basis: f64, costs: &CostModel) -> Self {
        let gross = shares * price;
        let transaction_cost = gross * costs.transaction_cost_rate;
        let after_cost = gross - transaction_cost;
        let gain = after_cost - shares * cost_basis;
        let capital_gains_tax = (gain * costs.capital_gains_tax_rate).max(0.0);
        Self {
            shares,
            gross,
            transaction_cost,
            capital_gains_tax,
            net: after_cost - capital_gains_tax,
        }
    }

    pub fn frictions(&self) -> f64 {
        self.transaction_cost + self.capital_gains_tax
    }
}

/// Check `closing == opening - frictions` within a relative tolerance.
///
/// `opening` and `closing` are total values (holdings at market plus cash)
/// at the same day's prices, before and after that day's actions.
pub fn verify_reconciliation(
    opening: f64,
    frictions: f64,
    closing: f64,
    tolerance: f64,
) -> Result<(), String> {
    let expected = opening - frictions;
    let diff = (closing - expected).abs();
    if !closing.is_finite() || diff > tolerance * expected.abs().max(1.0) {
        return Err(format!(
            "portfolio value {closing} does not reconcile with {opening} - {frictions} = {expected} (diff {diff})"
        ));
    }
    Ok(())
}
