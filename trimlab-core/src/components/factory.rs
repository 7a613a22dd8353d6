//! Factory: turns `TrimPolicy` / `ReinvestmentMode` descriptions into the
//! trait objects the simulator drives, resolving ticker symbols against the
//! price table once.

use crate::domain::{PriceTable, TickerId};
use crate::fingerprint::{ReinvestmentMode, TrimPolicy};

use super::reinvest::{
    DipBuy, Drip, HoldCash, ProRata, ReinvestmentPolicy, SingleTarget, YieldVolatility,
};
use super::trigger::{
    BuyAndHold, MomentumTrigger, ThresholdTrigger, TrimTrigger, VolatilityTrigger,
};

// ─── Error type ──────────────────────────────────────────────────────

/// Errors from building a policy for a specific price table.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error("{mode} references ticker {ticker}, which is not in the price table")]
    UnknownTicker { mode: String, ticker: String },
    #[error("{mode} has no usable targets in the price table")]
    NoTargets { mode: String },
    #[error("invalid parameter {name}={value} for {policy}")]
    InvalidParameter {
        policy: String,
        name: &'static str,
        value: f64,
    },
}

fn resolve(table: &PriceTable, mode: &str, symbol: &str) -> Result<TickerId, PolicyError> {
    table.ticker_id(symbol).ok_or_else(|| PolicyError::UnknownTicker {
        mode: mode.to_string(),
        ticker: symbol.to_string(),
    })
}

fn require(policy: &str, name: &'static str, value: f64, ok: bool) -> Result<(), PolicyError> {
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(PolicyError::InvalidParameter {
            policy: policy.to_string(),
            name,
            value,
        })
    }
}

// ─── Trigger factory ─────────────────────────────────────────────────

/// Create a trim trigger from its description.
pub fn create_trigger(policy: &TrimPolicy) -> Result<Box<dyn TrimTrigger>, PolicyError> {
    match *policy {
        TrimPolicy::BuyAndHold => Ok(Box::new(BuyAndHold)),
        TrimPolicy::Threshold { threshold } => {
            require("threshold", "threshold", threshold, threshold > 0.0)?;
            Ok(Box::new(ThresholdTrigger::new(threshold)))
        }
        TrimPolicy::Momentum { multiplier } => {
            require("momentum", "multiplier", multiplier, multiplier > 0.0)?;
            Ok(Box::new(MomentumTrigger::new(multiplier)))
        }
        TrimPolicy::Volatility {
            entry,
            hysteresis,
            cooldown_days,
        } => {
            require("volatility", "entry", entry, entry > 0.0)?;
            require(
                "volatility",
                "hysteresis",
                hysteresis,
                hysteresis > 0.0 && hysteresis <= 1.0,
            )?;
            Ok(Box::new(VolatilityTrigger::new(entry, hysteresis, cooldown_days)))
        }
    }
}

// ─── Reinvestment factory ────────────────────────────────────────────

/// Create a fresh reinvestment policy bound to `table`.
///
/// Dip-buy targets missing from the table are skipped (reported in the
/// returned warnings); every other missing ticker is an error.
pub fn create_reinvestment(
    mode: &ReinvestmentMode,
    table: &PriceTable,
) -> Result<(Box<dyn ReinvestmentPolicy>, Vec<String>), PolicyError> {
    let label = mode.label();
    let mut warnings = Vec::new();
    let policy: Box<dyn ReinvestmentPolicy> = match mode {
        ReinvestmentMode::Cash => Box::new(HoldCash),
        ReinvestmentMode::ProRata => Box::new(ProRata),
        ReinvestmentMode::SingleTarget { ticker } => {
            Box::new(SingleTarget::new(resolve(table, &label, ticker)?, label.clone()))
        }
        ReinvestmentMode::Drip { reference, params } => {
            require(
                "drip",
                "release_fraction",
                params.release_fraction,
                params.release_fraction > 0.0 && params.release_fraction <= 1.0,
            )?;
            require(
                "drip",
                "interval_days",
                params.interval_days as f64,
                params.interval_days >= 1,
            )?;
            Box::new(Drip::new(resolve(table, &label, reference)?, *params))
        }
        ReinvestmentMode::DipBuy {
            reference,
            drop_threshold,
            targets,
        } => {
            require(
                "dip-buy",
                "drop_threshold",
                *drop_threshold,
                *drop_threshold > 0.0 && *drop_threshold < 1.0,
            )?;
            let reference = resolve(table, &label, reference)?;
            let mut ids = Vec::with_capacity(targets.len());
            for symbol in targets {
                match table.ticker_id(symbol) {
                    Some(id) => ids.push(id),
                    None => warnings.push(format!(
                        "dip-buy target {symbol} not in price table; skipped"
                    )),
                }
            }
            if ids.is_empty() {
                return Err(PolicyError::NoTargets { mode: label });
            }
            Box::new(DipBuy::new(reference, *drop_threshold, ids))
        }
        ReinvestmentMode::YieldVolatility {
            target,
            reference,
            params,
        } => {
            require(
                "yield-volatility",
                "release_fraction",
                params.release_fraction,
                params.release_fraction > 0.0 && params.release_fraction <= 1.0,
            )?;
            Box::new(YieldVolatility::new(
                resolve(table, &label, target)?,
                resolve(table, &label, reference)?,
                *params,
            ))
        }
    };
    Ok((policy, warnings))
}
