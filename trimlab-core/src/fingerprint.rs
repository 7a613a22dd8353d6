//! Strategy variant identity and run fingerprinting.
//!
//! - `TrimPolicy` / `ReinvestmentMode`: serializable descriptions of the two
//!   halves of a strategy variant. The factory turns them into trait objects.
//! - `StrategyVariant`: one grid cell, with its human-readable name and slug.
//! - `DatasetHash` / `ConfigHash` / `RunFingerprint`: BLAKE3 identities so a
//!   result set can be traced back to the exact data and configuration.

use crate::components::reinvest::drip::DripParams;
use crate::components::reinvest::yield_volatility::YieldVolatilityParams;
use crate::domain::PriceTable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Trim policy ─────────────────────────────────────────────────────

/// Which trigger decides when to trim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrimPolicy {
    /// Never trims. The baseline.
    BuyAndHold,
    /// Trim at `threshold` unrealized gain over the cost basis.
    Threshold { threshold: f64 },
    /// Trim when price > `multiplier` x moving average and momentum < 0.
    Momentum { multiplier: f64 },
    /// Trim on a volatility regime with hysteresis and cooldown.
    Volatility {
        entry: f64,
        hysteresis: f64,
        cooldown_days: usize,
    },
}

impl TrimPolicy {
    pub fn is_buy_and_hold(&self) -> bool {
        matches!(self, Self::BuyAndHold)
    }
}

// ─── Reinvestment mode ───────────────────────────────────────────────

/// Where trim proceeds go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReinvestmentMode {
    Cash,
    ProRata,
    SingleTarget {
        ticker: String,
    },
    Drip {
        reference: String,
        params: DripParams,
    },
    DipBuy {
        reference: String,
        drop_threshold: f64,
        targets: Vec<String>,
    },
    YieldVolatility {
        target: String,
        reference: String,
        params: YieldVolatilityParams,
    },
}

impl ReinvestmentMode {
    /// Label used inside strategy names.
    pub fn label(&self) -> String {
        match self {
            Self::Cash => "cash".into(),
            Self::ProRata => "pro-rata".into(),
            Self::SingleTarget { ticker } => ticker.trim().to_ascii_lowercase(),
            Self::Drip { .. } => "drip".into(),
            Self::DipBuy { .. } => "dip-buy".into(),
            Self::YieldVolatility { .. } => "yield-volatility".into(),
        }
    }
}

// ─── Strategy variant ────────────────────────────────────────────────

/// One cell of the strategy grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyVariant {
    pub trim: TrimPolicy,
    pub reinvestment: ReinvestmentMode,
}

impl StrategyVariant {
    pub fn buy_and_hold() -> Self {
        Self {
            trim: TrimPolicy::BuyAndHold,
            reinvestment: ReinvestmentMode::Cash,
        }
    }

    /// Human-readable name, e.g. `"Trim@+100% (pro-rata)"`.
    ///
    /// Every trigger parameter that varies across a grid appears in the name,
    /// so distinct grid cells get distinct names and slugs.
    pub fn name(&self) -> String {
        let mode = self.reinvestment.label();
        match &self.trim {
            TrimPolicy::BuyAndHold => "Buy-and-Hold".to_string(),
            TrimPolicy::Threshold { threshold } => {
                format!("Trim@+{}% ({mode})", compact_decimal(threshold * 100.0, 0))
            }
            TrimPolicy::Momentum { multiplier } => {
                format!("Momentum-Guided-{}x ({mode})", compact_decimal(*multiplier, 1))
            }
            TrimPolicy::Volatility { entry, .. } => {
                format!("Volatility-{}x ({mode})", compact_decimal(*entry, 1))
            }
        }
    }

    /// File-system friendly form of the name, e.g. `trim_100pct_pro_rata`.
    pub fn slug(&self) -> String {
        slugify(&self.name())
    }

    /// Exact identity of the variant (all parameters).
    pub fn full_hash(&self) -> ConfigHash {
        let json = serde_json::to_string(self).expect("StrategyVariant must serialize");
        ConfigHash::from_bytes(json.as_bytes())
    }
}

impl fmt::Display for StrategyVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Fixed six-decimal rendering with trailing zeros trimmed down to
/// `min_decimals`: `50.0 → "50"`, `10.1 → "10.1"`, `(2.0, 1) → "2.0"`.
fn compact_decimal(value: f64, min_decimals: usize) -> String {
    let full = format!("{value:.6}");
    let Some(dot) = full.find('.') else {
        return full;
    };
    let keep = full.trim_end_matches('0').len().max(dot + 1 + min_decimals);
    let out = &full[..keep];
    out.strip_suffix('.').unwrap_or(out).to_string()
}

/// Lower-case, `%` → `pct`, every other non-alphanumeric run → `_`.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.replace('%', "pct").chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

// ─── Hashes ──────────────────────────────────────────────────────────

/// BLAKE3 hex digest of a canonical configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl ConfigHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// BLAKE3 hex digest of a price table's dates, tickers and prices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    /// Tickers are hashed in sorted order so column order does not matter.
    pub fn of_table(table: &PriceTable) -> Self {
        let mut hasher = blake3::Hasher::new();
        for date in table.dates() {
            hasher.update(date.to_string().as_bytes());
        }
        let mut ids: Vec<_> = table.ticker_ids().collect();
        ids.sort_by(|a, b| table.ticker(*a).cmp(table.ticker(*b)));
        for id in ids {
            hasher.update(table.ticker(id).as_str().as_bytes());
            for price in table.column(id) {
                hasher.update(&price.to_le_bytes());
            }
        }
        Self(hasher.finalize().to_hex().to_string())
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Complete identity of one backtest run: configuration, data and seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFingerprint {
    pub run_id: String,
    pub config_hash: ConfigHash,
    pub dataset_hash: DatasetHash,
    pub seed: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub tickers: Vec<String>,
    pub initial_capital: f64,
}

impl RunFingerprint {
    pub fn new(
        config_hash: ConfigHash,
        dataset_hash: DatasetHash,
        seed: u64,
        table: &PriceTable,
        initial_capital: f64,
    ) -> Self {
        let run_id = blake3::hash(
            format!("{}:{}:{seed}", config_hash.0, dataset_hash.0).as_bytes(),
        )
        .to_hex()
        .to_string();
        let dates = table.dates();
        Self {
            run_id,
            config_hash,
            dataset_hash,
            seed,
            start_date: dates[0],
            end_date: dates[dates.len() - 1],
            tickers: table.tickers().iter().map(|t| t.to_string()).collect(),
            initial_capital,
        }
    }
}
