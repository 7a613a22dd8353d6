//! Serializable backtest configuration, loaded from TOML.
//!
//! Every section has defaults matching the reference study, so an empty file
//! (or no file) is a valid configuration. `validate` runs after parsing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;
use trimlab_core::components::reinvest::drip::DripParams;
use trimlab_core::components::reinvest::yield_volatility::YieldVolatilityParams;
use trimlab_core::domain::Ticker;
use trimlab_core::engine::{CostModel, SimulationConfig};
use trimlab_core::fingerprint::{ConfigHash, ReinvestmentMode, StrategyVariant, TrimPolicy};
use trimlab_core::indicators::IndicatorWindows;

use crate::bootstrap::BootstrapConfig;
use crate::fitness::FitnessMetric;

// ─── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cannot serialize config: {0}")]
    Serialize(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

// ─── Sections ────────────────────────────────────────────────────────

/// `[backtest]`: capital, date range, trim size and frictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub initial_capital: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub trim_fraction: f64,
    pub cost_basis_markup: f64,
    pub transaction_cost_rate: f64,
    pub capital_gains_tax_rate: f64,
    /// Minimum fraction of dates a ticker must cover to stay in the run.
    pub min_coverage: f64,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            start_date: date(2015, 1, 1),
            end_date: date(2024, 11, 5),
            trim_fraction: 0.20,
            cost_basis_markup: 1.05,
            transaction_cost_rate: 0.0,
            capital_gains_tax_rate: 0.0,
            min_coverage: 0.95,
        }
    }
}

/// `[portfolio]`: target weight per ticker. Weights need not sum to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioSection {
    pub weights: BTreeMap<String, f64>,
}

impl Default for PortfolioSection {
    fn default() -> Self {
        let weights = [
            ("SPY", 0.30),
            ("QQQ", 0.20),
            ("VOO", 0.10),
            ("AAPL", 0.15),
            ("MSFT", 0.15),
            ("TSLA", 0.10),
        ]
        .into_iter()
        .map(|(t, w)| (t.to_string(), w))
        .collect();
        Self { weights }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerFamily {
    Threshold,
    Momentum,
    Volatility,
}

/// `[triggers]`: which trigger families to test and their parameter lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerGrid {
    pub families: Vec<TriggerFamily>,
    pub thresholds: Vec<f64>,
    pub momentum_multipliers: Vec<f64>,
    pub volatility_entries: Vec<f64>,
    pub hysteresis: f64,
    pub cooldown_days: usize,
}

impl Default for TriggerGrid {
    fn default() -> Self {
        Self {
            families: vec![
                TriggerFamily::Threshold,
                TriggerFamily::Momentum,
                TriggerFamily::Volatility,
            ],
            thresholds: vec![0.5, 1.0, 1.5],
            momentum_multipliers: vec![1.3],
            volatility_entries: vec![1.5, 2.0, 2.5],
            hysteresis: 0.9,
            cooldown_days: 10,
        }
    }
}

impl TriggerGrid {
    /// Every trigger configuration in family order.
    pub fn policies(&self) -> Vec<TrimPolicy> {
        self.families
            .iter()
            .flat_map(|family| -> Vec<TrimPolicy> {
                match family {
                    TriggerFamily::Threshold => self
                        .thresholds
                        .iter()
                        .map(|&threshold| TrimPolicy::Threshold { threshold })
                        .collect(),
                    TriggerFamily::Momentum => self
                        .momentum_multipliers
                        .iter()
                        .map(|&multiplier| TrimPolicy::Momentum { multiplier })
                        .collect(),
                    TriggerFamily::Volatility => self
                        .volatility_entries
                        .iter()
                        .map(|&entry| TrimPolicy::Volatility {
                            entry,
                            hysteresis: self.hysteresis,
                            cooldown_days: self.cooldown_days,
                        })
                        .collect(),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    Cash,
    ProRata,
    SingleTarget,
    Drip,
    DipBuy,
    YieldVolatility,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DripSettings {
    pub reference: String,
    pub params: DripParams,
}

impl Default for DripSettings {
    fn default() -> Self {
        Self {
            reference: "SPY".into(),
            params: DripParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DipBuySettings {
    pub reference: String,
    pub drop_threshold: f64,
    pub targets: Vec<String>,
}

impl Default for DipBuySettings {
    fn default() -> Self {
        Self {
            reference: "SPY".into(),
            drop_threshold: 0.05,
            targets: vec!["SPY".into(), "QQQ".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YieldVolatilitySettings {
    pub target: String,
    pub reference: String,
    pub params: YieldVolatilityParams,
}

impl Default for YieldVolatilitySettings {
    fn default() -> Self {
        Self {
            target: "SPY".into(),
            reference: "SPY".into(),
            params: YieldVolatilityParams::default(),
        }
    }
}

/// `[reinvestment]`: modes to test and the parameters of each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReinvestmentGrid {
    pub modes: Vec<ModeKind>,
    pub single_target: String,
    pub drip: DripSettings,
    pub dip_buy: DipBuySettings,
    pub yield_volatility: YieldVolatilitySettings,
}

impl Default for ReinvestmentGrid {
    fn default() -> Self {
        Self {
            modes: vec![
                ModeKind::ProRata,
                ModeKind::SingleTarget,
                ModeKind::Cash,
                ModeKind::DipBuy,
                ModeKind::Drip,
                ModeKind::YieldVolatility,
            ],
            single_target: "SPY".into(),
            drip: DripSettings::default(),
            dip_buy: DipBuySettings::default(),
            yield_volatility: YieldVolatilitySettings::default(),
        }
    }
}

impl ReinvestmentGrid {
    /// Every configured mode, fully parameterised.
    pub fn modes(&self) -> Vec<ReinvestmentMode> {
        self.modes
            .iter()
            .map(|kind| match kind {
                ModeKind::Cash => ReinvestmentMode::Cash,
                ModeKind::ProRata => ReinvestmentMode::ProRata,
                ModeKind::SingleTarget => ReinvestmentMode::SingleTarget {
                    ticker: self.single_target.clone(),
                },
                ModeKind::Drip => ReinvestmentMode::Drip {
                    reference: self.drip.reference.clone(),
                    params: self.drip.params,
                },
                ModeKind::DipBuy => ReinvestmentMode::DipBuy {
                    reference: self.dip_buy.reference.clone(),
                    drop_threshold: self.dip_buy.drop_threshold,
                    targets: self.dip_buy.targets.clone(),
                },
                ModeKind::YieldVolatility => ReinvestmentMode::YieldVolatility {
                    target: self.yield_volatility.target.clone(),
                    reference: self.yield_volatility.reference.clone(),
                    params: self.yield_volatility.params,
                },
            })
            .collect()
    }

    fn referenced_tickers(&self) -> Vec<&str> {
        let mut out = vec![
            self.single_target.as_str(),
            self.drip.reference.as_str(),
            self.dip_buy.reference.as_str(),
            self.yield_volatility.target.as_str(),
            self.yield_volatility.reference.as_str(),
        ];
        out.extend(self.dip_buy.targets.iter().map(String::as_str));
        out
    }
}

/// `[metrics]`: bootstrap, rolling window and return clipping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSection {
    pub bootstrap_iterations: usize,
    pub confidence: f64,
    pub seed: u64,
    pub rolling_window: usize,
    pub return_clip: f64,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            bootstrap_iterations: 1000,
            confidence: 0.95,
            seed: 42,
            rolling_window: 756,
            return_clip: 0.5,
        }
    }
}

impl MetricsSection {
    pub fn bootstrap_config(&self) -> BootstrapConfig {
        BootstrapConfig {
            iterations: self.bootstrap_iterations,
            confidence: self.confidence,
            seed: self.seed,
        }
    }
}

/// `[grid]`: ranking and execution of the variant grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSection {
    pub ranking: FitnessMetric,
    pub parallel: bool,
    pub include_buy_and_hold: bool,
}

impl Default for GridSection {
    fn default() -> Self {
        Self {
            ranking: FitnessMetric::FinalValue,
            parallel: true,
            include_buy_and_hold: true,
        }
    }
}

// ─── Top level ───────────────────────────────────────────────────────

/// Everything needed to reproduce a grid run, apart from the price data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub portfolio: PortfolioSection,
    pub indicators: IndicatorWindows,
    pub triggers: TriggerGrid,
    pub reinvestment: ReinvestmentGrid,
    pub metrics: MetricsSection,
    pub grid: GridSection,
}

impl BacktestConfig {
    /// Load and validate a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// BLAKE3 over the canonical JSON form of the configuration.
    pub fn config_hash(&self) -> Result<ConfigHash, ConfigError> {
        let json = serde_json::to_vec(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(ConfigHash::from_bytes(&json))
    }

    /// Configured tickers, in sorted order.
    pub fn tickers(&self) -> Vec<String> {
        self.portfolio.weights.keys().cloned().collect()
    }

    pub fn simulation_config(&self) -> SimulationConfig {
        let b = &self.backtest;
        SimulationConfig {
            initial_capital: b.initial_capital,
            trim_fraction: b.trim_fraction,
            cost_basis_markup: b.cost_basis_markup,
            costs: CostModel {
                transaction_cost_rate: b.transaction_cost_rate,
                capital_gains_tax_rate: b.capital_gains_tax_rate,
            },
            ..SimulationConfig::default()
        }
    }

    /// Check ranges and cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.backtest;
        let unit = |v: f64| (0.0..1.0).contains(&v);
        let checks: [(bool, String); 9] = [
            (
                b.initial_capital.is_finite() && b.initial_capital > 0.0,
                format!("initial_capital {} must be positive", b.initial_capital),
            ),
            (
                b.start_date < b.end_date,
                format!("start_date {} must precede end_date {}", b.start_date, b.end_date),
            ),
            (
                b.trim_fraction > 0.0 && b.trim_fraction < 1.0,
                format!("trim_fraction {} must be in (0, 1)", b.trim_fraction),
            ),
            (
                b.cost_basis_markup.is_finite() && b.cost_basis_markup > 0.0,
                format!("cost_basis_markup {} must be positive", b.cost_basis_markup),
            ),
            (
                unit(b.transaction_cost_rate) && unit(b.capital_gains_tax_rate),
                "cost and tax rates must be in [0, 1)".to_string(),
            ),
            (
                b.min_coverage > 0.0 && b.min_coverage <= 1.0,
                format!("min_coverage {} must be in (0, 1]", b.min_coverage),
            ),
            (
                self.metrics.bootstrap_iterations > 0
                    && self.metrics.confidence > 0.0
                    && self.metrics.confidence < 1.0,
                "bootstrap needs iterations > 0 and confidence in (0, 1)".to_string(),
            ),
            (
                self.metrics.rolling_window > 0 && self.metrics.return_clip > 0.0,
                "rolling_window and return_clip must be positive".to_string(),
            ),
            (
                (!self.triggers.policies().is_empty() && !self.reinvestment.modes.is_empty())
                    || self.grid.include_buy_and_hold,
                "the grid is empty: configure triggers and modes or include buy-and-hold"
                    .to_string(),
            ),
        ];
        if let Some((_, message)) = checks.into_iter().find(|(ok, _)| !ok) {
            return Err(ConfigError::Invalid(message));
        }

        self.validate_weights()?;
        self.validate_indicators()?;
        self.validate_grid()?;
        self.validate_unique_names()
    }

    fn validate_indicators(&self) -> Result<(), ConfigError> {
        let w = &self.indicators;
        let checks = [
            ("moving_average", w.moving_average, 1),
            ("momentum", w.momentum, 1),
            ("volatility", w.volatility, 2),
            ("volatility_median", w.volatility_median, 1),
        ];
        for (name, window, min) in checks {
            if window < min {
                return Err(ConfigError::Invalid(format!(
                    "indicators.{name} = {window} must be at least {min}"
                )));
            }
        }
        Ok(())
    }

    /// Variant slugs key the persisted artefacts, so two grid cells must
    /// never share one.
    fn validate_unique_names(&self) -> Result<(), ConfigError> {
        let modes = self.reinvestment.modes();
        let mut seen = BTreeSet::new();
        if self.grid.include_buy_and_hold {
            seen.insert(StrategyVariant::buy_and_hold().slug());
        }
        for trim in self.triggers.policies() {
            for reinvestment in &modes {
                let variant = StrategyVariant {
                    trim: trim.clone(),
                    reinvestment: reinvestment.clone(),
                };
                if !seen.insert(variant.slug()) {
                    return Err(ConfigError::Invalid(format!(
                        "grid contains duplicate strategy \"{}\"",
                        variant.name()
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_weights(&self) -> Result<(), ConfigError> {
        let weights = &self.portfolio.weights;
        if weights.is_empty() {
            return Err(ConfigError::Invalid("portfolio.weights is empty".into()));
        }
        for (ticker, &w) in weights {
            Ticker::parse(ticker)
                .map_err(|e| ConfigError::Invalid(format!("portfolio.weights: {e}")))?;
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "weight {w} for {ticker} must be finite and non-negative"
                )));
            }
        }
        if weights.values().sum::<f64>() <= 0.0 {
            return Err(ConfigError::Invalid("portfolio weights sum to zero".into()));
        }
        Ok(())
    }

    fn validate_grid(&self) -> Result<(), ConfigError> {
        let t = &self.triggers;
        if t.thresholds.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(ConfigError::Invalid("thresholds must be positive".into()));
        }
        if t.momentum_multipliers.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(ConfigError::Invalid("momentum multipliers must be positive".into()));
        }
        if t.volatility_entries.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(ConfigError::Invalid("volatility entries must be positive".into()));
        }
        if !(t.hysteresis > 0.0 && t.hysteresis <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "hysteresis {} must be in (0, 1]",
                t.hysteresis
            )));
        }
        let r = &self.reinvestment;
        for symbol in r.referenced_tickers() {
            Ticker::parse(symbol)
                .map_err(|e| ConfigError::Invalid(format!("reinvestment: {e}")))?;
        }
        if r.dip_buy.targets.is_empty() {
            return Err(ConfigError::Invalid("dip_buy.targets is empty".into()));
        }
        if !(r.dip_buy.drop_threshold > 0.0 && r.dip_buy.drop_threshold < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "dip_buy.drop_threshold {} must be in (0, 1)",
                r.dip_buy.drop_threshold
            )));
        }
        Ok(())
    }
}
