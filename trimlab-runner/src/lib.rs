//! Trimlab Runner: configuration, price loading, metrics, grid orchestration.
//!
//! This crate builds on `trimlab-core` to provide:
//! - TOML configuration with validation and fingerprinting
//! - Price loading from a CSV directory or the synthetic generator, with
//!   coverage filtering and alignment
//! - Metrics engine: point metrics, rolling windows, bootstrap intervals
//! - Single-variant runner with independent validation
//! - Strategy grid runner (parallel or sequential) and ranking
//! - CSV/JSON export of every variant and the comparison table

pub mod bootstrap;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod fitness;
pub mod grid;
pub mod metrics;
pub mod result;
pub mod rolling;
pub mod runner;

pub use bootstrap::{bootstrap_returns, BootstrapConfig, BootstrapError, BootstrapResult};
pub use config::{BacktestConfig, ConfigError};
pub use data_loader::{load_prices, CsvDirectoryProvider, LoadError, LoadOptions, LoadedPrices};
pub use export::{save_grid, VariantMetadata};
pub use fitness::FitnessMetric;
pub use grid::{enumerate_variants, run_grid, run_grid_with_progress, GridError, GridOutcome};
pub use metrics::PerformanceMetrics;
pub use result::{StrategyResult, VariantFailure, VariantRun, SCHEMA_VERSION};
pub use rolling::{rolling_metrics, RollingMetrics};
pub use runner::{run_variant, RunContext, RunError};
