//! Price provider trait and structured error types.
//!
//! The `PriceProvider` trait abstracts over price sources (a directory of CSV
//! files, the synthetic generator) so the loader can swap implementations and
//! tests can mock them.

use crate::domain::Ticker;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Daily closes for one ticker as delivered by a provider: sorted by date,
/// possibly with gaps relative to other tickers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSeries {
    pub ticker: Ticker,
    pub points: Vec<(NaiveDate, f64)>,
}

impl RawSeries {
    pub fn new(ticker: Ticker, mut points: Vec<(NaiveDate, f64)>) -> Self {
        points.sort_by_key(|(d, _)| *d);
        points.dedup_by_key(|(d, _)| *d);
        Self { ticker, points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no price data for {ticker}")]
    NotFound { ticker: String },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed price data in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Trait for price sources.
pub trait PriceProvider: Send + Sync {
    /// Provider name for logging (e.g. "csv", "synthetic").
    fn name(&self) -> &str;

    /// Fetch closes for `ticker` within `[start, end]` inclusive.
    fn fetch(
        &self,
        ticker: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawSeries, DataError>;

    /// Whether this provider fabricates data.
    fn is_synthetic(&self) -> bool {
        false
    }
}
