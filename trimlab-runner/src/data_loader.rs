//! Price loading for the runner.
//!
//! Given the configured tickers, fetches each series from a `PriceProvider`,
//! records the tickers that could not be loaded, and aligns the rest into a
//! gap-free `PriceTable`:
//! 1. Fetch failure or empty file → ticker dropped with the reason
//! 2. Coverage below the threshold → ticker dropped
//! 3. Remaining gaps → forward-filled; leading incomplete rows removed
//! 4. No ticker left → fail
//!
//! Synthetic data is a developer-only mode. Results produced on synthetic
//! data are tagged.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use thiserror::Error;
use trimlab_core::data::{
    align_series, AlignError, DataError, DropReason, DroppedTicker, PriceProvider, RawSeries,
};
use trimlab_core::domain::{PriceTable, Ticker, TickerError};
use trimlab_core::fingerprint::DatasetHash;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid ticker: {0}")]
    Ticker(#[from] TickerError),

    #[error("{0}")]
    Align(#[from] AlignError),
}

/// Options controlling how prices are loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOptions {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Minimum fraction of the union of dates a ticker must cover.
    pub min_coverage: f64,
}

/// Result of loading prices, including provenance.
#[derive(Debug, Clone)]
pub struct LoadedPrices {
    pub table: PriceTable,
    pub dropped: Vec<DroppedTicker>,
    /// Human-readable data-quality notes (drops, fills, trimmed rows).
    pub warnings: Vec<String>,
    /// Dataset hash for fingerprinting (BLAKE3 over the aligned table).
    pub dataset_hash: DatasetHash,
    pub has_synthetic: bool,
    pub provider: String,
}

/// Load and align prices for `tickers`.
pub fn load_prices(
    tickers: &[String],
    provider: &dyn PriceProvider,
    opts: &LoadOptions,
) -> Result<LoadedPrices, LoadError> {
    let mut series = Vec::with_capacity(tickers.len());
    let mut dropped = Vec::new();

    for symbol in tickers {
        let ticker = Ticker::parse(symbol)?;
        match provider.fetch(&ticker, opts.start, opts.end) {
            Ok(s) => series.push(s),
            Err(DataError::NotFound { .. }) => dropped.push(DroppedTicker {
                ticker,
                reason: DropReason::NoData,
            }),
            Err(e) => dropped.push(DroppedTicker {
                ticker,
                reason: DropReason::FetchFailed {
                    message: e.to_string(),
                },
            }),
        }
    }

    let alignment = match align_series(series, opts.min_coverage) {
        Ok(a) => a,
        Err(AlignError::NoTickersRemaining { dropped: more }) => {
            dropped.extend(more);
            for d in &dropped {
                tracing::warn!(ticker = %d.ticker, reason = %d.reason, "ticker dropped");
            }
            return Err(AlignError::NoTickersRemaining { dropped }.into());
        }
        Err(e) => return Err(e.into()),
    };
    dropped.extend(alignment.dropped);

    let mut warnings = Vec::new();
    for d in &dropped {
        tracing::warn!(ticker = %d.ticker, reason = %d.reason, "ticker dropped");
        warnings.push(format!("{} dropped: {}", d.ticker, d.reason));
    }
    if alignment.forward_filled > 0 {
        tracing::info!(cells = alignment.forward_filled, "forward-filled missing closes");
        warnings.push(format!(
            "{} missing closes forward-filled",
            alignment.forward_filled
        ));
    }
    if alignment.leading_rows_dropped > 0 {
        warnings.push(format!(
            "{} leading rows removed before every ticker had a price",
            alignment.leading_rows_dropped
        ));
    }

    let table = alignment.table;
    tracing::info!(
        provider = provider.name(),
        tickers = table.ticker_count(),
        days = table.len(),
        dropped = dropped.len(),
        "prices loaded"
    );

    Ok(LoadedPrices {
        dataset_hash: DatasetHash::of_table(&table),
        table,
        dropped,
        warnings,
        has_synthetic: provider.is_synthetic(),
        provider: provider.name().to_string(),
    })
}

// ─── CSV directory provider ──────────────────────────────────────────

/// Reads `<dir>/<TICKER>.csv` files with `Date` and `Close` columns (the
/// Yahoo download layout). Dates may be plain `YYYY-MM-DD` or timestamps
/// that start with one. Rows whose close is not a number (Yahoo writes
/// `null`) are skipped.
#[derive(Debug, Clone)]
pub struct CsvDirectoryProvider {
    dir: PathBuf,
}

impl CsvDirectoryProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, ticker: &Ticker) -> PathBuf {
        self.dir.join(format!("{ticker}.csv"))
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

fn read_series(path: &Path, ticker: &Ticker) -> Result<Vec<(NaiveDate, f64)>, DataError> {
    let display = path.display().to_string();
    let parse_err = |message: String| DataError::Parse {
        path: display.clone(),
        message,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| parse_err(e.to_string()))?;
    let headers = reader.headers().map_err(|e| parse_err(e.to_string()))?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let (Some(date_col), Some(close_col)) = (column("date"), column("close")) else {
        return Err(parse_err("missing Date or Close column".into()));
    };

    let mut points = Vec::new();
    let mut skipped = 0usize;
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| parse_err(e.to_string()))?;
        let date = record
            .get(date_col)
            .and_then(parse_date)
            .ok_or_else(|| parse_err(format!("row {}: bad date", line + 2)))?;
        match record.get(close_col).and_then(|v| v.parse::<f64>().ok()) {
            Some(close) => points.push((date, close)),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(%ticker, skipped, "rows without a numeric close skipped");
    }
    Ok(points)
}

impl PriceProvider for CsvDirectoryProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        ticker: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawSeries, DataError> {
        let path = self.path_for(ticker);
        if !path.exists() {
            return Err(DataError::NotFound {
                ticker: ticker.to_string(),
            });
        }
        let points = read_series(&path, ticker)?
            .into_iter()
            .filter(|(d, _)| *d >= start && *d <= end)
            .collect();
        Ok(RawSeries::new(ticker.clone(), points))
    }
}
