//! Aligned daily close prices for a set of tickers.
//!
//! A `PriceTable` is the only market input to a simulation. It is built once
//! per run, validated at construction, and read-only afterwards. Columns are
//! stored per ticker so indicator computation can borrow a contiguous slice.

use super::ticker::{Ticker, TickerId};
use chrono::NaiveDate;
use std::collections::HashSet;
use thiserror::Error;

/// Errors from price table construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PriceTableError {
    #[error("price table has no tickers")]
    NoTickers,
    #[error("price table has no dates")]
    NoDates,
    #[error("dates are not strictly increasing at row {row}: {prev} -> {next}")]
    DatesNotIncreasing {
        row: usize,
        prev: NaiveDate,
        next: NaiveDate,
    },
    #[error("ticker {ticker} has {actual} prices, expected {expected}")]
    ColumnLength {
        ticker: String,
        expected: usize,
        actual: usize,
    },
    #[error("ticker {ticker} has a non-positive or non-finite price {value} at row {row}")]
    InvalidPrice {
        ticker: String,
        row: usize,
        value: f64,
    },
    #[error("ticker {0} appears more than once")]
    DuplicateTicker(String),
}

/// Daily close prices, one column per ticker, on a shared strictly-increasing
/// date index. Every cell is a finite positive price.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    tickers: Vec<Ticker>,
    closes: Vec<Vec<f64>>,
}

impl PriceTable {
    pub fn new(
        dates: Vec<NaiveDate>,
        columns: Vec<(Ticker, Vec<f64>)>,
    ) -> Result<Self, PriceTableError> {
        if columns.is_empty() {
            return Err(PriceTableError::NoTickers);
        }
        if dates.is_empty() {
            return Err(PriceTableError::NoDates);
        }
        for (row, pair) in dates.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(PriceTableError::DatesNotIncreasing {
                    row: row + 1,
                    prev: pair[0],
                    next: pair[1],
                });
            }
        }

        let mut seen = HashSet::new();
        let mut tickers = Vec::with_capacity(columns.len());
        let mut closes = Vec::with_capacity(columns.len());
        for (ticker, column) in columns {
            if !seen.insert(ticker.clone()) {
                return Err(PriceTableError::DuplicateTicker(ticker.to_string()));
            }
            if column.len() != dates.len() {
                return Err(PriceTableError::ColumnLength {
                    ticker: ticker.to_string(),
                    expected: dates.len(),
                    actual: column.len(),
                });
            }
            if let Some((row, &value)) = column
                .iter()
                .enumerate()
                .find(|(_, v)| !v.is_finite() || **v <= 0.0)
            {
                return Err(PriceTableError::InvalidPrice {
                    ticker: ticker.to_string(),
                    row,
                    value,
                });
            }
            tickers.push(ticker);
            closes.push(column);
        }

        Ok(Self {
            dates,
            tickers,
            closes,
        })
    }

    /// Number of trading days.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn date(&self, day: usize) -> NaiveDate {
        self.dates[day]
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn ticker(&self, id: TickerId) -> &Ticker {
        &self.tickers[id.index()]
    }

    pub fn ticker_count(&self) -> usize {
        self.tickers.len()
    }

    pub fn ticker_ids(&self) -> impl Iterator<Item = TickerId> + '_ {
        (0..self.tickers.len()).map(TickerId)
    }

    /// Resolve a symbol to its column. Symbols are compared case-insensitively.
    pub fn ticker_id(&self, symbol: &str) -> Option<TickerId> {
        self.tickers
            .iter()
            .position(|t| t.as_str().eq_ignore_ascii_case(symbol.trim()))
            .map(TickerId)
    }

    pub fn column(&self, id: TickerId) -> &[f64] {
        &self.closes[id.index()]
    }

    pub fn close(&self, id: TickerId, day: usize) -> f64 {
        self.closes[id.index()][day]
    }

    /// Closes of every ticker on one day, in column order.
    pub fn day_closes(&self, day: usize) -> Vec<f64> {
        self.closes.iter().map(|c| c[day]).collect()
    }
}
