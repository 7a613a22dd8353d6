//! Ticker symbols and dense ticker indices.
//!
//! Tickers are validated once when a price table is built. Everything
//! downstream addresses a ticker by its `TickerId` (column index in the
//! table), never by string lookup.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from ticker validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickerError {
    #[error("ticker is empty")]
    Empty,
    #[error("ticker '{0}' contains invalid characters (allowed: A-Z, 0-9, '.', '-', '^')")]
    InvalidCharacters(String),
    #[error("ticker '{0}' is longer than 16 characters")]
    TooLong(String),
}

/// A validated, upper-cased ticker symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    pub fn parse(raw: &str) -> Result<Self, TickerError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TickerError::Empty);
        }
        if trimmed.len() > 16 {
            return Err(TickerError::TooLong(trimmed.to_string()));
        }
        let upper = trimmed.to_ascii_uppercase();
        let valid = upper
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '-' | '^'));
        if !valid {
            return Err(TickerError::InvalidCharacters(trimmed.to_string()));
        }
        Ok(Self(upper))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Ticker {
    type Error = TickerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Ticker> for String {
    fn from(value: Ticker) -> Self {
        value.0
    }
}

/// Column index of a ticker inside a `PriceTable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TickerId(pub usize);

impl TickerId {
    pub fn index(self) -> usize {
        self.0
    }
}
