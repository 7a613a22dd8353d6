//! Deterministic synthetic price fixtures.
//!
//! Seeded random walks over business days, for tests, benches and demo runs
//! without a price directory. Results built on this data are tagged synthetic.

use super::provider::{DataError, PriceProvider, RawSeries};
use crate::domain::{PriceTable, PriceTableError, Ticker};
use crate::rng::RngHierarchy;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::Rng;

/// Shape of the synthetic walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticSpec {
    pub start_price: f64,
    /// Mean daily return.
    pub drift: f64,
    /// Daily returns are drawn uniformly from `drift ± spread`.
    pub spread: f64,
    pub seed: u64,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            start_price: 100.0,
            drift: 0.0004,
            spread: 0.03,
            seed: 42,
        }
    }
}

/// Business days (Mon-Fri) in `[start, end]`.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    let mut current = start;
    while current <= end {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(current);
        }
        current += Duration::days(1);
    }
    out
}

/// Random-walk closes for one ticker on `dates`. Seeded by `(seed, ticker)`.
pub fn generate_closes(ticker: &Ticker, days: usize, spec: &SyntheticSpec) -> Vec<f64> {
    let mut rng = RngHierarchy::new(spec.seed).rng_for("synthetic", ticker.as_str(), 0);
    let mut price = spec.start_price;
    (0..days)
        .map(|i| {
            if i > 0 {
                let r: f64 = rng.gen_range(-spec.spread..spec.spread) + spec.drift;
                price *= 1.0 + r;
            }
            price
        })
        .collect()
}

/// A complete table of synthetic closes for `tickers` over business days
/// in `[start, end]`.
pub fn generate_price_table(
    tickers: &[Ticker],
    start: NaiveDate,
    end: NaiveDate,
    spec: &SyntheticSpec,
) -> Result<PriceTable, PriceTableError> {
    let dates = business_days(start, end);
    let columns = tickers
        .iter()
        .map(|t| (t.clone(), generate_closes(t, dates.len(), spec)))
        .collect();
    PriceTable::new(dates, columns)
}

/// `PriceProvider` serving synthetic series.
#[derive(Debug, Clone, Default)]
pub struct SyntheticProvider {
    spec: SyntheticSpec,
}

impl SyntheticProvider {
    pub fn new(spec: SyntheticSpec) -> Self {
        Self { spec }
    }
}

impl PriceProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        ticker: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawSeries, DataError> {
        let dates = business_days(start, end);
        if dates.is_empty() {
            return Err(DataError::NotFound {
                ticker: ticker.to_string(),
            });
        }
        let closes = generate_closes(ticker, dates.len(), &self.spec);
        Ok(RawSeries::new(
            ticker.clone(),
            dates.into_iter().zip(closes).collect(),
        ))
    }

    fn is_synthetic(&self) -> bool {
        true
    }
}
