//! Multi-ticker time alignment with coverage filtering.
//!
//! Given raw series for several tickers, build one gap-free `PriceTable`:
//!
//! 1. Coverage per ticker = its dates / union of all dates. Tickers below the
//!    threshold (or with no data) are dropped and reported.
//! 2. The surviving tickers are aligned on the union of their own dates.
//! 3. Gaps are forward-filled from the last known close.
//! 4. Leading rows where some ticker has not started yet are dropped.

use super::provider::RawSeries;
use crate::domain::{PriceTable, PriceTableError, Ticker};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;

/// Why a requested ticker is missing from the final table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DropReason {
    NoData,
    InsufficientCoverage { coverage: f64, required: f64 },
    FetchFailed { message: String },
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoData => f.write_str("no data"),
            Self::InsufficientCoverage { coverage, required } => write!(
                f,
                "coverage {:.1}% below required {:.1}%",
                coverage * 100.0,
                required * 100.0
            ),
            Self::FetchFailed { message } => write!(f, "fetch failed: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedTicker {
    pub ticker: Ticker,
    pub reason: DropReason,
}

/// Aligned table plus what was done to get there.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub table: PriceTable,
    pub dropped: Vec<DroppedTicker>,
    /// Cells filled from a previous close.
    pub forward_filled: usize,
    /// Rows removed at the start because some ticker had not begun trading.
    pub leading_rows_dropped: usize,
}

#[derive(Debug, Error)]
pub enum AlignError {
    #[error("no tickers left after coverage filtering ({} dropped)", dropped.len())]
    NoTickersRemaining { dropped: Vec<DroppedTicker> },
    #[error("surviving tickers never trade on a common date")]
    NoCommonRows,
    #[error(transparent)]
    Table(#[from] PriceTableError),
}

/// Align `series` into a gap-free table, dropping tickers whose coverage is
/// below `min_coverage` (a fraction in `[0, 1]`).
pub fn align_series(series: Vec<RawSeries>, min_coverage: f64) -> Result<Alignment, AlignError> {
    let usable = |v: f64| v.is_finite() && v > 0.0;

    let all_dates: BTreeSet<NaiveDate> = series
        .iter()
        .flat_map(|s| s.points.iter().filter(|(_, v)| usable(*v)).map(|(d, _)| *d))
        .collect();
    let total = all_dates.len();

    let mut dropped = Vec::new();
    let mut kept = Vec::new();
    for s in series {
        let present = s.points.iter().filter(|(_, v)| usable(*v)).count();
        if present == 0 {
            dropped.push(DroppedTicker {
                ticker: s.ticker,
                reason: DropReason::NoData,
            });
            continue;
        }
        let coverage = present as f64 / total as f64;
        if coverage < min_coverage {
            dropped.push(DroppedTicker {
                ticker: s.ticker,
                reason: DropReason::InsufficientCoverage {
                    coverage,
                    required: min_coverage,
                },
            });
            continue;
        }
        kept.push(s);
    }

    if kept.is_empty() {
        return Err(AlignError::NoTickersRemaining { dropped });
    }

    let dates: Vec<NaiveDate> = kept
        .iter()
        .flat_map(|s| s.points.iter().filter(|(_, v)| usable(*v)).map(|(d, _)| *d))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut forward_filled = 0;
    let mut columns: Vec<(Ticker, Vec<Option<f64>>)> = Vec::with_capacity(kept.len());
    for s in kept {
        let by_date: HashMap<NaiveDate, f64> = s
            .points
            .iter()
            .filter(|(_, v)| usable(*v))
            .copied()
            .collect();
        let mut last = None;
        let column = dates
            .iter()
            .map(|d| match by_date.get(d) {
                Some(&v) => {
                    last = Some(v);
                    last
                }
                None => {
                    if last.is_some() {
                        forward_filled += 1;
                    }
                    last
                }
            })
            .collect();
        columns.push((s.ticker, column));
    }

    let first_complete = (0..dates.len())
        .find(|&row| columns.iter().all(|(_, c)| c[row].is_some()))
        .ok_or(AlignError::NoCommonRows)?;

    let table = PriceTable::new(
        dates[first_complete..].to_vec(),
        columns
            .into_iter()
            .map(|(t, c)| (t, c[first_complete..].iter().flatten().copied().collect()))
            .collect(),
    )?;

    Ok(Alignment {
        table,
        dropped,
        forward_filled,
        leading_rows_dropped: first_complete,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn series(symbol: &str, points: &[(u32, f64)]) -> RawSeries {
        RawSeries::new(
            Ticker::parse(symbol).unwrap(),
            points.iter().map(|&(day, v)| (d(day), v)).collect(),
        )
    }

    #[test]
    fn forward_fills_interior_gaps() {
        let a = series("AAA", &[(1, 10.0), (2, 11.0), (3, 12.0), (4, 13.0)]);
        let b = series("BBB", &[(1, 20.0), (2, 21.0), (4, 23.0)]);
        let out = align_series(vec![a, b], 0.7).unwrap();
        assert_eq!(out.table.len(), 4);
        let bbb = out.table.ticker_id("BBB").unwrap();
        assert_eq!(out.table.column(bbb), &[20.0, 21.0, 21.0, 23.0]);
        assert_eq!(out.forward_filled, 1);
        assert!(out.dropped.is_empty());
    }

    #[test]
    fn drops_low_coverage_ticker() {
        let a = series("AAA", &[(1, 10.0), (2, 11.0), (3, 12.0), (4, 13.0)]);
        let b = series("BBB", &[(4, 23.0)]);
        let out = align_series(vec![a, b], 0.95).unwrap();
        assert_eq!(out.table.ticker_count(), 1);
        assert_eq!(out.dropped.len(), 1);
        assert!(matches!(
            out.dropped[0].reason,
            DropReason::InsufficientCoverage { coverage, .. } if (coverage - 0.25).abs() < 1e-12
        ));
    }

    #[test]
    fn drops_leading_rows_until_all_trade() {
        let a = series("AAA", &[(1, 10.0), (2, 11.0), (3, 12.0), (4, 13.0)]);
        let b = series("BBB", &[(2, 21.0), (3, 22.0), (4, 23.0)]);
        let out = align_series(vec![a, b], 0.5).unwrap();
        assert_eq!(out.leading_rows_dropped, 1);
        assert_eq!(out.table.dates()[0], d(2));
        assert_eq!(out.table.column(out.table.ticker_id("AAA").unwrap()), &[11.0, 12.0, 13.0]);
    }

    #[test]
    fn empty_series_reported_as_no_data() {
        let a = series("AAA", &[(1, 10.0)]);
        let b = series("BBB", &[]);
        let out = align_series(vec![a, b], 0.95).unwrap();
        assert_eq!(out.dropped[0].reason, DropReason::NoData);
    }

    #[test]
    fn all_dropped_is_an_error() {
        let a = series("AAA", &[(1, f64::NAN)]);
        assert!(matches!(
            align_series(vec![a], 0.95),
            Err(AlignError::NoTickersRemaining { .. })
        ));
    }

    #[test]
    fn drop_reason_display() {
        let r = DropReason::InsufficientCoverage {
            coverage: 0.5,
            required: 0.95,
        };
        assert_eq!(r.to_string(), "coverage 50.0% below required 95.0%");
    }
}
