//! Target weights resolved against the tickers actually present in a table.

use super::price_table::PriceTable;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightsError {
    #[error("weight for {ticker} is negative or not finite: {weight}")]
    InvalidWeight { ticker: String, weight: f64 },
    #[error("target weights sum to zero")]
    ZeroTotal,
}

/// One weight per price table column, summing to one.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetWeights(Vec<f64>);

impl TargetWeights {
    /// Resolve configured weights against `table`.
    ///
    /// Tickers present in the table but absent from `requested` receive an
    /// equal share `1/n`. Configured tickers missing from the table are
    /// ignored. The result is renormalised to sum to one; any adjustment is
    /// reported in the returned warnings.
    pub fn resolve(
        requested: &BTreeMap<String, f64>,
        table: &PriceTable,
    ) -> Result<(Self, Vec<String>), WeightsError> {
        let mut warnings = Vec::new();
        let n = table.ticker_count();
        let equal = 1.0 / n as f64;

        for (symbol, &weight) in requested {
            if !weight.is_finite() || weight < 0.0 {
                return Err(WeightsError::InvalidWeight {
                    ticker: symbol.clone(),
                    weight,
                });
            }
            if table.ticker_id(symbol).is_none() {
                warnings.push(format!("weight for {symbol} ignored: ticker not in price table"));
            }
        }

        let mut raw = Vec::with_capacity(n);
        for ticker in table.tickers() {
            let found = requested
                .iter()
                .find(|(k, _)| k.trim().eq_ignore_ascii_case(ticker.as_str()))
                .map(|(_, &w)| w);
            match found {
                Some(w) => raw.push(w),
                None => {
                    warnings.push(format!("no weight configured for {ticker}; using {equal:.4}"));
                    raw.push(equal);
                }
            }
        }

        let total: f64 = raw.iter().sum();
        if total <= 0.0 {
            return Err(WeightsError::ZeroTotal);
        }
        if (total - 1.0).abs() > 1e-9 {
            warnings.push(format!("target weights sum to {total:.6}; renormalised to 1"));
        }
        Ok((Self(raw.into_iter().map(|w| w / total).collect()), warnings))
    }

    /// Wrap weights that already sum to one.
    pub fn from_normalized(weights: Vec<f64>) -> Self {
        Self(weights)
    }

    /// Equal weight across `n` tickers.
    pub fn equal(n: usize) -> Self {
        Self(vec![1.0 / n as f64; n])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}
