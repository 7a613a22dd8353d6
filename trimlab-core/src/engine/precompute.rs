//! Indicator precomputation.
//!
//! All derived series are computed once per ticker before the day loop and
//! shared read-only by every strategy variant run against the same table.

use crate::components::indicator::{Indicator, IndicatorSet, TickerIndicators};
use crate::domain::PriceTable;
use crate::indicators::{
    IndicatorWindows, Momentum, RealizedVolatility, RollingMedian, Sma, TRADING_DAYS_PER_YEAR,
};

/// Precompute moving average, momentum, realized volatility and the
/// volatility median for every ticker in `table`.
pub fn precompute_indicators(table: &PriceTable, windows: &IndicatorWindows) -> IndicatorSet {
    let sma = Sma::new(windows.moving_average);
    let momentum = Momentum::new(windows.momentum);
    let volatility = RealizedVolatility::new(windows.volatility, TRADING_DAYS_PER_YEAR);
    let median = RollingMedian::new(windows.volatility_median);

    let warmup = compute_warmup(windows);
    if table.len() <= warmup {
        tracing::warn!(
            days = table.len(),
            warmup,
            "price history shorter than the indicator warmup; indicator-driven triggers will never fire"
        );
    }

    let per_ticker = table
        .ticker_ids()
        .map(|id| {
            let closes = table.column(id);
            let vol = volatility.compute(closes);
            let ind = TickerIndicators {
                moving_average: sma.compute(closes),
                momentum: momentum.compute(closes),
                volatility_median: median.compute(&vol),
                volatility: vol,
            };
            debug_assert_eq!(ind.moving_average.len(), closes.len());
            debug_assert_eq!(ind.volatility_median.len(), closes.len());
            ind
        })
        .collect();

    IndicatorSet::new(per_ticker)
}

/// Days before every derived series is defined: the longest chain of
/// lookbacks (volatility feeds the median).
pub fn compute_warmup(windows: &IndicatorWindows) -> usize {
    let sma = Sma::new(windows.moving_average).lookback();
    let momentum = Momentum::new(windows.momentum).lookback();
    let regime = RealizedVolatility::new(windows.volatility, TRADING_DAYS_PER_YEAR).lookback()
        + RollingMedian::new(windows.volatility_median).lookback();
    sma.max(momentum).max(regime)
}
