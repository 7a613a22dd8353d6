//! Trim triggers: decide, per ticker per day, whether to sell a slice.
//!
//! A trigger sees the current price, the position's cost basis and the
//! ticker's precomputed indicators. Stateful triggers keep their per-ticker
//! bookkeeping in the position's `TriggerState`, never in the trigger itself,
//! so one trigger instance can be shared across tickers and runs.

pub mod buy_and_hold;
pub mod momentum;
pub mod threshold;
pub mod volatility;

pub use buy_and_hold::BuyAndHold;
pub use momentum::MomentumTrigger;
pub use threshold::ThresholdTrigger;
pub use volatility::VolatilityTrigger;

use super::indicator::TickerIndicators;
use crate::domain::TriggerState;

/// Everything a trigger may look at for one ticker on one day.
#[derive(Debug, Clone, Copy)]
pub struct TriggerContext<'a> {
    pub day: usize,
    pub price: f64,
    pub cost_basis: f64,
    pub indicators: &'a TickerIndicators,
}

impl TriggerContext<'_> {
    /// Unrealized gain relative to the cost basis.
    pub fn gain_fraction(&self) -> f64 {
        if self.cost_basis > 0.0 {
            (self.price - self.cost_basis) / self.cost_basis
        } else {
            0.0
        }
    }
}

/// Trait for trim triggers.
///
/// Called at most once per held ticker per day. Implementations may update
/// `state` (hysteresis) but must not depend on data after `ctx.day`.
pub trait TrimTrigger: Send + Sync {
    fn name(&self) -> &str;

    fn should_trim(&self, ctx: &TriggerContext<'_>, state: &mut TriggerState) -> bool;

    /// Whether the simulator raises the cost basis to `price * markup` after
    /// a trim on this trigger.
    fn resets_cost_basis(&self) -> bool {
        false
    }
}

#[cfg(test)]
pub(crate) fn indicators_for(
    moving_average: f64,
    momentum: f64,
    volatility: f64,
    volatility_median: f64,
) -> TickerIndicators {
    TickerIndicators {
        moving_average: vec![moving_average],
        momentum: vec![momentum],
        volatility: vec![volatility],
        volatility_median: vec![volatility_median],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(price: f64, cost_basis: f64, ind: &TickerIndicators) -> TriggerContext<'_> {
        TriggerContext {
            day: 0,
            price,
            cost_basis,
            indicators: ind,
        }
    }

    #[test]
    fn gain_fraction_relative_to_basis() {
        let ind = TickerIndicators::default();
        assert!((ctx(150.0, 100.0, &ind).gain_fraction() - 0.5).abs() < 1e-12);
        assert!((ctx(80.0, 100.0, &ind).gain_fraction() + 0.2).abs() < 1e-12);
        assert_eq!(ctx(10.0, 0.0, &ind).gain_fraction(), 0.0);
    }
}
