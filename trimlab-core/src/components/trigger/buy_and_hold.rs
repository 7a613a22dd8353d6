//! Baseline trigger that never trims.

use crate::components::trigger::{TriggerContext, TrimTrigger};
use crate::domain::TriggerState;

#[derive(Debug, Clone, Default)]
pub struct BuyAndHold;

impl TrimTrigger for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn should_trim(&self, _ctx: &TriggerContext<'_>, _state: &mut TriggerState) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::trigger::indicators_for;

    #[test]
    fn never_trims() {
        let ind = indicators_for(1.0, -1.0, 10.0, 1.0);
        let ctx = TriggerContext {
            day: 0,
            price: 1_000.0,
            cost_basis: 1.0,
            indicators: &ind,
        };
        assert!(!BuyAndHold.should_trim(&ctx, &mut TriggerState::default()));
    }
}
