//! Overextension-plus-deceleration trigger.
//!
//! Trims when price exceeds `multiplier * moving_average` and short-window
//! momentum is negative. Inactive until both series are defined.

use crate::components::trigger::{TriggerContext, TrimTrigger};
use crate::domain::TriggerState;

#[derive(Debug, Clone)]
pub struct MomentumTrigger {
    multiplier: f64,
    name: String,
}

impl MomentumTrigger {
    pub fn new(multiplier: f64) -> Self {
        assert!(multiplier > 0.0, "momentum multiplier must be positive");
        Self {
            multiplier,
            name: format!("momentum_{multiplier}x"),
        }
    }
}

impl TrimTrigger for MomentumTrigger {
    fn name(&self) -> &str {
        &self.name
    }

    fn should_trim(&self, ctx: &TriggerContext<'_>, _state: &mut TriggerState) -> bool {
        let (Some(ma), Some(momentum)) = (
            ctx.indicators.moving_average(ctx.day),
            ctx.indicators.momentum(ctx.day),
        ) else {
            return false;
        };
        ma > 0.0 && ctx.price / ma > self.multiplier && momentum < 0.0
    }
}
