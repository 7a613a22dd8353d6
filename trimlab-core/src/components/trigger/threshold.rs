//! Gain-threshold trigger.
//!
//! Trims once `(price - cost_basis) / cost_basis >= threshold`. After each
//! trim the simulator raises the basis, so the next trim needs a fresh gain.

use crate::components::trigger::{TriggerContext, TrimTrigger};
use crate::domain::TriggerState;

#[derive(Debug, Clone)]
pub struct ThresholdTrigger {
    threshold: f64,
    name: String,
}

impl ThresholdTrigger {
    pub fn new(threshold: f64) -> Self {
        assert!(threshold > 0.0, "trim threshold must be positive");
        Self {
            threshold,
            name: format!("threshold_{threshold}"),
        }
    }
}

impl TrimTrigger for ThresholdTrigger {
    fn name(&self) -> &str {
        &self.name
    }

    fn should_trim(&self, ctx: &TriggerContext<'_>, _state: &mut TriggerState) -> bool {
        ctx.gain_fraction() >= self.threshold
    }

    fn resets_cost_basis(&self) -> bool {
        true
    }
}
