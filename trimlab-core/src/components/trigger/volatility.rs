//! Volatility-regime trigger with hysteresis and cooldown.
//!
//! ratio = short-window realized volatility / its long-window median.
//! The per-ticker `trim_active` flag turns on when the ratio reaches
//! `entry` and only turns off once it drops below `entry * hysteresis`.
//! While active, a trim fires if at least `cooldown_days` trading days have
//! passed since the last trim on that ticker.

use crate::components::trigger::{TriggerContext, TrimTrigger};
use crate::domain::TriggerState;

#[derive(Debug, Clone)]
pub struct VolatilityTrigger {
    entry: f64,
    exit: f64,
    cooldown_days: usize,
    name: String,
}

impl VolatilityTrigger {
    pub fn new(entry: f64, hysteresis: f64, cooldown_days: usize) -> Self {
        assert!(entry > 0.0, "volatility entry threshold must be positive");
        assert!(
            hysteresis > 0.0 && hysteresis <= 1.0,
            "hysteresis factor must be in (0, 1]"
        );
        Self {
            entry,
            exit: entry * hysteresis,
            cooldown_days,
            name: format!("volatility_{entry}x"),
        }
    }
}

impl TrimTrigger for VolatilityTrigger {
    fn name(&self) -> &str {
        &self.name
    }

    fn should_trim(&self, ctx: &TriggerContext<'_>, state: &mut TriggerState) -> bool {
        let Some(ratio) = ctx.indicators.volatility_ratio(ctx.day) else {
            return false;
        };

        if !state.trim_active && ratio >= self.entry {
            state.trim_active = true;
        } else if state.trim_active && ratio < self.exit {
            state.trim_active = false;
        }

        if !state.trim_active {
            return false;
        }

        match state.days_since_trim(ctx.day) {
            Some(elapsed) => elapsed >= self.cooldown_days,
            None => true,
        }
    }
}
