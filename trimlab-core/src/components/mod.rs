//! Component traits for strategy composition.
//!
//! Every strategy variant is composed of two independent components:
//! - Trim trigger: decides when a held ticker is trimmed
//! - Reinvestment policy: decides where and when the proceeds go
//!
//! Plus the indicator trait for precomputed numeric series, and the factory
//! that builds components from their serializable descriptions.

pub mod factory;
pub mod indicator;
pub mod reinvest;
pub mod trigger;

pub use factory::{create_reinvestment, create_trigger, PolicyError};
pub use indicator::{Indicator, IndicatorSet, TickerIndicators};
pub use reinvest::{Deployment, MarketView, ReinvestmentPolicy};
pub use trigger::{TriggerContext, TrimTrigger};
