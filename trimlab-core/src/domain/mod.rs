//! Domain types for trimlab

pub mod events;
pub mod portfolio;
pub mod price_table;
pub mod ticker;
pub mod weights;

pub use events::{ReinvestmentEvent, ReinvestmentTrigger, TradeEvent};
pub use portfolio::{BucketKind, CashBucket, Position, PortfolioState, TriggerState};
pub use price_table::{PriceTable, PriceTableError};
pub use ticker::{Ticker, TickerError, TickerId};
pub use weights::{TargetWeights, WeightsError};
