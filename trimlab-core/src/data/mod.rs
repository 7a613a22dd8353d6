//! Price data: provider abstraction, alignment and synthetic fixtures.

pub mod align;
pub mod provider;
pub mod synthetic;

pub use align::{align_series, AlignError, Alignment, DropReason, DroppedTicker};
pub use provider::{DataError, PriceProvider, RawSeries};
pub use synthetic::{
    business_days, generate_closes, generate_price_table, SyntheticProvider, SyntheticSpec,
};
