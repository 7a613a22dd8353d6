//! Portfolio simulator: the day-by-day state machine and its supporting
//! pieces.
//!
//! The engine consumes a validated price table and precomputed indicators,
//! then runs the five-phase day loop (see `loop_runner`):
//!
//! 1. Queue releases
//! 2. Trims
//! 3. Proceeds routing
//! 4. Cost basis reset
//! 5. Snapshot and reconciliation

pub mod accounting;
pub mod loop_runner;
pub mod precompute;
pub mod state;
pub mod validate;

pub use accounting::{verify_reconciliation, CostModel, TrimProceeds};
pub use loop_runner::simulate;
pub use precompute::{compute_warmup, precompute_indicators};
pub use state::{DailySnapshot, SimulationConfig, SimulationError, SimulationOutcome};
pub use validate::{direct_cagr, validate_run, Finding};
