//! Reinvestment policies: where and when trim proceeds are redeployed.
//!
//! Each policy owns its mode-specific state (running high, round-robin index,
//! schedule parameters) and is constructed fresh for every simulation run.
//! The pool of waiting cash lives in `PortfolioState::cash` and is lent to the
//! policy on every call. Policies never touch holdings directly: they return a
//! `Deployment` and the simulator executes the buy, deducting the buy-side
//! transaction cost.

pub mod cash;
pub mod dip_buy;
pub mod drip;
pub mod pro_rata;
pub mod single_target;
pub mod yield_volatility;

pub use cash::HoldCash;
pub use dip_buy::DipBuy;
pub use drip::Drip;
pub use pro_rata::ProRata;
pub use single_target::SingleTarget;
pub use yield_volatility::YieldVolatility;

use super::indicator::IndicatorSet;
use crate::domain::{BucketKind, CashBucket, Position, ReinvestmentTrigger, TickerId};

/// Read-only view of the market and holdings at the moment a policy is called.
#[derive(Debug, Clone, Copy)]
pub struct MarketView<'a> {
    pub day: usize,
    /// Closes for every ticker on `day`, indexed by `TickerId`.
    pub prices: &'a [f64],
    pub positions: &'a [Position],
    pub indicators: &'a IndicatorSet,
}

impl MarketView<'_> {
    pub fn price(&self, id: TickerId) -> f64 {
        self.prices[id.index()]
    }

    /// Current dollar weights of all tickers. Falls back to an equal split
    /// when the invested value is zero.
    pub fn pro_rata_weights(&self) -> Vec<(TickerId, f64)> {
        let values: Vec<f64> = self
            .positions
            .iter()
            .zip(self.prices)
            .map(|(p, &price)| p.market_value(price))
            .collect();
        let total: f64 = values.iter().sum();
        let n = values.len() as f64;
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let w = if total > 0.0 { v / total } else { 1.0 / n };
                (TickerId(i), w)
            })
            .collect()
    }
}

/// A buy the simulator should execute. Weights sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct Deployment {
    /// Dollars drawn from proceeds or the cash pool, before buy cost.
    pub amount: f64,
    pub weights: Vec<(TickerId, f64)>,
    pub trigger: ReinvestmentTrigger,
}

impl Deployment {
    pub fn single(amount: f64, target: TickerId, trigger: ReinvestmentTrigger) -> Self {
        Self {
            amount,
            weights: vec![(target, 1.0)],
            trigger,
        }
    }
}

/// Trait for reinvestment policies.
pub trait ReinvestmentPolicy: Send {
    /// Short mode label used in strategy names (e.g. "pro-rata").
    fn label(&self) -> &str;

    /// Kind of cash pool this policy keeps.
    fn bucket_kind(&self) -> BucketKind;

    /// Start-of-day hook, called before any trims. Queued modes release here.
    fn release(&mut self, _market: &MarketView<'_>, _cash: &mut CashBucket) -> Option<Deployment> {
        None
    }

    /// Route the net proceeds of one trim. Returns a deployment for immediate
    /// modes; queued modes deposit into `cash` and return `None`.
    fn allocate(
        &mut self,
        proceeds: f64,
        market: &MarketView<'_>,
        cash: &mut CashBucket,
    ) -> Option<Deployment>;
}
