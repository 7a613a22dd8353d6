//! Wait for a dip in a reference ticker, then buy on the round-robin list.
//!
//! The running high of the reference ticker is tracked every day, whether or
//! not cash is waiting. When the drop from that high reaches `drop_threshold`
//! and the queue is non-empty, the whole queue buys the next target and the
//! high resets to the current price.

use crate::components::reinvest::{Deployment, MarketView, ReinvestmentPolicy};
use crate::domain::{BucketKind, CashBucket, ReinvestmentTrigger, TickerId};

#[derive(Debug, Clone)]
pub struct DipBuy {
    reference: TickerId,
    drop_threshold: f64,
    targets: Vec<TickerId>,
    next_target: usize,
    running_high: Option<f64>,
}

impl DipBuy {
    pub fn new(reference: TickerId, drop_threshold: f64, targets: Vec<TickerId>) -> Self {
        assert!(!targets.is_empty(), "dip-buy needs at least one target");
        Self {
            reference,
            drop_threshold,
            targets,
            next_target: 0,
            running_high: None,
        }
    }

    pub fn running_high(&self) -> Option<f64> {
        self.running_high
    }
}

impl ReinvestmentPolicy for DipBuy {
    fn label(&self) -> &str {
        "dip-buy"
    }

    fn bucket_kind(&self) -> BucketKind {
        BucketKind::AwaitingDip
    }

    fn release(&mut self, market: &MarketView<'_>, cash: &mut CashBucket) -> Option<Deployment> {
        let price = market.price(self.reference);
        let high = self.running_high.map_or(price, |h| h.max(price));
        self.running_high = Some(high);

        let drop = (high - price) / high;
        if drop < self.drop_threshold || cash.is_empty() {
            return None;
        }

        let target = self.targets[self.next_target];
        self.next_target = (self.next_target + 1) % self.targets.len();
        self.running_high = Some(price);
        Some(Deployment::single(
            cash.drain(),
            target,
            ReinvestmentTrigger::Dip { drop },
        ))
    }

    fn allocate(
        &mut self,
        proceeds: f64,
        _market: &MarketView<'_>,
        cash: &mut CashBucket,
    ) -> Option<Deployment> {
        cash.deposit(proceeds);
        None
    }
}
