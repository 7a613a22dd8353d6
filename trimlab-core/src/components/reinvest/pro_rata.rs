//! Immediate redeployment across holdings at their current dollar weights.

use crate::components::reinvest::{Deployment, MarketView, ReinvestmentPolicy};
use crate::domain::{BucketKind, CashBucket, ReinvestmentTrigger};

#[derive(Debug, Clone, Default)]
pub struct ProRata;

impl ReinvestmentPolicy for ProRata {
    fn label(&self) -> &str {
        "pro-rata"
    }

    fn bucket_kind(&self) -> BucketKind {
        BucketKind::Idle
    }

    fn allocate(
        &mut self,
        proceeds: f64,
        market: &MarketView<'_>,
        _cash: &mut CashBucket,
    ) -> Option<Deployment> {
        Some(Deployment {
            amount: proceeds,
            weights: market.pro_rata_weights(),
            trigger: ReinvestmentTrigger::Immediate,
        })
    }
}
