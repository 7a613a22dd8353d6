//! Immediate redeployment into one fixed ticker.

use crate::components::reinvest::{Deployment, MarketView, ReinvestmentPolicy};
use crate::domain::{BucketKind, CashBucket, ReinvestmentTrigger, TickerId};

#[derive(Debug, Clone)]
pub struct SingleTarget {
    target: TickerId,
    label: String,
}

impl SingleTarget {
    /// `label` is the lower-cased target symbol, e.g. "spy".
    pub fn new(target: TickerId, label: impl Into<String>) -> Self {
        Self {
            target,
            label: label.into(),
        }
    }
}

impl ReinvestmentPolicy for SingleTarget {
    fn label(&self) -> &str {
        &self.label
    }

    fn bucket_kind(&self) -> BucketKind {
        BucketKind::Idle
    }

    fn allocate(
        &mut self,
        proceeds: f64,
        _market: &MarketView<'_>,
        _cash: &mut CashBucket,
    ) -> Option<Deployment> {
        Some(Deployment::single(
            proceeds,
            self.target,
            ReinvestmentTrigger::Immediate,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::reinvest::test_support::Book;

    #[test]
    fn buys_the_target_only() {
        let book = Book::new(&[1.0, 1.0], &[10.0, 20.0], vec![]);
        let mut policy = SingleTarget::new(TickerId(1), "spy");
        let mut cash = CashBucket::new(policy.bucket_kind());
        let dep = policy.allocate(300.0, &book.view(0), &mut cash).unwrap();
        assert_eq!(dep.weights, vec![(TickerId(1), 1.0)]);
        assert_eq!(dep.amount, 300.0);
        assert_eq!(policy.label(), "spy");
    }
}
