//! Proceeds sit idle for the rest of the run.

use crate::components::reinvest::{Deployment, MarketView, ReinvestmentPolicy};
use crate::domain::{BucketKind, CashBucket};

#[derive(Debug, Clone, Default)]
pub struct HoldCash;

impl ReinvestmentPolicy for HoldCash {
    fn label(&self) -> &str {
        "cash"
    }

    fn bucket_kind(&self) -> BucketKind {
        BucketKind::Idle
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::reinvest::test_support::Book;

    #[test]
    fn proceeds_accumulate_and_never_release() {
        let book = Book::new(&[1.0], &[100.0], vec![]);
        let mut policy = HoldCash;
        let mut cash = CashBucket::new(policy.bucket_kind());
        assert!(policy.allocate(500.0, &book.view(0), &mut cash).is_none());
        assert!(policy.allocate(250.0, &book.view(1), &mut cash).is_none());
        assert!(policy.release(&book.view(2), &mut cash).is_none());
        assert_eq!(cash.balance(), 750.0);
    }
}
