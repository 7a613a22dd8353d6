//! Gradual redeployment of a queue on a fixed schedule.
//!
//! Every `interval_days` trading days, `release_fraction` of the queue is
//! reinvested at current pro-rata weights. If the reference ticker's
//! volatility has normalised (below `normalization_multiple` times its
//! average over the previous `normalization_lookback` days) the whole queue
//! is released at once.

use crate::components::reinvest::{Deployment, MarketView, ReinvestmentPolicy};
use crate::domain::{BucketKind, CashBucket, ReinvestmentTrigger, TickerId};
use crate::indicators::trailing_mean;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DripParams {
    pub release_fraction: f64,
    pub interval_days: usize,
    pub normalization_multiple: f64,
    pub normalization_lookback: usize,
}

impl Default for DripParams {
    fn default() -> Self {
        Self {
            release_fraction: 0.25,
            interval_days: 5,
            normalization_multiple: 1.2,
            normalization_lookback: 63,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Drip {
    reference: TickerId,
    params: DripParams,
}

impl Drip {
    pub fn new(reference: TickerId, params: DripParams) -> Self {
        assert!(params.interval_days >= 1, "drip interval must be >= 1");
        Self { reference, params }
    }

    fn volatility_normalized(&self, market: &MarketView<'_>) -> bool {
        let day = market.day;
        if day < self.params.normalization_lookback {
            return false;
        }
        let ind = market.indicators.ticker(self.reference);
        let Some(current) = ind.volatility(day) else {
            return false;
        };
        match trailing_mean(&ind.volatility, day, self.params.normalization_lookback) {
            Some(avg) if avg > 0.0 => current < self.params.normalization_multiple * avg,
            _ => false,
        }
    }
}

impl ReinvestmentPolicy for Drip {
    fn label(&self) -> &str {
        "drip"
    }

    fn bucket_kind(&self) -> BucketKind {
        BucketKind::DripQueue
    }

    fn release(&mut self, market: &MarketView<'_>, cash: &mut CashBucket) -> Option<Deployment> {
        if cash.is_empty() {
            return None;
        }
        let normalized = self.volatility_normalized(market);
        if !normalized && market.day % self.params.interval_days != 0 {
            return None;
        }
        let (amount, trigger) = if normalized {
            (cash.drain(), ReinvestmentTrigger::VolatilityNormalized)
        } else {
            let fraction = self.params.release_fraction;
            (
                cash.withdraw_fraction(fraction),
                ReinvestmentTrigger::Scheduled { fraction },
            )
        };
        (amount > 0.0).then(|| Deployment {
            amount,
            weights: market.pro_rata_weights(),
            trigger,
        })
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

    fn queued(amount: f64) -> CashBucket {
        let mut cash = CashBucket::new(BucketKind::DripQueue);
        cash.deposit(amount);
        cash
    }

    #[test]
    fn releases_quarter_on_schedule_only() {
        // flat high volatility: never normalised
        let book = Book::new(&[10.0, 10.0], &[100.0, 100.0], vec![f64::NAN; 20]);
        let mut policy = Drip::new(TickerId(0), DripParams::default());
        let mut cash = queued(1_000.0);

        assert!(policy.release(&book.view(3), &mut cash).is_none());
        let dep = policy.release(&book.view(5), &mut cash).unwrap();
        assert_eq!(dep.amount, 250.0);
        assert_eq!(dep.trigger, ReinvestmentTrigger::Scheduled { fraction: 0.25 });
        assert_eq!(cash.balance(), 750.0);
        let dep = policy.release(&book.view(10), &mut cash).unwrap();
        assert_eq!(dep.amount, 187.5);
    }

    #[test]
    fn normalised_volatility_releases_everything() {
        // 63 days at 0.30 then a calm day at 0.20 (< 1.2 * 0.30)
        let mut vol = vec![0.30; 63];
        vol.push(0.20);
        let book = Book::new(&[10.0, 30.0], &[100.0, 100.0], vol);
        let mut policy = Drip::new(TickerId(0), DripParams::default());
        let mut cash = queued(1_000.0);

        let dep = policy.release(&book.view(63), &mut cash).unwrap();
        assert_eq!(dep.amount, 1_000.0);
        assert_eq!(dep.trigger, ReinvestmentTrigger::VolatilityNormalized);
        assert_eq!(dep.weights[1].1, 0.75);
        assert!(cash.is_empty());
    }

    #[test]
    fn not_normalised_before_lookback() {
        let book = Book::new(&[10.0], &[100.0], vec![0.01; 70]);
        let policy = Drip::new(TickerId(0), DripParams::default());
        assert!(!policy.volatility_normalized(&book.view(62)));
        assert!(policy.volatility_normalized(&book.view(63)));
    }

    #[test]
    fn empty_queue_releases_nothing() {
        let book = Book::new(&[10.0], &[100.0], vec![]);
        let mut policy = Drip::new(TickerId(0), DripParams::default());
        let mut cash = CashBucket::new(BucketKind::DripQueue);
        assert!(policy.release(&book.view(0), &mut cash).is_none());
    }

    #[test]
    fn proceeds_are_queued() {
        let book = Book::new(&[10.0], &[100.0], vec![]);
        let mut policy = Drip::new(TickerId(0), DripParams::default());
        let mut cash = CashBucket::new(BucketKind::DripQueue);
        assert!(policy.allocate(400.0, &book.view(1), &mut cash).is_none());
        assert_eq!(cash.balance(), 400.0);
    }
}
