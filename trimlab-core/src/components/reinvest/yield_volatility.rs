//! Volatility-gated gradual redeployment into one ticker.
//!
//! After `warmup_days`, on any day the reference ticker's volatility is below
//! its average over the previous `average_window` days, `release_fraction` of
//! the queue buys the target. Nothing is released while the queue is at or
//! below `minimum_balance`; that remainder is reported as held cash.

use crate::components::reinvest::{Deployment, MarketView, ReinvestmentPolicy};
use crate::domain::{BucketKind, CashBucket, ReinvestmentTrigger, TickerId};
use crate::indicators::trailing_mean;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YieldVolatilityParams {
    pub release_fraction: f64,
    pub minimum_balance: f64,
    pub warmup_days: usize,
    pub average_window: usize,
}

impl Default for YieldVolatilityParams {
    fn default() -> Self {
        Self {
            release_fraction: 0.20,
            minimum_balance: 100.0,
            warmup_days: 63,
            average_window: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct YieldVolatility {
    target: TickerId,
    reference: TickerId,
    params: YieldVolatilityParams,
}

impl YieldVolatility {
    pub fn new(target: TickerId, reference: TickerId, params: YieldVolatilityParams) -> Self {
        Self {
            target,
            reference,
            params,
        }
    }

    fn calm(&self, market: &MarketView<'_>) -> bool {
        if market.day < self.params.warmup_days {
            return false;
        }
        let ind = market.indicators.ticker(self.reference);
        let Some(current) = ind.volatility(market.day) else {
            return false;
        };
        match trailing_mean(&ind.volatility, market.day, self.params.average_window) {
            Some(avg) if avg > 0.0 => current < avg,
            _ => false,
        }
    }
}

impl ReinvestmentPolicy for YieldVolatility {
    fn label(&self) -> &str {
        "yield-volatility"
    }

    fn bucket_kind(&self) -> BucketKind {
        BucketKind::VolatilityQueue
    }

    fn release(&mut self, market: &MarketView<'_>, cash: &mut CashBucket) -> Option<Deployment> {
        if cash.balance() <= self.params.minimum_balance || !self.calm(market) {
            return None;
        }
        let fraction = self.params.release_fraction;
        Some(Deployment::single(
            cash.withdraw_fraction(fraction),
            self.target,
            ReinvestmentTrigger::VolatilityGated { fraction },
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::reinvest::test_support::Book;

    fn calm_book() -> Book {
        // 70 days alternating around 0.30, then a calmer day at 0.25
        let mut vol: Vec<f64> = (0..70).map(|i| if i % 2 == 0 { 0.28 } else { 0.32 }).collect();
        vol.push(0.25);
        Book::new(&[10.0, 10.0], &[100.0, 100.0], vol)
    }

    #[test]
    fn releases_twenty_percent_when_calm() {
        let book = calm_book();
        let mut policy = YieldVolatility::new(TickerId(1), TickerId(0), Default::default());
        let mut cash = CashBucket::new(BucketKind::VolatilityQueue);
        cash.deposit(1_000.0);
        let dep = policy.release(&book.view(70), &mut cash).unwrap();
        assert_eq!(dep.amount, 200.0);
        assert_eq!(dep.weights, vec![(TickerId(1), 1.0)]);
        assert_eq!(cash.balance(), 800.0);
    }

    #[test]
    fn holds_when_volatility_not_below_average() {
        let book = calm_book();
        let mut policy = YieldVolatility::new(TickerId(1), TickerId(0), Default::default());
        let mut cash = CashBucket::new(BucketKind::VolatilityQueue);
        cash.deposit(1_000.0);
        // day 69: 0.32 is above the trailing average of 0.30
        assert!(policy.release(&book.view(69), &mut cash).is_none());
    }

    #[test]
    fn holds_during_warmup() {
        let mut vol = vec![0.30; 40];
        vol.push(0.10);
        let book = Book::new(&[10.0], &[100.0], vol);
        let mut policy = YieldVolatility::new(TickerId(0), TickerId(0), Default::default());
        let mut cash = CashBucket::new(BucketKind::VolatilityQueue);
        cash.deposit(1_000.0);
        assert!(policy.release(&book.view(40), &mut cash).is_none());
    }

    #[test]
    fn small_queue_stays_as_cash() {
        let book = calm_book();
        let mut policy = YieldVolatility::new(TickerId(1), TickerId(0), Default::default());
        let mut cash = CashBucket::new(BucketKind::VolatilityQueue);
        cash.deposit(100.0);
        assert!(policy.release(&book.view(70), &mut cash).is_none());
        assert_eq!(cash.balance(), 100.0);
    }
}
