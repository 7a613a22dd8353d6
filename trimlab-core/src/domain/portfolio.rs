//! Portfolio state: per-ticker positions plus the pool of uninvested cash.

use super::weights::TargetWeights;
use serde::{Deserialize, Serialize};

/// Per-ticker trigger bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerState {
    /// Hysteresis flag for volatility-regime triggers.
    pub trim_active: bool,
    /// Day index of the most recent trim on this ticker.
    pub last_trim_day: Option<usize>,
}

impl TriggerState {
    /// Trading days since the last trim, or `None` if never trimmed.
    pub fn days_since_trim(&self, day: usize) -> Option<usize> {
        self.last_trim_day.map(|last| day.saturating_sub(last))
    }
}

/// Holding in one ticker. Shares are fractional and never negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub shares: f64,
    /// Reference price for unrealized gain. Starts at the entry price and is
    /// raised after threshold trims.
    pub cost_basis: f64,
    pub trigger: TriggerState,
}

impl Position {
    pub fn new(shares: f64, cost_basis: f64) -> Self {
        Self {
            shares,
            cost_basis,
            trigger: TriggerState::default(),
        }
    }

    pub fn is_held(&self) -> bool {
        self.shares > 0.0
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares * price
    }
}

/// What a cash pool is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKind {
    /// Held indefinitely, or a pass-through for immediate modes.
    Idle,
    /// Waiting for the reference ticker to dip.
    AwaitingDip,
    /// Released on a fixed schedule.
    DripQueue,
    /// Released while volatility is below its recent average.
    VolatilityQueue,
}

/// Uninvested proceeds, tagged by the owning policy's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashBucket {
    pub kind: BucketKind,
    balance: f64,
}

impl CashBucket {
    pub fn new(kind: BucketKind) -> Self {
        Self { kind, balance: 0.0 }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn is_empty(&self) -> bool {
        self.balance <= 0.0
    }

    pub fn deposit(&mut self, amount: f64) {
        self.balance += amount;
    }

    /// Withdraw everything, returning the amount removed.
    pub fn drain(&mut self) -> f64 {
        std::mem::take(&mut self.balance)
    }

    /// Withdraw `fraction` of the balance, returning the amount removed.
    pub fn withdraw_fraction(&mut self, fraction: f64) -> f64 {
        let amount = self.balance * fraction.clamp(0.0, 1.0);
        self.balance -= amount;
        amount
    }
}

/// Mutable simulation state. Created from target weights on day zero and
/// mutated once per simulated day.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    /// One position per price table column, indexed by `TickerId`.
    pub positions: Vec<Position>,
    pub cash: CashBucket,
    pub total_transaction_costs: f64,
    pub total_capital_gains_tax: f64,
}

impl PortfolioState {
    /// Invest `capital` according to `weights` at `prices` (day-zero closes).
    /// Each position's cost basis starts at its entry price.
    pub fn allocate(
        capital: f64,
        weights: &TargetWeights,
        prices: &[f64],
        bucket: BucketKind,
    ) -> Self {
        let positions = weights
            .as_slice()
            .iter()
            .zip(prices)
            .map(|(&w, &price)| Position::new(capital * w / price, price))
            .collect();
        Self {
            positions,
            cash: CashBucket::new(bucket),
            total_transaction_costs: 0.0,
            total_capital_gains_tax: 0.0,
        }
    }

    pub fn holdings(&self) -> Vec<f64> {
        self.positions.iter().map(|p| p.shares).collect()
    }

    pub fn invested_value(&self, prices: &[f64]) -> f64 {
        self.positions
            .iter()
            .zip(prices)
            .map(|(p, &price)| p.market_value(price))
            .sum()
    }

    /// Holdings at market plus all queued cash.
    pub fn total_value(&self, prices: &[f64]) -> f64 {
        self.invested_value(prices) + self.cash.balance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_invests_full_capital() {
        let weights = TargetWeights::from_normalized(vec![0.25, 0.75]);
        let state = PortfolioState::allocate(100_000.0, &weights, &[50.0, 200.0], BucketKind::Idle);
        assert!((state.positions[0].shares - 500.0).abs() < 1e-12);
        assert!((state.positions[1].shares - 375.0).abs() < 1e-12);
        assert_eq!(state.positions[0].cost_basis, 50.0);
        assert!((state.total_value(&[50.0, 200.0]) - 100_000.0).abs() < 1e-9);
    }

    #[test]
    fn total_value_includes_cash() {
        let weights = TargetWeights::from_normalized(vec![1.0]);
        let mut state = PortfolioState::allocate(1_000.0, &weights, &[10.0], BucketKind::Idle);
        state.cash.deposit(250.0);
        // 100 shares at 12 + 250 cash
        assert!((state.total_value(&[12.0]) - 1_450.0).abs() < 1e-12);
    }

    #[test]
    fn bucket_withdrawals() {
        let mut bucket = CashBucket::new(BucketKind::DripQueue);
        bucket.deposit(1_000.0);
        assert_eq!(bucket.withdraw_fraction(0.25), 250.0);
        assert_eq!(bucket.balance(), 750.0);
        assert_eq!(bucket.drain(), 750.0);
        assert!(bucket.is_empty());
        assert_eq!(bucket.withdraw_fraction(0.5), 0.0);
    }

    #[test]
    fn days_since_trim() {
        let mut s = TriggerState::default();
        assert_eq!(s.days_since_trim(5), None);
        s.last_trim_day = Some(3);
        assert_eq!(s.days_since_trim(13), Some(10));
    }
}
