//! Day-by-day simulation loop.
//!
//! Five phases per day:
//! 1. Queue releases: the reinvestment policy's start-of-day hook
//! 2. Trims: evaluate the trigger for every held ticker, sell a slice
//! 3. Routing: hand each trim's net proceeds to the reinvestment policy
//! 4. Cost basis reset for triggers that ask for it
//! 5. Snapshot and reconciliation

use super::accounting::{verify_reconciliation, TrimProceeds};
use super::state::{DailySnapshot, SimulationConfig, SimulationError, SimulationOutcome};
use crate::components::indicator::IndicatorSet;
use crate::components::reinvest::{Deployment, MarketView, ReinvestmentPolicy};
use crate::components::trigger::{TriggerContext, TrimTrigger};
use crate::domain::{
    PortfolioState, PriceTable, ReinvestmentEvent, TargetWeights, TickerId, TradeEvent,
};

/// Run one strategy over `table`.
///
/// The portfolio starts fully invested at `weights` on day zero's closes.
/// Trigger and policy are used for this run only; the policy must be fresh.
/// Returns an `InvariantViolation` as soon as holdings or cash go negative or
/// the day's value fails to reconcile.
pub fn simulate(
    table: &PriceTable,
    indicators: &IndicatorSet,
    weights: &TargetWeights,
    trigger: &dyn TrimTrigger,
    policy: &mut dyn ReinvestmentPolicy,
    config: &SimulationConfig,
) -> Result<SimulationOutcome, SimulationError> {
    validate_config(config)?;
    let tickers = table.ticker_count();
    if weights.as_slice().len() != tickers || indicators.len() != tickers {
        return Err(SimulationError::WeightsMismatch {
            weights: weights.as_slice().len(),
            tickers,
        });
    }

    let mut state = PortfolioState::allocate(
        config.initial_capital,
        weights,
        &table.day_closes(0),
        policy.bucket_kind(),
    );
    let mut snapshots = Vec::with_capacity(table.len());
    let mut trades = Vec::new();
    let mut reinvestments = Vec::new();

    for day in 0..table.len() {
        let date = table.date(day);
        let prices = table.day_closes(day);
        let opening_value = state.total_value(&prices);
        let mut frictions = 0.0;

        // ─── Phase 1: Queue releases ───
        let release = {
            let view = MarketView {
                day,
                prices: &prices,
                positions: &state.positions,
                indicators,
            };
            policy.release(&view, &mut state.cash)
        };
        if let Some(deployment) = release {
            let event = execute_deployment(&mut state, table, &prices, day, deployment, config);
            frictions += event.transaction_cost;
            reinvestments.push(event);
        }

        for id in table.ticker_ids() {
            let price = prices[id.index()];

            // ─── Phase 2: Trims ───
            let proceeds = {
                let position = &mut state.positions[id.index()];
                if !position.is_held() {
                    continue;
                }
                let ctx = TriggerContext {
                    day,
                    price,
                    cost_basis: position.cost_basis,
                    indicators: indicators.ticker(id),
                };
                if !trigger.should_trim(&ctx, &mut position.trigger) {
                    continue;
                }
                let proceeds = TrimProceeds::compute(
                    position.shares * config.trim_fraction,
                    price,
                    position.cost_basis,
                    &config.costs,
                );
                position.shares -= proceeds.shares;
                position.trigger.last_trim_day = Some(day);
                trades.push(TradeEvent {
                    day,
                    date,
                    ticker: table.ticker(id).clone(),
                    shares_sold: proceeds.shares,
                    price,
                    gross_proceeds: proceeds.gross,
                    transaction_cost: proceeds.transaction_cost,
                    capital_gains_tax: proceeds.capital_gains_tax,
                    net_proceeds: proceeds.net,
                    realized_gain_fraction: ctx.gain_fraction(),
                });
                proceeds
            };
            tracing::debug!(
                %date,
                ticker = %table.ticker(id),
                trigger = trigger.name(),
                shares = proceeds.shares,
                net = proceeds.net,
                "trim"
            );
            frictions += proceeds.frictions();
            state.total_transaction_costs += proceeds.transaction_cost;
            state.total_capital_gains_tax += proceeds.capital_gains_tax;

            // ─── Phase 3: Routing ───
            let routed = {
                let view = MarketView {
                    day,
                    prices: &prices,
                    positions: &state.positions,
                    indicators,
                };
                policy.allocate(proceeds.net, &view, &mut state.cash)
            };
            if let Some(deployment) = routed {
                let event = execute_deployment(&mut state, table, &prices, day, deployment, config);
                frictions += event.transaction_cost;
                reinvestments.push(event);
            }

            // ─── Phase 4: Cost basis reset ───
            if trigger.resets_cost_basis() {
                state.positions[id.index()].cost_basis = price * config.cost_basis_markup;
            }
        }

        // ─── Phase 5: Snapshot and reconciliation ───
        let total_value = state.total_value(&prices);
        let violation = |detail: String| SimulationError::InvariantViolation { day, date, detail };
        if let Some((i, p)) = state
            .positions
            .iter()
            .enumerate()
            .find(|(_, p)| p.shares < 0.0 || !p.shares.is_finite())
        {
            return Err(violation(format!(
                "holding of {} is {}",
                table.ticker(TickerId(i)),
                p.shares
            )));
        }
        if state.cash.balance() < 0.0 || !state.cash.balance().is_finite() {
            return Err(violation(format!("cash balance is {}", state.cash.balance())));
        }
        verify_reconciliation(
            opening_value,
            frictions,
            total_value,
            config.reconciliation_tolerance,
        )
        .map_err(violation)?;

        snapshots.push(DailySnapshot {
            day,
            date,
            holdings: state.holdings(),
            cash: state.cash.balance(),
            total_value,
        });
    }

    Ok(SimulationOutcome {
        snapshots,
        trades,
        reinvestments,
        total_transaction_costs: state.total_transaction_costs,
        total_capital_gains_tax: state.total_capital_gains_tax,
    })
}

/// Buy according to `deployment`, deducting the buy-side transaction cost.
fn execute_deployment(
    state: &mut PortfolioState,
    table: &PriceTable,
    prices: &[f64],
    day: usize,
    deployment: Deployment,
    config: &SimulationConfig,
) -> ReinvestmentEvent {
    let transaction_cost = config.costs.buy_cost(deployment.amount);
    let invested = deployment.amount - transaction_cost;
    let mut allocations = Vec::with_capacity(deployment.weights.len());
    for &(id, weight) in &deployment.weights {
        if weight <= 0.0 {
            continue;
        }
        state.positions[id.index()].shares += invested * weight / prices[id.index()];
        allocations.push((table.ticker(id).clone(), deployment.amount * weight));
    }
    state.total_transaction_costs += transaction_cost;

    let event = ReinvestmentEvent {
        day,
        date: table.date(day),
        allocations,
        amount: deployment.amount,
        transaction_cost,
        trigger: deployment.trigger,
    };
    tracing::debug!(
        date = %event.date,
        amount = event.amount,
        to = %event.destinations(),
        trigger = %event.trigger.label(),
        "reinvest"
    );
    event
}

fn validate_config(config: &SimulationConfig) -> Result<(), SimulationError> {
    let checks = [
        (
            config.initial_capital.is_finite() && config.initial_capital > 0.0,
            "initial_capital must be positive",
        ),
        (
            config.trim_fraction > 0.0 && config.trim_fraction < 1.0,
            "trim_fraction must be in (0, 1)",
        ),
        (
            config.cost_basis_markup.is_finite() && config.cost_basis_markup > 0.0,
            "cost_basis_markup must be positive",
        ),
        (
            (0.0..1.0).contains(&config.costs.transaction_cost_rate),
            "transaction_cost_rate must be in [0, 1)",
        ),
        (
            (0.0..1.0).contains(&config.costs.capital_gains_tax_rate),
            "capital_gains_tax_rate must be in [0, 1)",
        ),
        (
            config.reconciliation_tolerance > 0.0,
            "reconciliation_tolerance must be positive",
        ),
    ];
    match checks.iter().find(|(ok, _)| !ok) {
        Some((_, message)) => Err(SimulationError::InvalidConfig((*message).to_string())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::reinvest::{HoldCash, ProRata};
    use crate::components::trigger::{BuyAndHold, ThresholdTrigger};
    use crate::components::TickerIndicators;
    use crate::domain::Ticker;
    use chrono::{Duration, NaiveDate};

    fn single(closes: Vec<f64>) -> (PriceTable, IndicatorSet) {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..closes.len()).map(|i| start + Duration::days(i as i64)).collect();
        let table = PriceTable::new(dates, vec![(Ticker::parse("AAA").unwrap(), closes)]).unwrap();
        (table, IndicatorSet::new(vec![TickerIndicators::default()]))
    }

    #[test]
    fn buy_and_hold_tracks_price() {
        let (table, ind) = single(vec![100.0, 110.0, 90.0]);
        let out = simulate(
            &table,
            &ind,
            &TargetWeights::equal(1),
            &BuyAndHold,
            &mut HoldCash,
            &SimulationConfig::default(),
        )
        .unwrap();
        let values = out.value_series();
        assert!((values[0] - 100_000.0).abs() < 1e-9);
        assert!((values[1] - 110_000.0).abs() < 1e-9);
        assert!((values[2] - 90_000.0).abs() < 1e-9);
        assert_eq!(out.trade_count(), 0);
    }

    #[test]
    fn threshold_trim_into_cash() {
        let (table, ind) = single(vec![100.0, 150.0, 100.0]);
        let out = simulate(
            &table,
            &ind,
            &TargetWeights::equal(1),
            &ThresholdTrigger::new(0.5),
            &mut HoldCash,
            &SimulationConfig::default(),
        )
        .unwrap();
        assert_eq!(out.trade_count(), 1);
        let trade = &out.trades[0];
        assert_eq!(trade.day, 1);
        assert!((trade.shares_sold - 200.0).abs() < 1e-9);
        assert!((out.final_cash() - 30_000.0).abs() < 1e-9);
        // 800 shares * 100 + 30_000 cash
        assert!((out.final_value() - 110_000.0).abs() < 1e-9);
    }

    #[test]
    fn pro_rata_single_ticker_buys_back() {
        let (table, ind) = single(vec![100.0, 150.0]);
        let out = simulate(
            &table,
            &ind,
            &TargetWeights::equal(1),
            &ThresholdTrigger::new(0.5),
            &mut ProRata,
            &SimulationConfig::default(),
        )
        .unwrap();
        assert_eq!(out.reinvestments.len(), 1);
        assert_eq!(out.final_cash(), 0.0);
        assert!((out.snapshots[1].holdings[0] - 1_000.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_bad_config() {
        let (table, ind) = single(vec![100.0]);
        let config = SimulationConfig {
            trim_fraction: 1.5,
            ..Default::default()
        };
        let err = simulate(
            &table,
            &ind,
            &TargetWeights::equal(1),
            &BuyAndHold,
            &mut HoldCash,
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, SimulationError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_weight_count_mismatch() {
        let (table, ind) = single(vec![100.0]);
        let err = simulate(
            &table,
            &ind,
            &TargetWeights::equal(2),
            &BuyAndHold,
            &mut HoldCash,
            &SimulationConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SimulationError::WeightsMismatch { .. }));
    }
}
