//! BDD tests for the strategy grid runner.
//!
//! These tests verify the end-to-end flow:
//! - TOML config → price loading → grid → ranked comparison
//! - Dropped tickers are reported and the run continues
//! - Failing variants are isolated from the rest of the grid
//! - Every persisted artefact is written

use chrono::NaiveDate;
use trimlab_core::data::{DropReason, SyntheticProvider, SyntheticSpec};
use trimlab_runner::data_loader::{load_prices, LoadOptions, LoadedPrices};
use trimlab_runner::{run_grid, save_grid, BacktestConfig, FitnessMetric};

const CONFIG: &str = r#"
[backtest]
initial_capital = 100000.0
start_date = "2023-01-02"
end_date = "2023-12-29"
trim_fraction = 0.2
transaction_cost_rate = 0.001
capital_gains_tax_rate = 0.15

[portfolio.weights]
SPY = 0.5
QQQ = 0.3
AAPL = 0.2

[indicators]
moving_average = 50
momentum = 10
volatility = 10
volatility_median = 40

[triggers]
families = ["threshold", "momentum", "volatility"]
thresholds = [0.05, 0.1]
momentum_multipliers = [1.02]
volatility_entries = [1.2]

[reinvestment]
modes = ["cash", "pro_rata", "single_target", "drip", "dip_buy", "yield_volatility"]

[reinvestment.drip.params]
normalization_lookback = 20

[reinvestment.yield_volatility.params]
warmup_days = 20

[metrics]
bootstrap_iterations = 200
rolling_window = 63

[grid]
ranking = "final_value"
"#;

fn config() -> BacktestConfig {
    let config = BacktestConfig::from_toml(CONFIG).expect("config should parse");
    config.validate().expect("config should validate");
    config
}

fn load(config: &BacktestConfig) -> LoadedPrices {
    let provider = SyntheticProvider::new(SyntheticSpec {
        spread: 0.04,
        ..SyntheticSpec::default()
    });
    let opts = LoadOptions {
        start: config.backtest.start_date,
        end: config.backtest.end_date,
        min_coverage: config.backtest.min_coverage,
    };
    load_prices(&config.tickers(), &provider, &opts).expect("synthetic prices should load")
}

#[test]
fn bdd_scenario_full_grid_is_ranked_by_final_value() {
    // GIVEN a config with 4 trigger settings and 6 modes plus the baseline
    let config = config();
    let prices = load(&config);

    // WHEN the grid runs
    let grid = run_grid(&config, &prices).expect("grid should run");

    // THEN every variant succeeds
    assert!(grid.failures.is_empty(), "failures: {:?}", grid.failures);
    assert_eq!(grid.runs.len(), 1 + 4 * 6);

    // AND results are sorted best first
    for pair in grid.runs.windows(2) {
        assert!(pair[0].result.final_value >= pair[1].result.final_value);
    }

    // AND the baseline is present and never trades
    let baseline = grid.get("buy_and_hold").expect("baseline present");
    assert_eq!(baseline.result.trade_count, 0);
    assert_eq!(baseline.result.total_costs_and_taxes, 0.0);

    // AND the run is tagged synthetic
    assert!(grid.has_synthetic);
    assert_eq!(grid.fingerprint.dataset_hash, prices.dataset_hash);
}

#[test]
fn bdd_scenario_metrics_are_self_consistent() {
    // GIVEN a completed grid
    let config = config();
    let grid = run_grid(&config, &load(&config)).unwrap();

    for run in &grid.runs {
        let r = &run.result;
        // THEN max drawdown is never positive
        assert!(r.max_drawdown <= 0.0, "{}: drawdown {}", r.name, r.max_drawdown);

        // AND the proceeds identity holds per trade
        for t in &run.outcome.trades {
            assert!((t.recomputed_net() - t.net_proceeds).abs() < 1e-6);
            assert!(t.capital_gains_tax >= 0.0);
        }

        // AND friction totals match the events
        let taxes: f64 = run.outcome.trades.iter().map(|t| t.capital_gains_tax).sum();
        assert!((taxes - r.total_capital_gains_tax).abs() < 1e-6);

        // AND rolling and bootstrap statistics are present for a year of data
        let rolling = r.rolling.expect("rolling metrics present");
        assert!(rolling.drawdown_worst >= r.max_drawdown - 1e-12);
        let ci = r.bootstrap.expect("bootstrap present");
        assert!(ci.cagr_ci_lower <= ci.cagr_ci_upper);

        // AND the point CAGR lies inside its own bootstrap interval
        assert_eq!(
            r.cagr_within_ci(),
            Some(true),
            "{}: cagr {} outside [{}, {}]",
            r.name,
            r.cagr,
            ci.cagr_ci_lower,
            ci.cagr_ci_upper
        );
    }
}

#[test]
fn bdd_scenario_nearby_parameters_keep_separate_artefacts() {
    // GIVEN thresholds and momentum multipliers that differ past one decimal
    let mut config = config();
    config.triggers.thresholds = vec![0.101, 0.104];
    config.triggers.momentum_multipliers = vec![1.02, 1.05];
    config.validate().expect("distinct parameters validate");
    let prices = load(&config);

    // WHEN the grid runs and its artefacts are saved
    let grid = run_grid(&config, &prices).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let written = save_grid(&grid, &prices.table, dir.path()).unwrap();

    // THEN every variant has its own slug
    assert_eq!(grid.runs.len() + grid.failures.len(), 1 + 5 * 6);
    let mut slugs: Vec<&str> = grid.runs.iter().map(|r| r.result.slug.as_str()).collect();
    slugs.sort_unstable();
    slugs.dedup();
    assert_eq!(slugs.len(), grid.runs.len());

    // AND no file was written twice
    let on_disk = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(on_disk, written.len());
    assert!(grid.get("momentum_guided_1_05x_cash").is_some());
    assert!(grid.get("trim_10_4pct_drip").is_some());
}

#[test]
fn bdd_scenario_lower_threshold_trims_at_least_as_often() {
    // GIVEN two threshold variants on the same prices and mode
    let config = config();
    let grid = run_grid(&config, &load(&config)).unwrap();

    // WHEN comparing their trade counts
    let low = grid.get("trim_5pct_cash").expect("5% variant");
    let high = grid.get("trim_10pct_cash").expect("10% variant");

    // THEN the lower threshold trims at least as often
    assert!(low.result.trade_count >= high.result.trade_count);
    assert!(low.result.trade_count > 0);
}

#[test]
fn bdd_scenario_missing_ticker_is_dropped_and_run_continues() {
    // GIVEN a CSV directory holding only SPY and QQQ
    let config = config();
    let prices = load(&config);
    let dir = tempfile::tempdir().unwrap();
    for symbol in ["SPY", "QQQ"] {
        let id = prices.table.ticker_id(symbol).unwrap();
        let mut body = String::from("Date,Close\n");
        for (date, close) in prices.table.dates().iter().zip(prices.table.column(id)) {
            body.push_str(&format!("{date},{close}\n"));
        }
        std::fs::write(dir.path().join(format!("{symbol}.csv")), body).unwrap();
    }
    let provider = trimlab_runner::CsvDirectoryProvider::new(dir.path());
    let opts = LoadOptions {
        start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        min_coverage: 0.95,
    };

    // WHEN prices load
    let loaded = load_prices(&config.tickers(), &provider, &opts).unwrap();

    // THEN AAPL is dropped with a reason
    assert_eq!(loaded.dropped.len(), 1);
    assert_eq!(loaded.dropped[0].ticker.as_str(), "AAPL");
    assert_eq!(loaded.dropped[0].reason, DropReason::NoData);

    // AND the grid still runs on the remaining tickers
    let grid = run_grid(&config, &loaded).unwrap();
    assert!(grid.failures.is_empty());
    assert_eq!(grid.dropped.len(), 1);
    assert!(grid.warnings.iter().any(|w| w.contains("AAPL")));
}

#[test]
fn bdd_scenario_policy_error_fails_only_its_variants() {
    // GIVEN a single-target mode pointing at a ticker that is not loaded
    let mut config = config();
    config.reinvestment.single_target = "IWM".into();
    let prices = load(&config);

    // WHEN the grid runs
    let grid = run_grid(&config, &prices).unwrap();

    // THEN exactly the single-target variants fail
    assert_eq!(grid.failures.len(), 4);
    assert!(grid.failures.iter().all(|f| f.name.ends_with("(iwm)")));
    assert!(grid.failures.iter().all(|f| f.error.contains("IWM")));

    // AND the rest complete
    assert_eq!(grid.runs.len(), 1 + 4 * 5);
}

#[test]
fn bdd_scenario_ranking_by_volatility_is_ascending() {
    // GIVEN a grid ranked by volatility
    let mut config = config();
    config.grid.ranking = FitnessMetric::Volatility;

    // WHEN it runs
    let grid = run_grid(&config, &load(&config)).unwrap();

    // THEN the calmest variant comes first
    for pair in grid.runs.windows(2) {
        assert!(pair[0].result.volatility <= pair[1].result.volatility);
    }
}

#[test]
fn bdd_scenario_artefacts_written_for_every_variant() {
    // GIVEN a completed grid
    let config = config();
    let prices = load(&config);
    let grid = run_grid(&config, &prices).unwrap();

    // WHEN artefacts are saved
    let dir = tempfile::tempdir().unwrap();
    let written = save_grid(&grid, &prices.table, dir.path()).unwrap();

    // THEN the comparison lists every variant in ranking order
    assert_eq!(written.len(), 2 + 5 * grid.runs.len());
    let comparison = std::fs::read_to_string(dir.path().join("comparison.csv")).unwrap();
    assert_eq!(comparison.lines().count(), 1 + grid.runs.len());
    let first = comparison.lines().nth(1).unwrap();
    assert!(first.starts_with(&format!("1,{},{}", grid.runs[0].result.name, grid.runs[0].result.slug)));

    // AND each portfolio value file has one row per day
    let slug = &grid.runs[0].result.slug;
    let values =
        std::fs::read_to_string(dir.path().join(format!("{slug}_portfolio_value.csv"))).unwrap();
    assert_eq!(values.lines().count(), 1 + prices.table.len());
}
