//! Export: per-variant CSV/JSON artefacts and the cross-variant comparison.
//!
//! For each successful variant (files prefixed with its slug):
//! - `{slug}_portfolio_value.csv`: date, shares per ticker, cash, total value
//! - `{slug}_trades.csv`: one row per trim
//! - `{slug}_reinvestments.csv`: one row per reinvestment event
//! - `{slug}_weights.csv`: dollar weight per ticker per day
//! - `{slug}_metadata.json`: result record plus run fingerprint
//!
//! Plus `comparison.csv` (all results in ranking order) and `failures.csv`.
//! Persisted JSON carries `schema_version`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use trimlab_core::data::DroppedTicker;
use trimlab_core::domain::{PriceTable, ReinvestmentEvent, TradeEvent};
use trimlab_core::engine::SimulationOutcome;
use trimlab_core::fingerprint::RunFingerprint;

use crate::grid::GridOutcome;
use crate::result::{StrategyResult, VariantFailure, SCHEMA_VERSION};

/// Everything needed to trace one variant's numbers back to its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantMetadata {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub fingerprint: RunFingerprint,
    pub result: StrategyResult,
    pub dropped_tickers: Vec<DroppedTicker>,
    pub data_warnings: Vec<String>,
    pub has_synthetic: bool,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_metadata_json(meta: &VariantMetadata) -> Result<String> {
    serde_json::to_string_pretty(meta).context("failed to serialize variant metadata to JSON")
}

/// Deserialize metadata, rejecting unknown schema versions.
pub fn import_metadata_json(json: &str) -> Result<VariantMetadata> {
    let meta: VariantMetadata =
        serde_json::from_str(json).context("failed to deserialize variant metadata from JSON")?;
    if meta.schema_version > SCHEMA_VERSION || meta.result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            meta.schema_version.max(meta.result.schema_version),
            SCHEMA_VERSION
        );
    }
    Ok(meta)
}

// ─── CSV ────────────────────────────────────────────────────────────

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Daily holdings and value. One share column per ticker, in table order.
pub fn portfolio_value_csv(table: &PriceTable, outcome: &SimulationOutcome) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header = vec!["date".to_string()];
    header.extend(table.tickers().iter().map(|t| format!("{t}_shares")));
    header.extend(["cash".to_string(), "total_value".to_string()]);
    wtr.write_record(&header)?;

    for snap in &outcome.snapshots {
        let mut row = vec![snap.date.to_string()];
        row.extend(snap.holdings.iter().map(|s| format!("{s:.6}")));
        row.push(format!("{:.2}", snap.cash));
        row.push(format!("{:.2}", snap.total_value));
        wtr.write_record(&row)?;
    }
    finish(wtr)
}

/// Dollar weight of each ticker per day, from the snapshot holdings and the
/// day's closes. Cash is the remainder.
pub fn weights_csv(table: &PriceTable, outcome: &SimulationOutcome) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header = vec!["date".to_string()];
    header.extend(table.tickers().iter().map(|t| t.to_string()));
    header.push("cash".to_string());
    wtr.write_record(&header)?;

    for snap in &outcome.snapshots {
        let closes = table.day_closes(snap.day);
        let weight = |v: f64| {
            if snap.total_value > 0.0 {
                v / snap.total_value
            } else {
                0.0
            }
        };
        let mut row = vec![snap.date.to_string()];
        row.extend(
            snap.holdings
                .iter()
                .zip(&closes)
                .map(|(shares, price)| format!("{:.6}", weight(shares * price))),
        );
        row.push(format!("{:.6}", weight(snap.cash)));
        wtr.write_record(&row)?;
    }
    finish(wtr)
}

pub fn trades_csv(trades: &[TradeEvent]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        "day",
        "ticker",
        "shares_sold",
        "price",
        "gross_proceeds",
        "transaction_cost",
        "capital_gains_tax",
        "net_proceeds",
        "realized_gain_pct",
    ])?;
    for t in trades {
        wtr.write_record([
            &t.date.to_string(),
            &t.day.to_string(),
            &t.ticker.to_string(),
            &format!("{:.6}", t.shares_sold),
            &format!("{:.4}", t.price),
            &format!("{:.2}", t.gross_proceeds),
            &format!("{:.2}", t.transaction_cost),
            &format!("{:.2}", t.capital_gains_tax),
            &format!("{:.2}", t.net_proceeds),
            &format!("{:.2}", t.realized_gain_fraction * 100.0),
        ])?;
    }
    finish(wtr)
}

pub fn reinvestments_csv(events: &[ReinvestmentEvent]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        "day",
        "trigger",
        "destinations",
        "amount",
        "transaction_cost",
        "invested",
    ])?;
    for e in events {
        wtr.write_record([
            &e.date.to_string(),
            &e.day.to_string(),
            &e.trigger.label(),
            &e.destinations(),
            &format!("{:.2}", e.amount),
            &format!("{:.2}", e.transaction_cost),
            &format!("{:.2}", e.invested()),
        ])?;
    }
    finish(wtr)
}

/// One flat row of `comparison.csv`.
#[derive(Debug, Serialize)]
struct ComparisonRow<'a> {
    rank: usize,
    name: &'a str,
    slug: &'a str,
    final_value: f64,
    total_return: f64,
    cagr: f64,
    sharpe: f64,
    sortino: f64,
    max_drawdown: f64,
    volatility: f64,
    rolling_cagr_mean: Option<f64>,
    rolling_cagr_std: Option<f64>,
    rolling_drawdown_mean: Option<f64>,
    rolling_drawdown_worst: Option<f64>,
    cagr_ci_lower: Option<f64>,
    cagr_ci_upper: Option<f64>,
    sharpe_ci_lower: Option<f64>,
    sharpe_ci_upper: Option<f64>,
    trade_count: usize,
    reinvestment_count: usize,
    dip_buy_count: usize,
    avg_dip_size: f64,
    total_transaction_costs: f64,
    total_capital_gains_tax: f64,
    total_costs_and_taxes: f64,
    cash_held: f64,
    clipped_returns: usize,
    warnings: String,
}

impl<'a> ComparisonRow<'a> {
    fn new(rank: usize, r: &'a StrategyResult) -> Self {
        Self {
            rank,
            name: &r.name,
            slug: &r.slug,
            final_value: r.final_value,
            total_return: r.total_return,
            cagr: r.cagr,
            sharpe: r.sharpe,
            sortino: r.sortino,
            max_drawdown: r.max_drawdown,
            volatility: r.volatility,
            rolling_cagr_mean: r.rolling.map(|x| x.cagr_mean),
            rolling_cagr_std: r.rolling.map(|x| x.cagr_std),
            rolling_drawdown_mean: r.rolling.map(|x| x.drawdown_mean),
            rolling_drawdown_worst: r.rolling.map(|x| x.drawdown_worst),
            cagr_ci_lower: r.bootstrap.map(|b| b.cagr_ci_lower),
            cagr_ci_upper: r.bootstrap.map(|b| b.cagr_ci_upper),
            sharpe_ci_lower: r.bootstrap.map(|b| b.sharpe_ci_lower),
            sharpe_ci_upper: r.bootstrap.map(|b| b.sharpe_ci_upper),
            trade_count: r.trade_count,
            reinvestment_count: r.reinvestment_count,
            dip_buy_count: r.dip_buy_count,
            avg_dip_size: r.avg_dip_size,
            total_transaction_costs: r.total_transaction_costs,
            total_capital_gains_tax: r.total_capital_gains_tax,
            total_costs_and_taxes: r.total_costs_and_taxes,
            cash_held: r.cash_held,
            clipped_returns: r.clipped_returns,
            warnings: r.warnings.join("; "),
        }
    }
}

/// Results in the given order, ranked from 1.
pub fn comparison_csv<'a>(results: impl IntoIterator<Item = &'a StrategyResult>) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for (i, r) in results.into_iter().enumerate() {
        wtr.serialize(ComparisonRow::new(i + 1, r))?;
    }
    finish(wtr)
}

pub fn failures_csv(failures: &[VariantFailure]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["name", "slug", "error"])?;
    for f in failures {
        wtr.write_record([&f.name, &f.slug, &f.error])?;
    }
    finish(wtr)
}

// ─── Artifact bundle ────────────────────────────────────────────────

fn write(path: PathBuf, contents: &str, written: &mut Vec<PathBuf>) -> Result<()> {
    std::fs::write(&path, contents)
        .with_context(|| format!("failed to write {}", path.display()))?;
    written.push(path);
    Ok(())
}

/// Write every artefact of `grid` into `output_dir` (created if missing).
/// Returns the paths written, comparison first.
pub fn save_grid(grid: &GridOutcome, table: &PriceTable, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;
    let mut written = Vec::new();

    let comparison = comparison_csv(grid.runs.iter().map(|r| &r.result))?;
    write(output_dir.join("comparison.csv"), &comparison, &mut written)?;
    write(
        output_dir.join("failures.csv"),
        &failures_csv(&grid.failures)?,
        &mut written,
    )?;

    for run in &grid.runs {
        let slug = &run.result.slug;
        let file = |suffix: &str| output_dir.join(format!("{slug}_{suffix}"));

        write(
            file("portfolio_value.csv"),
            &portfolio_value_csv(table, &run.outcome)?,
            &mut written,
        )?;
        write(file("trades.csv"), &trades_csv(&run.outcome.trades)?, &mut written)?;
        write(
            file("reinvestments.csv"),
            &reinvestments_csv(&run.outcome.reinvestments)?,
            &mut written,
        )?;
        write(file("weights.csv"), &weights_csv(table, &run.outcome)?, &mut written)?;

        let meta = VariantMetadata {
            schema_version: SCHEMA_VERSION,
            fingerprint: grid.fingerprint.clone(),
            result: run.result.clone(),
            dropped_tickers: grid.dropped.clone(),
            data_warnings: grid.warnings.clone(),
            has_synthetic: grid.has_synthetic,
        };
        write(file("metadata.json"), &export_metadata_json(&meta)?, &mut written)?;
    }

    tracing::info!(
        files = written.len(),
        dir = %output_dir.display(),
        "artefacts written"
    );
    Ok(written)
}

/// Load one variant's metadata back from an output directory.
pub fn load_metadata(output_dir: &Path, slug: &str) -> Result<VariantMetadata> {
    let path = output_dir.join(format!("{slug}_metadata.json"));
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_metadata_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetricsSection;
    use crate::result::VariantRun;
    use crate::runner::{run_variant, RunContext};
    use chrono::{Duration, NaiveDate};
    use trimlab_core::domain::{TargetWeights, Ticker};
    use trimlab_core::engine::{precompute_indicators, SimulationConfig};
    use trimlab_core::fingerprint::{
        ConfigHash, DatasetHash, ReinvestmentMode, StrategyVariant, TrimPolicy,
    };
    use trimlab_core::indicators::IndicatorWindows;

    fn table() -> PriceTable {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..3).map(|i| start + Duration::days(i)).collect();
        PriceTable::new(
            dates,
            vec![
                (Ticker::parse("AAA").unwrap(), vec![100.0, 150.0, 100.0]),
                (Ticker::parse("BBB").unwrap(), vec![50.0, 50.0, 55.0]),
            ],
        )
        .unwrap()
    }

    fn run(table: &PriceTable, reinvestment: ReinvestmentMode) -> VariantRun {
        let windows = IndicatorWindows {
            moving_average: 5,
            momentum: 2,
            volatility: 3,
            volatility_median: 3,
        };
        let indicators = precompute_indicators(table, &windows);
        let weights = TargetWeights::equal(2);
        let metrics = MetricsSection {
            bootstrap_iterations: 100,
            rolling_window: 2,
            ..MetricsSection::default()
        };
        let ctx = RunContext {
            table,
            indicators: &indicators,
            weights: &weights,
            simulation: SimulationConfig::default(),
            metrics: &metrics,
        };
        let variant = StrategyVariant {
            trim: TrimPolicy::Threshold { threshold: 0.5 },
            reinvestment,
        };
        run_variant(&ctx, &variant).unwrap()
    }

    fn grid(table: &PriceTable) -> GridOutcome {
        GridOutcome {
            runs: vec![
                run(table, ReinvestmentMode::ProRata),
                run(table, ReinvestmentMode::Cash),
            ],
            failures: vec![VariantFailure {
                name: "Trim@+50% (spy)".into(),
                slug: "trim_50pct_spy".into(),
                error: "single target references ticker SPY, which is not in the price table"
                    .into(),
            }],
            ranking: Default::default(),
            fingerprint: RunFingerprint::new(
                ConfigHash::from_bytes(b"config"),
                DatasetHash::of_table(table),
                42,
                table,
                100_000.0,
            ),
            dropped: vec![],
            warnings: vec![],
            has_synthetic: false,
        }
    }

    #[test]
    fn portfolio_value_has_share_columns_per_ticker() {
        let t = table();
        let r = run(&t, ReinvestmentMode::Cash);
        let csv = portfolio_value_csv(&t, &r.outcome).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "date,AAA_shares,BBB_shares,cash,total_value");
        assert_eq!(lines.len(), 4);
        // 500 AAA shares less 20% trimmed at 150 on day 1
        assert_eq!(lines[2], "2024-01-02,400.000000,1000.000000,15000.00,125000.00");
        assert_eq!(lines[3], "2024-01-03,400.000000,1000.000000,15000.00,110000.00");
    }

    #[test]
    fn weights_sum_to_one_each_day() {
        let t = table();
        let r = run(&t, ReinvestmentMode::Cash);
        let csv = weights_csv(&t, &r.outcome).unwrap();
        for line in csv.lines().skip(1) {
            let sum: f64 = line
                .split(',')
                .skip(1)
                .map(|v| v.parse::<f64>().unwrap())
                .sum();
            assert!((sum - 1.0).abs() < 1e-5, "weights sum {sum} in {line}");
        }
    }

    #[test]
    fn trades_and_reinvestments_rows() {
        let t = table();
        let r = run(&t, ReinvestmentMode::ProRata);
        let trades = trades_csv(&r.outcome.trades).unwrap();
        assert_eq!(trades.lines().count(), 2);
        assert!(trades.lines().nth(1).unwrap().starts_with("2024-01-02,1,AAA,100.000000,150.0000,15000.00"));

        let reinvest = reinvestments_csv(&r.outcome.reinvestments).unwrap();
        assert_eq!(reinvest.lines().count(), 2);
        assert!(reinvest.lines().nth(1).unwrap().contains("immediate,AAA|BBB"));
    }

    #[test]
    fn comparison_ranks_in_given_order() {
        let t = table();
        let g = grid(&t);
        let csv = comparison_csv(g.runs.iter().map(|r| &r.result)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("rank,name,slug,final_value"));
        assert!(lines[1].starts_with("1,Trim@+50% (pro-rata),trim_50pct_pro_rata,"));
        assert!(lines[2].starts_with("2,Trim@+50% (cash),trim_50pct_cash,"));
    }

    #[test]
    fn metadata_rejects_newer_schema() {
        let t = table();
        let g = grid(&t);
        let mut meta = VariantMetadata {
            schema_version: SCHEMA_VERSION,
            fingerprint: g.fingerprint.clone(),
            result: g.runs[0].result.clone(),
            dropped_tickers: vec![],
            data_warnings: vec![],
            has_synthetic: false,
        };
        let json = export_metadata_json(&meta).unwrap();
        let back = import_metadata_json(&json).unwrap();
        assert_eq!(back.result.slug, meta.result.slug);
        assert_eq!(back.fingerprint, meta.fingerprint);

        meta.schema_version = SCHEMA_VERSION + 1;
        let json = export_metadata_json(&meta).unwrap();
        assert!(import_metadata_json(&json).is_err());
    }

    #[test]
    fn save_grid_writes_full_bundle() {
        let t = table();
        let g = grid(&t);
        let dir = tempfile::tempdir().unwrap();
        let written = save_grid(&g, &t, dir.path()).unwrap();

        // comparison + failures + 5 files per variant
        assert_eq!(written.len(), 2 + 5 * 2);
        for path in &written {
            assert!(path.exists(), "{} missing", path.display());
        }
        let failures = std::fs::read_to_string(dir.path().join("failures.csv")).unwrap();
        assert_eq!(failures.lines().count(), 2);

        let meta = load_metadata(dir.path(), "trim_50pct_cash").unwrap();
        assert_eq!(meta.result.name, "Trim@+50% (cash)");
        assert_eq!(meta.result.trade_count, 1);
        assert!((meta.result.final_value - 110_000.0).abs() < 1e-6);
        assert_eq!(meta.fingerprint, g.fingerprint);
    }
}
