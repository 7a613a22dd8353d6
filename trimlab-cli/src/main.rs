//! Trimlab CLI: run the profit-trimming strategy grid.
//!
//! Commands:
//! - `run`: load prices, run every variant, print the comparison, save artefacts
//! - `variants`: list the variants a config describes without running them
//! - `init-config`: print the default configuration as TOML

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use trimlab_core::data::{PriceProvider, SyntheticProvider, SyntheticSpec};
use trimlab_runner::{
    enumerate_variants, load_prices, run_grid_with_progress, save_grid, BacktestConfig,
    CsvDirectoryProvider, GridOutcome, LoadOptions,
};

#[derive(Parser)]
#[command(
    name = "trimlab",
    about = "Trimlab CLI: profit-trimming and reinvestment backtester"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full strategy grid.
    Run {
        /// Path to a TOML config file. Defaults to the built-in configuration.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory of `<TICKER>.csv` files with Date and Close columns.
        #[arg(long, conflicts_with = "synthetic")]
        prices: Option<PathBuf>,

        /// Use deterministic synthetic prices instead of a price directory.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Override the start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// Override the end date (YYYY-MM-DD).
        #[arg(long)]
        end: Option<String>,

        /// Run variants one at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Output directory for CSV/JSON artefacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Rows of the comparison table to print (0 prints all).
        #[arg(long, default_value_t = 0)]
        top: usize,
    },
    /// List every variant the config would run.
    Variants {
        /// Path to a TOML config file. Defaults to the built-in configuration.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the default configuration as TOML.
    InitConfig {
        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            prices,
            synthetic,
            start,
            end,
            sequential,
            output_dir,
            top,
        } => run_cmd(RunArgs {
            config,
            prices,
            synthetic,
            start,
            end,
            sequential,
            output_dir,
            top,
        }),
        Commands::Variants { config } => variants_cmd(config.as_deref()),
        Commands::InitConfig { output } => init_config_cmd(output.as_deref()),
    }
}

struct RunArgs {
    config: Option<PathBuf>,
    prices: Option<PathBuf>,
    synthetic: bool,
    start: Option<String>,
    end: Option<String>,
    sequential: bool,
    output_dir: PathBuf,
    top: usize,
}

fn load_config(path: Option<&Path>) -> Result<BacktestConfig> {
    let config = match path {
        Some(p) => BacktestConfig::from_file(p)
            .with_context(|| format!("failed to load config {}", p.display()))?,
        None => BacktestConfig::default(),
    };
    Ok(config)
}

fn parse_date(flag: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("--{flag} must be YYYY-MM-DD, got '{raw}'"))
}

fn run_cmd(args: RunArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(s) = &args.start {
        config.backtest.start_date = parse_date("start", s)?;
    }
    if let Some(e) = &args.end {
        config.backtest.end_date = parse_date("end", e)?;
    }
    if args.sequential {
        config.grid.parallel = false;
    }
    config.validate()?;

    let provider: Box<dyn PriceProvider> = match (&args.prices, args.synthetic) {
        (Some(dir), false) => {
            if !dir.is_dir() {
                bail!("price directory does not exist: {}", dir.display());
            }
            Box::new(CsvDirectoryProvider::new(dir))
        }
        (None, true) => Box::new(SyntheticProvider::new(SyntheticSpec::default())),
        _ => bail!("one of --prices or --synthetic is required"),
    };

    let opts = LoadOptions {
        start: config.backtest.start_date,
        end: config.backtest.end_date,
        min_coverage: config.backtest.min_coverage,
    };
    let prices = load_prices(&config.tickers(), provider.as_ref(), &opts)?;

    let grid = run_grid_with_progress(&config, &prices, |done, total, name| {
        tracing::debug!("[{done}/{total}] {name}");
    })?;

    print_summary(&grid, args.top);

    let written = save_grid(&grid, &prices.table, &args.output_dir)?;
    let fingerprint_path = args.output_dir.join("fingerprint.json");
    let json = serde_json::to_string_pretty(&grid.fingerprint)
        .context("failed to serialize run fingerprint")?;
    std::fs::write(&fingerprint_path, json)
        .with_context(|| format!("failed to write {}", fingerprint_path.display()))?;
    println!(
        "{} artefacts saved to: {}",
        written.len() + 1,
        args.output_dir.display()
    );

    Ok(())
}

fn print_summary(grid: &GridOutcome, top: usize) {
    let fp = &grid.fingerprint;
    println!();
    println!("=== Strategy Grid ===");
    println!("Run ID:         {}", fp.run_id);
    println!("Period:         {} to {}", fp.start_date, fp.end_date);
    println!("Tickers:        {}", fp.tickers.join(", "));
    println!("Ranked by:      {:?}", grid.ranking);
    println!(
        "Variants:       {} ok, {} failed",
        grid.runs.len(),
        grid.failures.len()
    );
    println!();
    println!(
        "{:>3}  {:<36} {:>14} {:>8} {:>7} {:>8} {:>6} {:>12}",
        "#", "Strategy", "Final Value", "CAGR", "Sharpe", "Max DD", "Trims", "Costs+Tax"
    );
    let shown = if top == 0 { grid.runs.len() } else { top };
    for (i, run) in grid.runs.iter().take(shown).enumerate() {
        let r = &run.result;
        println!(
            "{:>3}  {:<36} {:>14.2} {:>7.2}% {:>7.3} {:>7.2}% {:>6} {:>12.2}",
            i + 1,
            r.name,
            r.final_value,
            r.cagr * 100.0,
            r.sharpe,
            r.max_drawdown * 100.0,
            r.trade_count,
            r.total_costs_and_taxes
        );
    }

    if let Some(best) = grid.best() {
        println!();
        println!("Best:           {} ({:?})", best.result.name, grid.ranking);
    }

    for f in &grid.failures {
        println!("FAILED: {}: {}", f.name, f.error);
    }
    for d in &grid.dropped {
        println!("DROPPED: {} ({})", d.ticker, d.reason);
    }
    if grid.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    for warn in &grid.warnings {
        println!("WARNING: {warn}");
    }
    println!();
}

fn variants_cmd(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    config.validate()?;
    let variants = enumerate_variants(&config);
    for v in &variants {
        println!("{:<36} {}", v.name(), v.slug());
    }
    println!("{} variants", variants.len());
    Ok(())
}

fn init_config_cmd(output: Option<&Path>) -> Result<()> {
    let toml = BacktestConfig::default().to_toml()?;
    match output {
        Some(path) => {
            std::fs::write(path, toml)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Default config written to {}", path.display());
        }
        None => print!("{toml}"),
    }
    Ok(())
}
