//! Reprice stored price rows against a rule book
//!
//! Dry-run by default: counts what would change. With `--apply`, changed
//! records are written to the output CSV.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;

use onroad_pricing::batch::{CsvSink, MemorySink, PriceSink};
use onroad_pricing::loader::{load_price_rows, load_rule_book, DEFAULT_PRICE_ROWS_PATH, DEFAULT_RULE_BOOK_PATH};
use onroad_pricing::{PricingConfig, RepricingRunner};

#[derive(Parser, Debug)]
#[command(name = "reprice_rows", about = "Recompute RTO, insurance and on-road figures for stored price rows", version)]
struct Cli {
    #[arg(long, default_value = DEFAULT_RULE_BOOK_PATH)]
    rules: PathBuf,
    #[arg(long, default_value = DEFAULT_PRICE_ROWS_PATH)]
    rows: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Only reprice rows of this state
    #[arg(long)]
    state: Option<String>,
    /// Rule selection date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    as_of: Option<NaiveDate>,
    /// Write changed records instead of only counting them
    #[arg(long)]
    apply: bool,
    #[arg(long, default_value = "repriced_rows.csv")]
    output: PathBuf,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let start = Instant::now();
    let config = match &cli.config {
        Some(path) => PricingConfig::from_path(path).with_context(|| format!("loading {}", path.display()))?,
        None => PricingConfig::default(),
    };
    let rules = load_rule_book(&cli.rules).with_context(|| format!("loading {}", cli.rules.display()))?;
    let mut rows = load_price_rows(&cli.rows).with_context(|| format!("loading {}", cli.rows.display()))?;
    if let Some(state) = &cli.state {
        rows.retain(|row| row.key.state_code.eq_ignore_ascii_case(state));
    }
    println!(
        "Loaded {} rules and {} rows in {:?}",
        rules.registration.len() + rules.insurance.len(),
        rows.len(),
        start.elapsed()
    );

    let as_of = cli.as_of.unwrap_or_else(|| Local::now().date_naive());
    let runner = RepricingRunner::new(&rules, config, as_of).with_apply(cli.apply);

    let mut sink: Box<dyn PriceSink> = if cli.apply {
        Box::new(CsvSink::create(&cli.output).with_context(|| format!("creating {}", cli.output.display()))?)
    } else {
        Box::new(MemorySink::default())
    };

    let run_start = Instant::now();
    let report = runner.run(&rows, sink.as_mut())?;

    println!(
        "mode={} scanned={} changed={} updated={} skipped={} failed={} flat_rate={} ({:?})",
        if cli.apply { "APPLY" } else { "DRY-RUN" },
        report.scanned,
        report.changed,
        report.updated,
        report.skipped,
        report.failed,
        report.flat_rate,
        run_start.elapsed()
    );
    if cli.apply {
        println!("Records written to: {}", cli.output.display());
    } else {
        println!("Dry-run complete. Add --apply to write records.");
    }

    Ok(())
}
