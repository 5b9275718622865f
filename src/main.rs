//! Cellar-Gap main entry point
//!
//! This is the command-line interface for the Cellar-Gap price comparison.

use anyhow::Context;
use cellar_gap::config::{
    load_locale_config_with_hash, validate_crawler_config, CrawlerConfig, ExchangeRate, Locale,
    DEFAULT_EUR_TO_GBP,
};
use cellar_gap::crawler::{ingest, LocaleSource};
use cellar_gap::output::{
    compare, load_statistics, print_statistics, write_report, ComparisonRequest,
};
use cellar_gap::storage::{open_storage, SqliteStorage};
use chrono::NaiveDate;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Cellar-Gap: cross-locale wine price comparison
///
/// Cellar-Gap crawls the English and Italian storefronts of the same wine
/// shop, stores one snapshot per locale and day, and reports the wines whose
/// price gap between the two stays under a threshold.
#[derive(Parser, Debug)]
#[command(name = "cellar-gap")]
#[command(version = "1.0.0")]
#[command(about = "Cross-locale wine price comparison", long_about = None)]
struct Cli {
    /// Locale document listing the English categories
    #[arg(long, value_name = "PATH", default_value = "eng.json")]
    eng: PathBuf,

    /// Locale document listing the Italian categories
    #[arg(long, value_name = "PATH", default_value = "ita.json")]
    ita: PathBuf,

    /// EUR to GBP change rate
    #[arg(long, env = "EUR_TO_GBP", default_value_t = DEFAULT_EUR_TO_GBP)]
    rate: f64,

    /// Last page to visit per category (0 visits every page)
    #[arg(long, default_value_t = 0)]
    max_page: u32,

    /// Consecutive timeouts tolerated on one page
    #[arg(long, default_value_t = 3)]
    max_timeouts: u32,

    /// Maximum price difference (preferred minus compare)
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    max_diff: f64,

    /// Locale whose prices are the reference
    #[arg(long, default_value = "eng")]
    preferred: Locale,

    /// Locale to compare against
    #[arg(long, default_value = "ita")]
    compare: Locale,

    /// Snapshot date (YYYY-MM-DD), today by default
    #[arg(long)]
    date: Option<NaiveDate>,

    /// CSV output file, output_<date>.csv by default
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// SQLite database holding the snapshots
    #[arg(long, env = "CELLAR_DATABASE", default_value = "cellar.db")]
    database: PathBuf,

    /// Skip ingestion and run the comparison only
    #[arg(long)]
    no_ingest: bool,

    /// Show statistics from the database and exit
    #[arg(long)]
    stats: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let snapshot_date = cli
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    tracing::info!("Opening database: {}", cli.database.display());
    let mut storage = open_storage(&cli.database)
        .with_context(|| format!("failed to open database {}", cli.database.display()))?;

    if cli.stats {
        handle_stats(&storage, snapshot_date)?;
        return Ok(());
    }

    let rate = ExchangeRate::new(cli.rate).context("invalid --rate")?;

    if cli.no_ingest {
        tracing::info!("Skipping ingestion, comparing stored data only");
    } else {
        handle_ingest(&cli, &mut storage, &rate, snapshot_date).await?;
    }

    let out = cli
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("output_{}.csv", snapshot_date)));
    handle_compare(&cli, &storage, snapshot_date, &out)?;

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("cellar_gap=info,warn"),
            1 => EnvFilter::new("cellar_gap=debug,info"),
            2 => EnvFilter::new("cellar_gap=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds the crawler configuration from the command line
fn crawler_config(cli: &Cli) -> anyhow::Result<CrawlerConfig> {
    let config = CrawlerConfig {
        max_timeouts: cli.max_timeouts,
        max_page: (cli.max_page > 0).then_some(cli.max_page),
        ..CrawlerConfig::default()
    };
    validate_crawler_config(&config).context("invalid crawler options")?;
    Ok(config)
}

/// Loads the locale document of `locale` from `path`
fn load_source(locale: Locale, path: &Path) -> anyhow::Result<LocaleSource> {
    tracing::info!("Loading {} categories from: {}", locale, path.display());
    let (config, config_hash) = load_locale_config_with_hash(path)
        .with_context(|| format!("failed to load {} locale document {}", locale, path.display()))?;
    tracing::info!(
        "{} categories loaded for {} (hash: {})",
        config.categories.len(),
        locale,
        config_hash
    );
    Ok(LocaleSource {
        locale,
        config,
        config_hash,
    })
}

/// Handles ingestion of both locales for the snapshot date
async fn handle_ingest(
    cli: &Cli,
    storage: &mut SqliteStorage,
    rate: &ExchangeRate,
    snapshot_date: NaiveDate,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = crawler_config(cli)?;
    let sources = vec![
        load_source(Locale::Italian, &cli.ita)?,
        load_source(Locale::English, &cli.eng)?,
    ];

    tracing::info!(
        "Ingesting snapshot {} (rate {}, max page {:?})",
        snapshot_date,
        rate.value(),
        config.max_page
    );

    match ingest(storage, &sources, &config, rate, snapshot_date).await {
        Ok(summary) => {
            tracing::info!(
                "Ingestion completed: {} items inserted, {} already present",
                summary.inserted(),
                summary.already_present()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Ingestion failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the comparison and writes the report
fn handle_compare(
    cli: &Cli,
    storage: &SqliteStorage,
    snapshot_date: NaiveDate,
    out: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = ComparisonRequest {
        preferred: cli.preferred,
        compare: cli.compare,
        snapshot_date,
        max_diff: cli.max_diff,
    };

    let rows = compare(storage, &request)?;
    write_report(out, request.preferred, request.compare, &rows)
        .with_context(|| format!("failed to write report {}", out.display()))?;

    tracing::info!("{} items reported to {}", rows.len(), out.display());
    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(
    storage: &SqliteStorage,
    snapshot_date: NaiveDate,
) -> Result<(), Box<dyn std::error::Error>> {
    let stats = load_statistics(storage, snapshot_date)?;
    print_statistics(&stats);
    Ok(())
}
