//! Octo-Trawl main entry point
//!
//! Command-line interface for the GitHub collections harvester.

use clap::Parser;
use octo_trawl::config::{load_config, validate, Config};
use octo_trawl::crawler::{crawl, CrawlOutcome};
use std::path::PathBuf;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Octo-Trawl: a GitHub collections harvester
///
/// Crawls the paginated collections directory, follows every collection to
/// its repositories and every repository through its file tree, and exports
/// collection, repository, and file records to CSV.
#[derive(Parser, Debug)]
#[command(name = "octo-trawl")]
#[command(version)]
#[command(about = "A GitHub collections harvester", long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Seed URL (defaults to the collection-index root)
    #[arg(long, value_name = "URL")]
    seed: Option<String>,

    /// Initial inter-request delay in milliseconds
    #[arg(long, value_name = "MS")]
    start_delay_ms: Option<u64>,

    /// Maximum inter-request delay in milliseconds
    #[arg(long, value_name = "MS")]
    max_delay_ms: Option<u64>,

    /// Average in-flight requests the throttle converges toward
    #[arg(long, value_name = "N")]
    target_concurrency: Option<f64>,

    /// Hard cap on simultaneous in-flight fetches
    #[arg(long, value_name = "N")]
    max_in_flight: Option<u32>,

    /// Directory receiving collections.csv, repositories.csv, and files.csv
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

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

    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    tracing::info!(
        "Seed: {}, governor: start {}ms / max {}ms / target {} / cap {}",
        config.crawler.seed_url,
        config.governor.start_delay_ms,
        config.governor.max_delay_ms,
        config.governor.target_concurrency,
        config.governor.max_in_flight
    );

    // Ctrl-C drains the crawl instead of killing it mid-write
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight fetches");
            let _ = stop_tx.send(true);
        }
    });

    let report = match crawl(config, stop_rx).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    if report.outcome == CrawlOutcome::Interrupted {
        tracing::warn!("Crawl interrupted before completion");
        std::process::exit(130);
    }

    tracing::info!("Crawl completed successfully");
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("octo_trawl=info,warn"),
            1 => EnvFilter::new("octo_trawl=debug,info"),
            2 => EnvFilter::new("octo_trawl=trace,debug"),
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

/// Builds the effective config: file (or defaults), then CLI overrides
fn build_config(cli: &Cli) -> Result<Config, octo_trawl::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)?
        }
        None => Config::default(),
    };

    if let Some(seed) = &cli.seed {
        config.crawler.seed_url = seed.clone();
    }
    if let Some(ms) = cli.start_delay_ms {
        config.governor.start_delay_ms = ms;
    }
    if let Some(ms) = cli.max_delay_ms {
        config.governor.max_delay_ms = ms;
    }
    if let Some(target) = cli.target_concurrency {
        config.governor.target_concurrency = target;
    }
    if let Some(cap) = cli.max_in_flight {
        config.governor.max_in_flight = cap;
    }
    if let Some(dir) = &cli.output_dir {
        config.output.collections_path = dir.join("collections.csv").to_string_lossy().into_owned();
        config.output.repositories_path =
            dir.join("repositories.csv").to_string_lossy().into_owned();
        config.output.files_path = dir.join("files.csv").to_string_lossy().into_owned();
    }

    // Overrides can invalidate a previously valid config
    validate(&config)?;

    Ok(config)
}
