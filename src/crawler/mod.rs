//! Crawler module: fetching, throttling, and crawl orchestration
//!
//! The engine drives everything: it pulls tasks from the frontier, waits on
//! the rate governor, fetches pages, and hands documents to the node handler
//! matching each task's kind. Handlers return new tasks and finished records;
//! the engine feeds the former back to the frontier and the latter to the
//! configured sink.

mod engine;
mod fetcher;
mod frontier;
mod governor;
mod handlers;
mod page;

pub use engine::{CrawlOutcome, CrawlReport, Engine};
pub use fetcher::{build_http_client, fetch_page, FetchError, FetchedPage};
pub use frontier::Frontier;
pub use governor::{Permit, RateGovernor};
pub use handlers::{handle_page, HandlerError, HandlerOutcome};
pub use page::{parse_count, ListingRow, Page};

use crate::config::Config;
use crate::output::CsvSink;
use crate::{Result, TrawlError};
use tokio::sync::watch;

/// Runs a complete crawl with CSV output
///
/// Opens the configured CSV sinks, seeds the engine with the collection-index
/// root, and runs until the frontier drains or the stop signal fires.
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `stop` - Stop signal receiver; set to `true` to drain and finish early
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl finished (completed or interrupted)
/// * `Err(TrawlError)` - Setup failed or a sink write failed mid-crawl
pub async fn crawl(config: Config, stop: watch::Receiver<bool>) -> Result<CrawlReport> {
    let sink = CsvSink::open(&config.output).map_err(TrawlError::Sink)?;
    let engine = Engine::new(&config, sink, stop)?;
    engine.run().await
}
