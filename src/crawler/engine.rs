//! Crawl engine: the main orchestration loop
//!
//! The engine pulls tasks from the frontier, waits on the rate governor,
//! spawns the fetch, and dispatches each fetched document to the handler
//! matching its task kind. Discovered tasks flow back into the frontier and
//! records go to the sink; both only ever from this loop, so the frontier and
//! the sink have a single writer.
//!
//! Per-task states are Queued (in the frontier), Fetching (spawned), then
//! Succeeded or Failed. A failed task is logged and dropped; only a sink
//! write failure aborts the crawl. The crawl completes when the frontier is
//! empty and nothing is in flight.

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch_page};
use crate::crawler::frontier::Frontier;
use crate::crawler::governor::{Permit, RateGovernor};
use crate::crawler::handlers::{handle_page, HandlerOutcome};
use crate::crawler::page::Page;
use crate::model::{Record, Task};
use crate::output::RecordSink;
use crate::TrawlError;
use reqwest::Client;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use url::Url;

/// How the crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// Frontier exhausted with nothing in flight
    Completed,

    /// Stop signal received before exhaustion
    Interrupted,
}

/// Final tallies for a crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub outcome: CrawlOutcome,
    pub pages_fetched: u64,
    pub tasks_dropped: u64,
    pub collections: u64,
    pub repositories: u64,
    pub files: u64,
}

/// Result of one spawned fetch, sent back to the engine loop
struct FetchDone {
    task: Task,
    result: Result<HandlerOutcome, String>,
}

/// The crawl orchestrator
pub struct Engine<S: RecordSink> {
    client: Client,
    governor: Arc<RateGovernor>,
    frontier: Frontier,
    sink: S,
    stop: watch::Receiver<bool>,
    pages_fetched: u64,
    tasks_dropped: u64,
    collections: u64,
    repositories: u64,
    files: u64,
}

impl<S: RecordSink> Engine<S> {
    /// Creates an engine seeded with the configured collection-index root
    ///
    /// # Arguments
    ///
    /// * `config` - Crawler and governor configuration
    /// * `sink` - Destination for emitted records
    /// * `stop` - Stop signal; flipping it to `true` drains the crawl
    pub fn new(config: &Config, sink: S, stop: watch::Receiver<bool>) -> Result<Self, TrawlError> {
        let client = build_http_client(&config.crawler.user_agent)?;
        let seed = Url::parse(&config.crawler.seed_url)?;

        let mut frontier = Frontier::new();
        frontier.push(Task::seed(seed));

        Ok(Self {
            client,
            governor: Arc::new(RateGovernor::new(&config.governor)),
            frontier,
            sink,
            stop,
            pages_fetched: 0,
            tasks_dropped: 0,
            collections: 0,
            repositories: 0,
            files: 0,
        })
    }

    /// Runs the crawl to completion or interruption
    pub async fn run(mut self) -> Result<CrawlReport, TrawlError> {
        let started = Instant::now();
        let governor = Arc::clone(&self.governor);
        let mut stop = self.stop.clone();
        let (tx, mut rx) = mpsc::channel::<FetchDone>(64);

        let mut in_flight: usize = 0;
        let mut stopping = *stop.borrow();
        let mut watching = true;

        loop {
            // Terminal: nothing running and either drained or told to stop
            if in_flight == 0 && (stopping || self.frontier.is_empty()) {
                break;
            }

            let can_spawn = !stopping && !self.frontier.is_empty();

            tokio::select! {
                permit = governor.admit(), if can_spawn => {
                    let task = self
                        .frontier
                        .pop()
                        .expect("frontier checked non-empty before spawn");
                    tracing::debug!("Fetching {} ({})", task.url, task.kind);
                    in_flight += 1;
                    tokio::spawn(fetch_and_handle(
                        self.client.clone(),
                        task,
                        permit,
                        Arc::clone(&governor),
                        tx.clone(),
                    ));
                }

                done = rx.recv(), if in_flight > 0 => {
                    in_flight -= 1;
                    if let Some(done) = done {
                        self.absorb(done)?;
                    }
                }

                changed = stop.changed(), if watching && !stopping => {
                    match changed {
                        Ok(()) => {
                            if *stop.borrow() {
                                stopping = true;
                                tracing::info!(
                                    "Stop requested: draining {} in-flight fetches, {} tasks abandoned",
                                    in_flight,
                                    self.frontier.len()
                                );
                            }
                        }
                        // Signal source went away; nothing left to watch
                        Err(_) => watching = false,
                    }
                }
            }
        }

        self.sink.close()?;

        let outcome = if stopping {
            CrawlOutcome::Interrupted
        } else {
            CrawlOutcome::Completed
        };

        tracing::info!(
            "Crawl {}: {} pages fetched, {} dropped, {} collections / {} repositories / {} files in {:?}",
            match outcome {
                CrawlOutcome::Completed => "completed",
                CrawlOutcome::Interrupted => "interrupted",
            },
            self.pages_fetched,
            self.tasks_dropped,
            self.collections,
            self.repositories,
            self.files,
            started.elapsed()
        );

        Ok(CrawlReport {
            outcome,
            pages_fetched: self.pages_fetched,
            tasks_dropped: self.tasks_dropped,
            collections: self.collections,
            repositories: self.repositories,
            files: self.files,
        })
    }

    /// Folds one finished fetch back into the frontier and the sink
    fn absorb(&mut self, done: FetchDone) -> Result<(), TrawlError> {
        match done.result {
            Ok(outcome) => {
                self.pages_fetched += 1;

                for task in outcome.tasks {
                    self.frontier.push(task);
                }

                for record in outcome.records {
                    match &record {
                        Record::Collection(_) => self.collections += 1,
                        Record::Repository(_) => self.repositories += 1,
                        Record::File(_) => self.files += 1,
                    }
                    self.sink.emit(&record)?;
                }

                if self.pages_fetched % 10 == 0 {
                    tracing::info!(
                        "Progress: {} pages fetched, {} in frontier, delay {:?}",
                        self.pages_fetched,
                        self.frontier.len(),
                        self.governor.current_delay()
                    );
                }
            }
            Err(reason) => {
                // A broken page never aborts the crawl; its subtree is lost
                self.tasks_dropped += 1;
                tracing::warn!(
                    "Dropping {} task for {}: {}",
                    done.task.kind,
                    done.task.url,
                    reason
                );
            }
        }

        Ok(())
    }
}

/// One spawned fetch: governed request, then synchronous handling
///
/// The permit is released as soon as the response is in, so in-flight
/// accounting tracks network activity, not parsing. The parsed document never
/// crosses an await point (scraper's DOM is not Send).
async fn fetch_and_handle(
    client: Client,
    task: Task,
    permit: Permit,
    governor: Arc<RateGovernor>,
    tx: mpsc::Sender<FetchDone>,
) {
    let started = Instant::now();
    let fetched = fetch_page(&client, &task.url).await;
    governor.observe(started.elapsed(), fetched.is_ok());
    drop(permit);

    let result = match fetched {
        Ok(fetched_page) => {
            let page = Page::parse(&fetched_page.body);
            handle_page(&task, &page, &fetched_page.final_url).map_err(|e| e.to_string())
        }
        Err(e) => Err(e.to_string()),
    };

    // The engine may already be gone on fatal sink errors; nothing to do then
    let _ = tx.send(FetchDone { task, result }).await;
}
