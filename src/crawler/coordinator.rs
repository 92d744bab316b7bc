//! Crawler coordinator - main crawl orchestration logic
//!
//! This module drives one crawl run:
//! - Consulting the robots gate before anything else is fetched
//! - Discovering periods and skipping those completed by earlier runs
//! - Crawling the remaining periods in bounded batches
//! - Recording each finished period in the crawl state
//! - Re-annotating threads over the whole record log once every batch is done

use crate::config::Config;
use crate::crawler::discovery::{discover, parse_message_links, PeriodFilter, PeriodTarget};
use crate::crawler::fetcher::{request_limiter, FetchGateway};
use crate::crawler::parser::PageParser;
use crate::output::{RunCounters, RunSummary};
use crate::state::{PeriodProgress, PeriodState};
use crate::storage::{CrawlStateStore, JsonlRecordStore, RecordLog};
use crate::threads::annotate_store;
use crate::{ArchiveError, FetchError};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    gateway: Arc<FetchGateway>,
    parser: PageParser,
    records: Arc<dyn RecordLog>,
    state: Arc<CrawlStateStore>,
    counters: RunCounters,
}

impl Coordinator {
    /// Creates a coordinator writing to the paths named in `config`
    ///
    /// `limiter` bounds requests in flight across everything this coordinator
    /// fetches.
    pub fn new(config: Config, limiter: Arc<Semaphore>) -> Result<Self, ArchiveError> {
        let gateway = FetchGateway::from_config(&config, limiter)?;
        let records = Arc::new(JsonlRecordStore::new(&config.output.records_path));
        let state = Arc::new(CrawlStateStore::new(&config.output.state_path));

        Ok(Self::with_parts(config, Arc::new(gateway), records, state))
    }

    /// Creates a coordinator from already-built parts
    pub fn with_parts(
        config: Config,
        gateway: Arc<FetchGateway>,
        records: Arc<dyn RecordLog>,
        state: Arc<CrawlStateStore>,
    ) -> Self {
        let parser = PageParser::new(config.archive.list_name.clone());
        Self {
            config: Arc::new(config),
            gateway,
            parser,
            records,
            state,
            counters: RunCounters::new(),
        }
    }

    /// Runs the crawl
    ///
    /// Per-message and per-period failures are counted and reported in the
    /// summary; only a robots denial or a storage failure ends the run early.
    pub async fn run(&self, filter: PeriodFilter) -> Result<RunSummary, ArchiveError> {
        let start_time = Instant::now();
        tracing::info!(base_url = %self.config.archive.base_url, "Starting crawl run");

        self.gateway
            .ensure_permitted()
            .await
            .map_err(|e| match e {
                FetchError::PolicyDenied { url } => ArchiveError::PolicyDenied { url },
                other => ArchiveError::Fetch(other),
            })?;

        let state = self.state.load_or_default()?;

        let targets = match discover(&self.gateway, &self.config.archive, filter).await {
            Ok(targets) => targets,
            Err(e) => {
                tracing::error!("Failed to fetch archive index: {}", e);
                self.counters.error();
                Vec::new()
            }
        };

        let (skipped, pending): (Vec<PeriodTarget>, Vec<PeriodTarget>) = targets
            .into_iter()
            .partition(|target| state.is_completed(&target.period));
        if !skipped.is_empty() {
            tracing::info!(count = skipped.len(), "Skipping already completed periods");
        }
        self.counters.periods_skipped(skipped.len());

        let batch_size = (self.config.crawler.max_concurrent_periods as usize).max(1);
        for (index, batch) in pending.chunks(batch_size).enumerate() {
            tracing::info!(
                batch = index + 1,
                periods = batch.len(),
                "Crawling period batch"
            );

            let outcomes = join_all(batch.iter().map(|target| self.crawl_period(target))).await;
            for progress in &outcomes {
                tracing::debug!(
                    period = %progress.period,
                    state = %progress.state(),
                    written = progress.messages_written,
                    errors = progress.message_errors,
                    "Period finished"
                );
            }
        }

        let threads = match annotate_store(self.records.as_ref()) {
            Ok(threads) => Some(threads),
            Err(e) => {
                tracing::error!("Thread reconstruction failed: {}", e);
                self.counters.error();
                None
            }
        };

        let summary = self.counters.summarize(threads, start_time.elapsed());
        summary.log();
        Ok(summary)
    }

    /// Crawls one period: index page, then every message page concurrently
    async fn crawl_period(&self, target: &PeriodTarget) -> PeriodProgress {
        let mut progress = PeriodProgress::new(target.period, target.index_url.clone());
        advance(&mut progress, PeriodState::InFlight);
        tracing::info!(period = %target.period, "Crawling period");

        let html = match self.gateway.fetch(&target.index_url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::error!(period = %target.period, "Failed to fetch period index: {}", e);
                advance(&mut progress, PeriodState::Failed);
                self.counters.period_failed();
                return progress;
            }
        };

        let message_urls = parse_message_links(&html, &target.index_url);
        tracing::info!(
            period = %target.period,
            count = message_urls.len(),
            "Found messages in period"
        );

        let period_key = target.period.to_string();
        let results = join_all(
            message_urls
                .iter()
                .map(|url| self.crawl_message(url, &period_key)),
        )
        .await;

        for (url, result) in message_urls.iter().zip(results) {
            match result {
                Ok(()) => {
                    progress.messages_written += 1;
                    self.counters.message_written();
                }
                Err(e) => {
                    tracing::warn!(period = %target.period, url = %url, "Skipping message: {}", e);
                    progress.message_errors += 1;
                    self.counters.error();
                }
            }
        }

        match self.state.mark_completed(&target.period) {
            Ok(_) => {
                advance(&mut progress, PeriodState::Completed);
                self.counters.period_processed();
                tracing::info!(
                    period = %target.period,
                    written = progress.messages_written,
                    "Period complete"
                );
            }
            Err(e) => {
                tracing::error!(period = %target.period, "Failed to record completion: {}", e);
                advance(&mut progress, PeriodState::Failed);
                self.counters.period_failed();
            }
        }

        progress
    }

    /// Fetches, parses and stores one message page
    async fn crawl_message(&self, url: &str, period: &str) -> Result<(), ArchiveError> {
        let html = self.gateway.fetch(url).await?;
        let record = self.parser.parse(&html, url, period)?;
        self.records.append(&record)?;
        tracing::debug!(url = %url, message_id = %record.message_id, "Stored message");
        Ok(())
    }
}

fn advance(progress: &mut PeriodProgress, next: PeriodState) {
    if let Err(e) = progress.transition(next) {
        tracing::error!(period = %progress.period, "{}", e);
    }
}

/// Runs a complete crawl with its own request limiter
pub async fn run_crawl(config: Config, filter: PeriodFilter) -> Result<RunSummary, ArchiveError> {
    let limiter = request_limiter(&config.crawler);
    Coordinator::new(config, limiter)?.run(filter).await
}

/// Resumes from the latest completed period
///
/// Completed periods are still skipped; the latest one is only the lower
/// bound for discovery. With no completed periods this is a full crawl.
pub async fn run_incremental(config: Config) -> Result<RunSummary, ArchiveError> {
    let state = CrawlStateStore::new(&config.output.state_path).load_or_default()?;
    let from = state.latest_completed();

    match from {
        Some(period) => tracing::info!(from = %period, "Incremental crawl"),
        None => tracing::info!("No completed periods recorded, running full crawl"),
    }

    run_crawl(
        config,
        PeriodFilter {
            from,
            only: None,
        },
    )
    .await
}
