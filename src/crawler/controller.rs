//! Pagination controller - main crawl orchestration logic
//!
//! This module contains the crawl loop that drives one job from the first
//! page to a terminal phase:
//! - Fetching a page, with bounded retries on error statuses
//! - Extracting listings, stopping when a page is empty
//! - Recording listings that the dedup store has not seen before
//! - Evaluating the page limit and pacing the next request

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{PageFetcher, PageResult};
use crate::crawler::parser::extract_listings;
use crate::crawler::session::{NoSession, Session};
use crate::state::{CrawlOutcome, CrawlPhase, CrawlState, StopReason};
use crate::storage::{
    DedupStore, EntrySink, JsonLinesLog, ListingRecord, LogEntry, StorageResult,
};
use crate::url::ListingQuery;
use crate::HarvestError;

/// Summary of a finished crawl job
#[derive(Debug)]
pub struct CrawlReport {
    pub query: ListingQuery,
    pub outcome: CrawlOutcome,

    /// Pages that returned a body
    pub pages_fetched: u32,

    /// Requests issued, retries included
    pub fetch_attempts: u32,

    /// Listings extracted across all pages
    pub records_seen: u64,

    /// Listings appended to the result log by this job
    pub records_appended: u64,

    /// Distinct product ids known before the job started
    pub known_before: usize,
}

impl CrawlReport {
    pub fn is_aborted(&self) -> bool {
        self.outcome.is_aborted()
    }
}

/// Drives one crawl job against a fetcher and two log sinks
///
/// `results` receives one info entry per newly discovered listing; `errors`
/// receives one error entry when a job aborts.
pub struct Controller<F, R, E> {
    config: CrawlerConfig,
    fetcher: F,
    dedup: DedupStore,
    results: R,
    errors: E,
}

impl<F, E> Controller<F, JsonLinesLog, E>
where
    F: PageFetcher,
    E: EntrySink,
{
    /// Creates a controller whose dedup store is replayed from the result log
    pub fn from_log(
        config: CrawlerConfig,
        fetcher: F,
        results: JsonLinesLog,
        errors: E,
    ) -> StorageResult<Self> {
        let mut replay = results.replay()?;
        let dedup = DedupStore::rehydrate(replay.by_ref())?;

        tracing::info!(
            "Replayed {}: {} known listing(s), {} malformed line(s) skipped",
            results.path().display(),
            dedup.len(),
            replay.skipped()
        );

        Ok(Self::new(config, fetcher, dedup, results, errors))
    }
}

impl<F, R, E> Controller<F, R, E>
where
    F: PageFetcher,
    R: EntrySink,
    E: EntrySink,
{
    pub fn new(config: CrawlerConfig, fetcher: F, dedup: DedupStore, results: R, errors: E) -> Self {
        Self {
            config,
            fetcher,
            dedup,
            results,
            errors,
        }
    }

    pub fn dedup(&self) -> &DedupStore {
        &self.dedup
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn results(&self) -> &R {
        &self.results
    }

    pub fn errors(&self) -> &E {
        &self.errors
    }

    /// Runs a job without a session bootstrap
    pub async fn run(&mut self, query: ListingQuery) -> CrawlReport {
        self.run_in_session(&mut NoSession, query).await
    }

    /// Runs a job inside `session`
    ///
    /// The session is closed whichever way the job ends, including when
    /// opening it failed.
    pub async fn run_in_session<S>(&mut self, session: &mut S, query: ListingQuery) -> CrawlReport
    where
        S: Session + ?Sized,
    {
        let known_before = self.dedup.len();
        let mut state = CrawlState::new(query);

        tracing::info!(
            "Starting crawl of '{}' with {} known listing(s)",
            state.query,
            known_before
        );

        let outcome = match session.open().await {
            Ok(()) => self.crawl(&mut state).await,
            Err(e) => {
                state.transition(CrawlPhase::Aborted);
                CrawlOutcome::Aborted(e)
            }
        };

        session.close().await;

        match &outcome {
            CrawlOutcome::Stopped(reason) => tracing::info!(
                "Crawl stopped ({}): {} page(s), {} new listing(s)",
                reason,
                state.pages_fetched,
                state.records_appended
            ),
            CrawlOutcome::Aborted(error) => {
                tracing::error!("Crawl aborted on page {}: {}", state.page_index, error);
                self.record_abort(error);
            }
        }

        CrawlReport {
            query: state.query,
            outcome,
            pages_fetched: state.pages_fetched,
            fetch_attempts: state.fetch_attempts,
            records_seen: state.records_seen,
            records_appended: state.records_appended,
            known_before,
        }
    }

    /// The page loop; returns once a terminal phase is reached
    async fn crawl(&mut self, state: &mut CrawlState) -> CrawlOutcome {
        loop {
            let body = match self.fetch_page(state).await {
                Ok(body) => body,
                Err(e) => {
                    state.transition(CrawlPhase::Aborted);
                    return CrawlOutcome::Aborted(e);
                }
            };

            state.transition(CrawlPhase::Extracting);
            let records = extract_listings(&body);

            if records.is_empty() {
                state.consecutive_empty_pages += 1;
                tracing::info!("Page {} has no listings", state.page_index);
                state.transition(CrawlPhase::Stopped);
                return CrawlOutcome::Stopped(StopReason::Exhausted);
            }
            state.consecutive_empty_pages = 0;
            state.records_seen += records.len() as u64;

            state.transition(CrawlPhase::Recording);
            let appended = match self.record(records) {
                Ok(appended) => appended,
                Err(e) => {
                    state.transition(CrawlPhase::Aborted);
                    return CrawlOutcome::Aborted(e.into());
                }
            };
            state.records_appended += appended;
            tracing::info!(
                "Page {}: {} new listing(s) recorded",
                state.page_index,
                appended
            );

            state.transition(CrawlPhase::Evaluating);
            state.page_index += 1;

            if let Some(max_pages) = self.config.max_pages {
                if state.pages_fetched >= max_pages {
                    state.transition(CrawlPhase::Stopped);
                    return CrawlOutcome::Stopped(StopReason::PageLimit);
                }
            }

            tokio::time::sleep(self.config.request_delay()).await;
            state.transition(CrawlPhase::Fetching);
        }
    }

    /// Fetches the current page, retrying error statuses up to the budget
    async fn fetch_page(&self, state: &mut CrawlState) -> Result<String, HarvestError> {
        let max_attempts = self.config.max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            state.fetch_attempts += 1;

            match self.fetcher.fetch(&state.query, state.page_index).await? {
                PageResult::Body(body) => {
                    state.pages_fetched += 1;
                    return Ok(body);
                }
                PageResult::Failure(status) if attempt >= max_attempts => {
                    return Err(HarvestError::FetchFailed {
                        page: state.page_index,
                        status,
                        attempts: attempt,
                    });
                }
                PageResult::Failure(status) => {
                    let backoff = self.config.retry_backoff(attempt);
                    tracing::warn!(
                        "Page {} returned HTTP {} (attempt {}/{}), retrying in {:?}",
                        state.page_index,
                        status,
                        attempt,
                        max_attempts,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    /// Appends every listing not yet in the dedup store; returns how many
    fn record(&mut self, records: Vec<ListingRecord>) -> StorageResult<u64> {
        let mut appended = 0;

        for record in records {
            if !self.dedup.try_insert(&record.product_id) {
                tracing::trace!("Already recorded: {}", record.product_id);
                continue;
            }
            self.results.append(&LogEntry::info(record))?;
            appended += 1;
        }

        Ok(appended)
    }

    fn record_abort(&mut self, error: &HarvestError) {
        let entry = LogEntry::error(error.to_string());
        if let Err(e) = self.errors.append(&entry) {
            tracing::error!("Failed to write error entry: {}", e);
        }
    }
}
