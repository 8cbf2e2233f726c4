//! Crawl phase and per-run state definitions
//!
//! This module defines the phases the pagination loop moves through and the
//! transient state it carries from one page to the next.
use crate::url::ListingQuery;
use crate::HarvestError;
use std::fmt;

/// Represents the current phase of a crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Active Phases =====
    /// Requesting the current page (including retries)
    Fetching,

    /// Turning the fetched body into listing records
    Extracting,

    /// Deduplicating records and appending new ones to the result log
    Recording,

    /// Deciding whether to continue to the next page
    Evaluating,

    // ===== Terminal Phases =====
    /// Normal completion
    Stopped,

    /// Fatal error, reason recorded in the error log
    Aborted,
}

impl CrawlPhase {
    /// Returns true if no further transition can happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Aborted)
    }

    /// Returns true if moving from `self` to `next` is a legal step
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;
        matches!(
            (self, next),
            (Fetching, Extracting)
                | (Fetching, Aborted)
                | (Extracting, Recording)
                | (Extracting, Stopped)
                | (Recording, Evaluating)
                | (Recording, Aborted)
                | (Evaluating, Fetching)
                | (Evaluating, Stopped)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Recording => "recording",
            Self::Evaluating => "evaluating",
            Self::Stopped => "stopped",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a run completed normally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A page yielded no listings
    Exhausted,
    /// The configured page limit was reached
    PageLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => write!(f, "listing exhausted"),
            Self::PageLimit => write!(f, "page limit reached"),
        }
    }
}

/// Terminal result of a crawl job
#[derive(Debug)]
pub enum CrawlOutcome {
    Stopped(StopReason),
    Aborted(HarvestError),
}

impl CrawlOutcome {
    pub fn phase(&self) -> CrawlPhase {
        match self {
            Self::Stopped(_) => CrawlPhase::Stopped,
            Self::Aborted(_) => CrawlPhase::Aborted,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

/// Transient state of one crawl job; never persisted
#[derive(Debug, Clone)]
pub struct CrawlState {
    pub query: ListingQuery,

    /// Page currently being processed (starts at 1)
    pub page_index: u32,

    /// Pages in a row that produced no listings
    pub consecutive_empty_pages: u32,

    pub phase: CrawlPhase,

    /// Pages successfully fetched
    pub pages_fetched: u32,

    /// Fetch attempts issued, retries included
    pub fetch_attempts: u32,

    /// Listings extracted across all pages
    pub records_seen: u64,

    /// Listings appended to the result log in this run
    pub records_appended: u64,
}

impl CrawlState {
    pub fn new(query: ListingQuery) -> Self {
        Self {
            query,
            page_index: 1,
            consecutive_empty_pages: 0,
            phase: CrawlPhase::Fetching,
            pages_fetched: 0,
            fetch_attempts: 0,
            records_seen: 0,
            records_appended: 0,
        }
    }

    /// Moves to the next phase, tracing transitions the loop should never take
    pub fn transition(&mut self, next: CrawlPhase) {
        if !self.phase.can_transition_to(next) {
            tracing::warn!("Unexpected crawl transition: {} -> {}", self.phase, next);
        }
        tracing::trace!("Page {}: {} -> {}", self.page_index, self.phase, next);
        self.phase = next;
    }
}
