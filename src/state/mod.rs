//! State management module
//!
//! This module defines the crawl phase machine and the transient per-run
//! state the pagination controller carries between pages.

mod crawl_state;

pub use crawl_state::{CrawlOutcome, CrawlPhase, CrawlState, StopReason};
