//! Crawler module for listing page fetching and processing
//!
//! This module contains the incremental crawl core, including:
//! - HTTP fetching with user agent rotation
//! - Listing extraction from page bodies
//! - Optional session bootstrap before the first page
//! - The pagination controller that ties them to the dedup log

mod agents;
mod controller;
mod fetcher;
mod parser;
mod session;

pub use agents::UserAgentPool;
pub use controller::{Controller, CrawlReport};
pub use fetcher::{build_http_client, HttpFetcher, PageFetcher, PageResult};
pub use parser::{extract_listings, LISTING_SELECTOR, PRODUCT_ID_ATTR, URL_ATTR};
pub use session::{HttpSession, NoSession, Session};

use crate::config::Config;
use crate::storage::JsonLinesLog;
use crate::url::ListingQuery;
use crate::HarvestError;

/// Runs a complete crawl job for one listing URL
///
/// This is the main entry point for a crawl. It will:
/// 1. Derive the listing query from `listing_url`
/// 2. Open the result and error logs
/// 3. Replay the result log into the dedup store
/// 4. Open the session bootstrap, if one is configured
/// 5. Crawl pages until exhaustion, the page limit, or an abort
/// 6. Close the session
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The job reached a terminal phase (stopped or aborted)
/// * `Err(HarvestError)` - The job could not be set up
///
/// # Example
///
/// ```no_run
/// use listing_harvester::config::Config;
/// use listing_harvester::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = run_crawl(&Config::default(), "www.icanvas.com/canvas-art-prints/tag/dogs").await?;
/// println!("{} new listings", report.records_appended);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config, listing_url: &str) -> Result<CrawlReport, HarvestError> {
    let query = ListingQuery::from_listing_url(listing_url)?;

    let results = JsonLinesLog::open(&config.output.result_log_path)?;
    let errors = JsonLinesLog::open(&config.output.error_log_path)?;

    let client = build_http_client(config)?;
    let fetcher = HttpFetcher::new(client.clone(), config)?;

    let mut session: Box<dyn Session> = match &config.source.bootstrap_url {
        Some(url) => Box::new(HttpSession::new(client, url.clone(), fetcher.agents().clone())),
        None => Box::new(NoSession),
    };

    let mut controller = Controller::from_log(config.crawler.clone(), fetcher, results, errors)?;
    Ok(controller.run_in_session(session.as_mut(), query).await)
}
