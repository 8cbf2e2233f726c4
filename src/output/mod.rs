//! Output module for operator-facing summaries
//!
//! This module handles what is printed for a human, as opposed to the JSON
//! result and error logs:
//! - Run reports at the end of a crawl
//! - Statistics over an existing result log

mod stats;

pub use stats::{load_statistics, print_statistics, LogStatistics};

use crate::crawler::CrawlReport;
use crate::state::CrawlOutcome;

/// Formats a one-line summary of a finished crawl job
pub fn format_report(report: &CrawlReport) -> String {
    let status = match &report.outcome {
        CrawlOutcome::Stopped(reason) => format!("stopped ({})", reason),
        CrawlOutcome::Aborted(error) => format!("aborted [{}]: {}", error.kind(), error),
    };

    format!(
        "'{}' {}: {} page(s), {} request(s), {} listing(s) seen, {} new, {} previously known",
        report.query,
        status,
        report.pages_fetched,
        report.fetch_attempts,
        report.records_seen,
        report.records_appended,
        report.known_before
    )
}

/// Prints the run report to stdout
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");
    println!("{}", format_report(report));
}
