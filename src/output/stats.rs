//! Statistics generation from the result log
//!
//! This module replays a result log without touching the network and
//! summarizes what it holds.

use crate::storage::{LogLevel, ReplayIter, StorageResult};
use std::collections::HashSet;
use std::path::Path;

/// Result log statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogStatistics {
    /// Info entries carrying a product id
    pub info_entries: u64,

    /// Distinct product ids, i.e. the size of the rebuilt dedup store
    pub distinct_ids: u64,

    /// Error entries found in the file
    pub error_entries: u64,

    /// Valid entries that carry no usable product id
    pub other_entries: u64,

    /// Lines that could not be parsed
    pub skipped_lines: u64,
}

impl LogStatistics {
    /// Info entries whose product id had already been logged
    pub fn duplicate_entries(&self) -> u64 {
        self.info_entries.saturating_sub(self.distinct_ids)
    }
}

/// Loads statistics by replaying the log at `path`
///
/// A missing file yields empty statistics.
pub fn load_statistics(path: &Path) -> StorageResult<LogStatistics> {
    let mut replay = ReplayIter::open(path)?;
    let mut stats = LogStatistics::default();
    let mut ids = HashSet::new();

    for entry in replay.by_ref() {
        let entry = entry?;
        match (entry.level, entry.listing_id()) {
            (_, Some(id)) => {
                stats.info_entries += 1;
                ids.insert(id.to_string());
            }
            (LogLevel::Error, None) => stats.error_entries += 1,
            (LogLevel::Info, None) => stats.other_entries += 1,
        }
    }

    stats.distinct_ids = ids.len() as u64;
    stats.skipped_lines = replay.skipped() as u64;
    Ok(stats)
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &LogStatistics) {
    println!("=== Result Log Statistics ===\n");

    println!("Entries:");
    println!("  Listing entries: {}", stats.info_entries);
    println!("  Distinct product ids: {}", stats.distinct_ids);
    println!("  Duplicate entries: {}", stats.duplicate_entries());
    println!("  Error entries: {}", stats.error_entries);
    println!("  Other entries: {}", stats.other_entries);
    println!();

    if stats.skipped_lines > 0 {
        println!("Malformed lines skipped: {}", stats.skipped_lines);
        println!();
    }

    let uniqueness = if stats.info_entries > 0 {
        (stats.distinct_ids as f64 / stats.info_entries as f64) * 100.0
    } else {
        100.0
    };
    println!(
        "Uniqueness: {:.1}% ({} / {} listing entries)",
        uniqueness, stats.distinct_ids, stats.info_entries
    );
}
