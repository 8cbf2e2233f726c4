//! Storage module for the append-only listing log
//!
//! This module handles everything that touches durable state:
//! - The JSON-lines log that records every newly discovered listing
//! - Replaying that log at startup
//! - The in-memory dedup set rebuilt from the replay
//!
//! The result log is both the output of a crawl and the only source of truth
//! for deduplication, so it is only ever appended to.

mod dedup;
mod log_store;
mod traits;

pub use dedup::DedupStore;
pub use log_store::{JsonLinesLog, ReplayIter};
pub use traits::{EntrySink, StorageError, StorageResult};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A product listing discovered on a listing page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    /// Stable product identifier, the dedup key
    pub product_id: String,
    pub url: String,
}

impl ListingRecord {
    pub fn new(product_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            url: url.into(),
        }
    }
}

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

/// Payload of a log entry
///
/// Replay has to cope with lines written by older tools, so anything that is
/// neither a listing nor an error report is kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogMessage {
    Record(ListingRecord),
    Failure { error: String },
    Other(serde_json::Value),
}

impl LogMessage {
    /// Product identifier carried by this message, if any
    pub fn product_id(&self) -> Option<&str> {
        match self {
            Self::Record(record) => Some(record.product_id.as_str()),
            Self::Other(value) => value.get("productId").and_then(|v| v.as_str()),
            Self::Failure { .. } => None,
        }
    }
}

/// One line of a JSON-lines log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: LogMessage,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Epoch values above this are taken as milliseconds
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Reads a timestamp without ever rejecting the entry
///
/// Accepts RFC 3339, ISO 8601 without an offset (taken as UTC) and epoch
/// seconds or milliseconds. Anything else becomes `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_timestamp))
}

fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|ts| ts.with_timezone(&Utc))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                    .map(|ts| ts.and_utc())
            })
            .ok(),
        serde_json::Value::Number(number) => {
            let epoch = number.as_i64()?;
            if epoch.abs() >= EPOCH_MILLIS_THRESHOLD {
                DateTime::from_timestamp_millis(epoch)
            } else {
                DateTime::from_timestamp(epoch, 0)
            }
        }
        _ => None,
    }
}

impl LogEntry {
    /// Info entry recording a newly discovered listing
    pub fn info(record: ListingRecord) -> Self {
        Self {
            level: LogLevel::Info,
            message: LogMessage::Record(record),
            timestamp: Some(Utc::now()),
        }
    }

    /// Error entry describing why a run stopped
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            level: LogLevel::Error,
            message: LogMessage::Failure {
                error: error.into(),
            },
            timestamp: Some(Utc::now()),
        }
    }

    /// Product identifier of an info entry; `None` for errors and empty ids
    pub fn listing_id(&self) -> Option<&str> {
        if self.level != LogLevel::Info {
            return None;
        }
        self.message.product_id().filter(|id| !id.is_empty())
    }
}
