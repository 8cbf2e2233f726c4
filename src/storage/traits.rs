//! Storage traits and error types
//!
//! This module defines the sink interface the crawl writes through and the
//! error type shared by the log store implementations.

use crate::storage::LogEntry;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to open log {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to append to log {path}: {source}")]
    Append {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read log {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Append-only destination for log entries
///
/// An implementation must not return from `append` before the entry is
/// durable: a crash right after a successful call must never lose it.
pub trait EntrySink {
    /// Durably writes one entry
    fn append(&mut self, entry: &LogEntry) -> StorageResult<()>;
}

impl<S: EntrySink + ?Sized> EntrySink for &mut S {
    fn append(&mut self, entry: &LogEntry) -> StorageResult<()> {
        (**self).append(entry)
    }
}

impl<S: EntrySink + ?Sized> EntrySink for Box<S> {
    fn append(&mut self, entry: &LogEntry) -> StorageResult<()> {
        (**self).append(entry)
    }
}
