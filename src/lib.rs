//! Listing Harvester: an incremental product listing crawler
//!
//! This crate walks a paginated product listing page by page, extracts stable
//! product identifiers, and appends every product it has not seen before to a
//! durable JSON-lines log. The same log is replayed at startup so that reruns
//! only record what is new.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Listing Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Persistence error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Network error for {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("Fetch failed for page {page}: HTTP {status} after {attempts} attempt(s)")]
    FetchFailed { page: u32, status: u16, attempts: u32 },

    #[error("Session bootstrap failed for {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl HarvestError {
    /// Short machine-friendly label for the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Url(_) => "url",
            Self::Storage(_) => "persistence",
            Self::Network { .. } => "network",
            Self::FetchFailed { .. } => "fetch_failed",
            Self::Navigation { .. } => "navigation",
            Self::HttpClient(_) => "http_client",
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Listing URL needs a category and subcategory path: {0}")]
    MissingCategory(String),
}

/// Result type alias for Listing Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Controller, CrawlReport};
pub use state::{CrawlOutcome, CrawlPhase, StopReason};
pub use storage::{DedupStore, JsonLinesLog, ListingRecord, LogEntry};
pub use url::ListingQuery;
