use serde::Deserialize;
use std::time::Duration;

/// Browser identities rotated across listing requests
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/71.0.3578.98 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:64.0) Gecko/20100101 Firefox/64.0",
    "Mozilla/5.0 (Windows NT 6.1; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/71.0.3578.98 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/70.0.3538.110 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_14_2) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/71.0.3578.98 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_14_2) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/12.0.2 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/64.0.3282.140 Safari/537.36 Edge/17.17134",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:64.0) Gecko/20100101 Firefox/64.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_13_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/71.0.3578.98 Safari/537.36",
    "Mozilla/5.0 (Windows NT 6.1; Win64; x64; rv:64.0) Gecko/20100101 Firefox/64.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.14; rv:64.0) Gecko/20100101 Firefox/64.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/86.0.4240.0 Safari/537.36",
];

/// Main configuration structure for Listing Harvester
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub source: SourceConfig,
    #[serde(rename = "user-agents")]
    pub user_agents: UserAgentConfig,
    pub output: OutputConfig,
}

/// Pagination and pacing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of listings per page, used to compute the `start` offset
    #[serde(rename = "page-size")]
    pub page_size: u32,

    /// Maximum number of pages to crawl (unbounded when absent)
    #[serde(rename = "max-pages")]
    pub max_pages: Option<u32>,

    /// Delay between two page requests (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Total fetch attempts per page before the run is aborted
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base backoff between attempts on the same page (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl CrawlerConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Backoff to wait after the given failed attempt (1-based)
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(u64::from(attempt)))
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            max_pages: None,
            request_delay_ms: 10_000,
            max_retries: 3,
            retry_backoff_ms: 2_000,
            request_timeout_secs: 30,
        }
    }
}

/// Where listing pages are requested from
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Listing endpoint that serves the paginated HTML fragments
    pub endpoint: String,

    /// Page visited once before the crawl to warm up the session
    #[serde(rename = "bootstrap-url")]
    pub bootstrap_url: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://www.icanvas.com/".to_string(),
            bootstrap_url: None,
        }
    }
}

/// User agent rotation pool
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    pub pool: Vec<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            pool: DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// JSON-lines log of discovered listings; also the source of dedup truth
    #[serde(rename = "result-log-path")]
    pub result_log_path: String,

    /// JSON-lines log of run failures
    #[serde(rename = "error-log-path")]
    pub error_log_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            result_log_path: "data/db_source.log".to_string(),
            error_log_path: "error.log".to_string(),
        }
    }
}
