//! HTTP fetcher implementation
//!
//! This module handles every listing page request, including:
//! - Building the shared HTTP client
//! - Building the paginated request URL
//! - Rotating the user agent per request
//! - Classifying the response
//!
//! The fetcher never retries; retry policy belongs to the controller.

use crate::config::Config;
use crate::crawler::agents::UserAgentPool;
use crate::url::{page_url, ListingQuery};
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Accept header a browser sends for a document request
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9";

/// Result of a single page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageResult {
    /// 2xx response with its body
    Body(String),

    /// Response outside the 2xx range
    Failure(u16),
}

/// Source of listing pages
///
/// Transport-level failures are returned as `Err`; HTTP error statuses are
/// a normal `PageResult::Failure`.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, query: &ListingQuery, page_index: u32)
        -> Result<PageResult, HarvestError>;
}

/// Builds the HTTP client shared by the fetcher and the session bootstrap
///
/// The cookie store lets a bootstrap visit hand its cookies to later
/// listing requests.
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(config.crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches listing pages over HTTP
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    endpoint: Url,
    page_size: u32,
    agents: UserAgentPool,
}

impl HttpFetcher {
    /// Creates a fetcher for the configured endpoint
    pub fn new(client: Client, config: &Config) -> Result<Self, HarvestError> {
        let endpoint = Url::parse(&config.source.endpoint).map_err(|e| {
            crate::ConfigError::InvalidUrl(format!(
                "Invalid endpoint '{}': {}",
                config.source.endpoint, e
            ))
        })?;
        let agents = UserAgentPool::new(config.user_agents.pool.clone())?;

        Ok(Self {
            client,
            endpoint,
            page_size: config.crawler.page_size,
            agents,
        })
    }

    /// URL requested for the given page
    pub fn page_url(&self, query: &ListingQuery, page_index: u32) -> Url {
        page_url(&self.endpoint, query, page_index, self.page_size)
    }

    pub fn agents(&self) -> &UserAgentPool {
        &self.agents
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(
        &self,
        query: &ListingQuery,
        page_index: u32,
    ) -> Result<PageResult, HarvestError> {
        let url = self.page_url(query, page_index);
        let user_agent = self.agents.pick();
        tracing::debug!("GET page {} ({})", page_index, url);

        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, user_agent)
            .header(ACCEPT, BROWSER_ACCEPT)
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|source| HarvestError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Page {} answered HTTP {}", page_index, status.as_u16());
            return Ok(PageResult::Failure(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|source| HarvestError::Network {
                url: url.to_string(),
                source,
            })?;

        Ok(PageResult::Body(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&Config::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_page_url_uses_page_size() {
        let mut config = Config::default();
        config.crawler.page_size = 20;
        let fetcher = HttpFetcher::new(build_http_client(&config).unwrap(), &config).unwrap();
        let query = ListingQuery::new("tag", "dogs").unwrap();

        let url = fetcher.page_url(&query, 2);
        let start = url
            .query_pairs()
            .find(|(k, _)| k == "start")
            .map(|(_, v)| v.into_owned());

        assert_eq!(start.as_deref(), Some("40"));
    }

    #[test]
    fn test_rejects_invalid_endpoint() {
        let mut config = Config::default();
        config.source.endpoint = "not a url".to_string();
        let client = build_http_client(&config).unwrap();

        assert!(matches!(
            HttpFetcher::new(client, &config),
            Err(HarvestError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_empty_agent_pool() {
        let mut config = Config::default();
        config.user_agents.pool.clear();
        let client = build_http_client(&config).unwrap();

        assert!(HttpFetcher::new(client, &config).is_err());
    }

    // Request and response handling is covered with wiremock in the
    // integration tests
}
