//! Session bootstrap collaborators
//!
//! Some listing endpoints only answer well after a regular page visit has set
//! cookies. A session is opened once before the first page is fetched and
//! closed on every exit path of the crawl.

use crate::crawler::agents::UserAgentPool;
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;

/// A navigation context scoped to one crawl job
#[async_trait]
pub trait Session: Send {
    /// Acquires the session; failure aborts the job before any fetch
    async fn open(&mut self) -> Result<(), HarvestError>;

    /// Releases the session; must be safe to call after a failed `open`
    async fn close(&mut self);
}

/// Session that does nothing, for endpoints that need no warm-up
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSession;

#[async_trait]
impl Session for NoSession {
    async fn open(&mut self) -> Result<(), HarvestError> {
        Ok(())
    }

    async fn close(&mut self) {}
}

/// Warms up cookies by visiting a landing page with the shared client
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
    url: String,
    agents: UserAgentPool,
    active: bool,
}

impl HttpSession {
    /// `client` must be the same client the fetcher uses so cookies carry over
    pub fn new(client: Client, url: impl Into<String>, agents: UserAgentPool) -> Self {
        Self {
            client,
            url: url.into(),
            agents,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    fn navigation_error(&self, message: impl Into<String>) -> HarvestError {
        HarvestError::Navigation {
            url: self.url.clone(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Session for HttpSession {
    async fn open(&mut self) -> Result<(), HarvestError> {
        tracing::info!("Opening session at {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .header(USER_AGENT, self.agents.pick())
            .header(ACCEPT, "text/html")
            .send()
            .await
            .map_err(|e| self.navigation_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.navigation_error(format!("HTTP {}", status.as_u16())));
        }

        self.active = true;
        Ok(())
    }

    async fn close(&mut self) {
        if self.active {
            tracing::debug!("Closing session at {}", self.url);
        }
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_session() {
        let mut session = NoSession;
        assert!(session.open().await.is_ok());
        session.close().await;
    }

    #[tokio::test]
    async fn test_http_session_unreachable() {
        let agents = UserAgentPool::new(vec!["Test/1.0".to_string()]).unwrap();
        let mut session = HttpSession::new(Client::new(), "http://127.0.0.1:1/", agents);

        let result = session.open().await;
        assert!(matches!(result, Err(HarvestError::Navigation { .. })));
        assert!(!session.is_active());

        session.close().await;
        assert!(!session.is_active());
    }
}
