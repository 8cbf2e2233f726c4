//! User agent rotation
//!
//! Every outgoing request picks one identity from a fixed pool at random. No
//! state is carried from one pick to the next.

use crate::{ConfigError, ConfigResult};
use rand::Rng;
use std::sync::Arc;

/// Fixed pool of user agent strings
#[derive(Debug, Clone)]
pub struct UserAgentPool {
    agents: Arc<[String]>,
}

impl UserAgentPool {
    /// Creates a pool, rejecting an empty list
    pub fn new(agents: Vec<String>) -> ConfigResult<Self> {
        let agents: Vec<String> = agents
            .into_iter()
            .map(|ua| ua.trim().to_string())
            .filter(|ua| !ua.is_empty())
            .collect();

        if agents.is_empty() {
            return Err(ConfigError::Validation(
                "user agent pool cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            agents: agents.into(),
        })
    }

    /// Picks a user agent pseudo-randomly
    pub fn pick(&self) -> &str {
        let idx = rand::rng().random_range(0..self.agents.len());
        &self.agents[idx]
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn contains(&self, agent: &str) -> bool {
        self.agents.iter().any(|ua| ua == agent)
    }
}
