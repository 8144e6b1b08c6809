use std::sync::Arc;

use serde::Deserialize;

use crate::cache::{CacheManager, Error};

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SessionConfig {
    #[serde(default = "SessionConfig::default_prefix")]
    pub prefix: String,
    #[serde(default = "SessionConfig::default_expiration")]
    pub expiration: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            prefix: SessionConfig::default_prefix(),
            expiration: SessionConfig::default_expiration(),
        }
    }
}

impl SessionConfig {
    fn default_prefix() -> String {
        "sess_".to_string()
    }

    fn default_expiration() -> u64 {
        3600
    }
}

/// Session payload storage on top of a [`CacheManager`].
#[derive(Debug)]
pub struct SessionStore {
    cache: Arc<CacheManager>,
    config: SessionConfig,
}

impl SessionStore {
    pub fn new(cache: Arc<CacheManager>, config: SessionConfig) -> Self {
        SessionStore { cache, config }
    }

    /// Session payload, empty when the session is unknown or expired.
    pub async fn read(&self, session_id: &str) -> Result<String, Error> {
        let data = self.cache.get(&self.key(session_id)).await?;
        Ok(data.unwrap_or_default())
    }

    pub async fn write(&self, session_id: &str, data: &str) -> Result<(), Error> {
        self.cache
            .set(&self.key(session_id), data, self.config.expiration)
            .await
    }

    pub async fn destroy(&self, session_id: &str) -> Result<(), Error> {
        self.cache.delete(&self.key(session_id)).await
    }

    fn key(&self, session_id: &str) -> String {
        format!("{}{session_id}", self.config.prefix)
    }
}
