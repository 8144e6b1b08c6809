use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{parse_counter, Driver, Error};

/// Volatile in-process driver the manager falls back to when its primary is unreachable.
///
/// Expirations are accepted and ignored: entries live until deleted, cleaned, or the process exits.
#[derive(Debug, Default)]
pub struct Backend {
    store: RwLock<HashMap<String, String>>,
}

impl Backend {
    pub fn new() -> Self {
        Backend {
            store: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

#[async_trait]
impl Driver for Backend {
    async fn is_connected(&self) -> bool {
        true
    }

    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let store = self.store.read().await;
        Ok(store.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, _expiration: u64) -> Result<(), Error> {
        let mut store = self.store.write().await;
        store.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let mut store = self.store.write().await;
        store.remove(key);
        Ok(())
    }

    async fn clean(&self) -> Result<(), Error> {
        let mut store = self.store.write().await;
        debug!("Dropping {} failover entries", store.len());
        store.clear();
        Ok(())
    }

    async fn increment(&self, key: &str, offset: i64) -> Result<(), Error> {
        let mut store = self.store.write().await;
        let current = parse_counter(store.get(key).map(String::as_str));
        store.insert(key.to_string(), current.wrapping_add(offset).to_string());
        Ok(())
    }
}
