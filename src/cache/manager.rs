use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{info, instrument, warn};

use crate::cache::{failover, Driver, Error};

/// Expiration applied by callers that have no opinion, in seconds
pub const DEFAULT_EXPIRATION: u64 = 30;
pub const DEFAULT_OFFSET: i64 = 1;

/// Routes every operation to the primary driver while it answers its liveness probe, and to an
/// owned in-process failover driver otherwise.
///
/// The probe runs on every operation: an outage or a recovery is picked up by the very next
/// call, without reconfiguration. All keys are stored as `key_prefix + key`.
#[derive(Debug)]
pub struct CacheManager {
    primary: ArcSwap<Arc<dyn Driver>>,
    failover: Arc<failover::Backend>,
    is_connected: AtomicBool,
    key_prefix: String,
}

impl CacheManager {
    pub fn new(primary: Arc<dyn Driver>, key_prefix: impl Into<String>) -> Self {
        CacheManager {
            primary: ArcSwap::from_pointee(primary),
            failover: Arc::new(failover::Backend::new()),
            is_connected: AtomicBool::new(false),
            key_prefix: key_prefix.into(),
        }
    }

    /// Replace the primary driver, effective from the next operation.
    pub fn set_driver(&self, driver: Arc<dyn Driver>) {
        info!("Replacing primary cache driver");
        self.primary.store(Arc::new(driver));
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub fn failover(&self) -> &failover::Backend {
        &self.failover
    }

    /// Probe the primary driver and remember the outcome.
    pub async fn is_connected(&self) -> bool {
        let primary = self.primary();
        let is_connected = primary.is_connected().await;

        let was_connected = self.is_connected.swap(is_connected, Ordering::Relaxed);
        if was_connected && !is_connected {
            warn!("Primary cache driver unreachable, using failover store");
        } else if !was_connected && is_connected {
            info!("Primary cache driver reachable");
        }

        is_connected
    }

    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let driver = self.connected_driver().await;
        driver.get(&self.effective_key(key)).await
    }

    #[instrument(skip(self, value))]
    pub async fn set(&self, key: &str, value: &str, expiration: u64) -> Result<(), Error> {
        let driver = self.connected_driver().await;
        driver.set(&self.effective_key(key), value, expiration).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, key: &str) -> Result<(), Error> {
        let driver = self.connected_driver().await;
        driver.delete(&self.effective_key(key)).await
    }

    #[instrument(skip(self))]
    pub async fn increment(&self, key: &str, offset: i64) -> Result<(), Error> {
        let driver = self.connected_driver().await;
        driver.increment(&self.effective_key(key), offset).await
    }

    #[instrument(skip(self))]
    pub async fn decrement(&self, key: &str, offset: i64) -> Result<(), Error> {
        let driver = self.connected_driver().await;
        driver.decrement(&self.effective_key(key), offset).await
    }

    /// Flush the driver currently serving requests. This is not limited to the key prefix.
    #[instrument(skip(self))]
    pub async fn clean(&self) -> Result<(), Error> {
        let driver = self.connected_driver().await;
        driver.clean().await
    }

    fn primary(&self) -> Arc<dyn Driver> {
        Arc::clone(&**self.primary.load())
    }

    async fn connected_driver(&self) -> Arc<dyn Driver> {
        if self.is_connected().await {
            return self.primary();
        }

        let failover: Arc<dyn Driver> = self.failover.clone();
        failover
    }

    fn effective_key(&self, key: &str) -> String {
        format!("{}{key}", self.key_prefix)
    }
}
