use async_trait::async_trait;
use std::fmt::Debug;

mod config;
mod error;
mod expiration;
pub mod failover;
pub mod files;
mod manager;
pub mod memcached;
pub mod redis;
mod serializing_cache;

pub use config::DriverConfig;
pub use error::Error;
pub use expiration::Expiration;
pub use manager::{CacheManager, DEFAULT_EXPIRATION, DEFAULT_OFFSET};
pub use serializing_cache::{retrieve, store};

#[cfg(test)]
pub(crate) use manager::tests::{BrokenDriver, StubDriver};

/// Capability contract every cache backend implements, the failover driver included.
///
/// Keys are used verbatim: namespacing is applied by the [`CacheManager`] before a driver
/// ever sees them.
#[async_trait]
pub trait Driver: Debug + Send + Sync {
    /// Cheap liveness probe. Probe failures are reported as `false`, never as an error.
    async fn is_connected(&self) -> bool;

    /// Retrieve a value from the cache
    ///
    /// # Returns
    ///
    /// * `Ok(Some(String))` if the value was found and has not expired
    /// * `Ok(None)` if the value is missing or expired
    /// * `Err(Error)` if the backend could not be queried
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Store a value in the cache
    ///
    /// # Arguments
    ///
    /// * `key` - The key to store the value under
    /// * `value` - The value to store
    /// * `expiration` - A delay in seconds when lower than the current epoch time, an absolute
    ///   epoch timestamp otherwise. `0` selects the backend default.
    async fn set(&self, key: &str, value: &str, expiration: u64) -> Result<(), Error>;

    /// Remove a key. Missing keys are not an error.
    async fn delete(&self, key: &str) -> Result<(), Error>;

    /// Remove every key held by the backend.
    async fn clean(&self) -> Result<(), Error>;

    /// Add `offset` to the integer counter stored under `key`.
    ///
    /// Missing or non-numeric values count as `0`. The result never expires.
    async fn increment(&self, key: &str, offset: i64) -> Result<(), Error>;

    /// Subtract `offset` from the integer counter stored under `key`.
    async fn decrement(&self, key: &str, offset: i64) -> Result<(), Error> {
        self.increment(key, offset.wrapping_neg()).await
    }
}

/// Reads a stored value as a counter, the way every driver interprets it.
pub(crate) fn parse_counter(value: Option<&str>) -> i64 {
    value
        .and_then(|value| value.trim().parse::<i64>().ok())
        .unwrap_or_default()
}
