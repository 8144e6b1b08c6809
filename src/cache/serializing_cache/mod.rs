use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{CacheManager, Error};

#[cfg(test)]
mod tests;

/// Read a JSON document stored under `key` and decode it as `T`.
///
/// A miss is `Ok(None)`. Undecodable payloads are reported as [`Error::Execution`] rather than
/// silently treated as a miss.
pub async fn retrieve<T>(cache: &CacheManager, key: &str) -> Result<Option<T>, Error>
where
    T: DeserializeOwned,
{
    let Some(payload) = cache.get(key).await.map_err(|err| {
        warn!("Cache lookup failed for {key}: {err}");
        Error::Execution(format!("Cache lookup failed: {err}"))
    })?
    else {
        return Ok(None);
    };

    let value = serde_json::from_str::<T>(&payload).map_err(|err| {
        warn!("Undecodable cache payload under {key}: {err}");
        Error::Execution(format!("Undecodable cache payload: {err}"))
    })?;

    debug!("Cache hit for {key}");
    Ok(Some(value))
}

/// Encode `value` as JSON and store it under `key`, see [`CacheManager::set`] for `expiration`.
pub async fn store<T>(cache: &CacheManager, key: &str, value: &T, expiration: u64) -> Result<(), Error>
where
    T: Serialize,
{
    let payload = serde_json::to_string(value).map_err(|err| {
        warn!("Unable to encode cache payload for {key}: {err}");
        Error::Execution(format!("Unable to encode cache payload: {err}"))
    })?;

    cache.set(key, &payload, expiration).await.map_err(|err| {
        warn!("Cache write failed for {key}: {err}");
        Error::Execution(format!("Cache write failed: {err}"))
    })
}
