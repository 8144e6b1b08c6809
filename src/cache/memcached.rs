use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use memcache::MemcacheError;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::{task, time};
use tracing::{debug, info};

use crate::cache::{parse_counter, Driver, Error, Expiration};
use crate::clock::{Clock, SystemClock};

const URL_SCHEME: &str = "memcache://";

/// Longest relative expiration memcached accepts, larger values are read as epoch timestamps.
const MAX_RELATIVE_EXPIRATION: u64 = 60 * 60 * 24 * 30;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BackendConfig {
    pub url: String,
    /// Upper bound for the liveness probe, in milliseconds
    #[serde(default = "BackendConfig::default_probe_timeout")]
    pub probe_timeout: u64,
}

impl BackendConfig {
    fn default_probe_timeout() -> u64 {
        500
    }
}

/// Memcached driver. The connection is opened on first use, so an unreachable server only
/// makes the driver report itself disconnected.
pub struct Backend {
    url: String,
    probe_timeout: Duration,
    client: Mutex<Option<Arc<memcache::Client>>>,
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("url", &self.url)
            .field("probe_timeout", &self.probe_timeout)
            .finish_non_exhaustive()
    }
}

impl Backend {
    pub fn new(config: &BackendConfig) -> Result<Self, Error> {
        if !config.url.starts_with(URL_SCHEME) {
            return Err(Error::Backend(format!(
                "Invalid memcached URL, expected {URL_SCHEME}host:port"
            )));
        }

        info!("Using Memcached cache driver");
        Ok(Backend {
            url: config.url.clone(),
            probe_timeout: Duration::from_millis(config.probe_timeout),
            client: Mutex::new(None),
        })
    }

    async fn client(&self) -> Result<Arc<memcache::Client>, Error> {
        let mut client = self.client.lock().await;
        if let Some(client) = client.as_ref() {
            return Ok(Arc::clone(client));
        }

        let url = self.url.clone();
        let connected = task::spawn_blocking(move || memcache::connect(url.as_str()))
            .await
            .map_err(|err| Error::Execution(err.to_string()))??;

        let connected = Arc::new(connected);
        *client = Some(Arc::clone(&connected));
        Ok(connected)
    }

    /// The client is synchronous: every command runs on the blocking pool.
    async fn run<T, F>(&self, command: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: FnOnce(&memcache::Client) -> Result<T, MemcacheError> + Send + 'static,
    {
        let client = self.client().await?;
        let result = task::spawn_blocking(move || command(client.as_ref()))
            .await
            .map_err(|err| Error::Execution(err.to_string()))?;
        Ok(result?)
    }
}

/// Converts an expiration to the memcached convention: `0` never expires, up to 30 days is
/// relative, anything above is an epoch timestamp.
fn to_memcached_expiration(expiration: Expiration, now: u64) -> u32 {
    match expiration.ttl(now) {
        None => 0,
        Some(ttl) if ttl <= MAX_RELATIVE_EXPIRATION => u32::try_from(ttl.max(1)).unwrap_or(1),
        Some(_) => u32::try_from(expiration.deadline()).unwrap_or(u32::MAX),
    }
}

#[async_trait]
impl Driver for Backend {
    async fn is_connected(&self) -> bool {
        let probe = self.run(|client| client.version().map(|_| ()));
        match time::timeout(self.probe_timeout, probe).await {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                debug!("Memcached probe failed: {err}");
                false
            }
            Err(_) => {
                debug!("Memcached probe timed out after {:?}", self.probe_timeout);
                false
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let key = key.to_string();
        self.run(move |client| client.get::<String>(&key)).await
    }

    async fn set(&self, key: &str, value: &str, expiration: u64) -> Result<(), Error> {
        let now = SystemClock.now();
        let expiration = to_memcached_expiration(Expiration::resolve(expiration, now), now);
        let (key, value) = (key.to_string(), value.to_string());
        self.run(move |client| client.set(&key, value.as_str(), expiration))
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let key = key.to_string();
        self.run(move |client| client.delete(&key).map(|_| ()))
            .await
    }

    async fn clean(&self) -> Result<(), Error> {
        self.run(|client| client.flush()).await
    }

    // Native INCR/DECR refuse missing keys and clamp at zero, counters are rewritten instead
    async fn increment(&self, key: &str, offset: i64) -> Result<(), Error> {
        let key = key.to_string();
        self.run(move |client| {
            let current = parse_counter(client.get::<String>(&key)?.as_deref());
            client.set(&key, current.wrapping_add(offset).to_string().as_str(), 0)
        })
        .await
    }
}
