use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use serde::Deserialize;
use tokio::time;
use tracing::{debug, info};

use crate::cache::{Driver, Error, Expiration};
use crate::clock::{Clock, SystemClock};

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

#[derive(Debug)]
pub struct Backend {
    client: redis::Client,
    probe_timeout: Duration,
}

impl Backend {
    pub fn new(config: &BackendConfig) -> Result<Self, Error> {
        info!("Using Redis cache driver");
        let client = redis::Client::open(config.url.as_str())?;
        Ok(Backend {
            client,
            probe_timeout: Duration::from_millis(config.probe_timeout),
        })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, Error> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    async fn ping(&self) -> Result<String, Error> {
        let mut conn = self.get_connection().await?;
        Ok(redis::cmd("PING").query_async(&mut conn).await?)
    }
}

#[async_trait]
impl Driver for Backend {
    async fn is_connected(&self) -> bool {
        match time::timeout(self.probe_timeout, self.ping()).await {
            Ok(Ok(reply)) => reply == "PONG",
            Ok(Err(err)) => {
                debug!("Redis probe failed: {err}");
                false
            }
            Err(_) => {
                debug!("Redis probe timed out after {:?}", self.probe_timeout);
                false
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, expiration: u64) -> Result<(), Error> {
        let now = SystemClock.now();
        let mut conn = self.get_connection().await?;
        match Expiration::resolve(expiration, now).ttl(now) {
            // SETEX rejects a zero TTL, an already elapsed deadline keeps the value for one second
            Some(ttl) => Ok(conn.set_ex(key, value, ttl.max(1)).await?),
            None => Ok(conn.set(key, value).await?),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let mut conn = self.get_connection().await?;
        Ok(conn.del(key).await?)
    }

    async fn clean(&self) -> Result<(), Error> {
        let mut conn = self.get_connection().await?;
        Ok(redis::cmd("FLUSHDB").query_async(&mut conn).await?)
    }

    async fn increment(&self, key: &str, offset: i64) -> Result<(), Error> {
        let mut conn = self.get_connection().await?;
        let _: i64 = conn.incr(key, offset).await?;
        Ok(())
    }

    async fn decrement(&self, key: &str, offset: i64) -> Result<(), Error> {
        let mut conn = self.get_connection().await?;
        let _: i64 = conn.decr(key, offset).await?;
        Ok(())
    }
}
