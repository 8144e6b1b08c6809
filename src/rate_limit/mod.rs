use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::cache::CacheManager;
use crate::clock::{Clock, SystemClock};

mod bucket;
mod error;

pub use bucket::{Bucket, MalformedBucket};
pub use error::Error;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RateLimitConfig {
    pub max: u32,
    /// Seconds needed to refill an empty bucket
    pub period: u32,
}

impl RateLimitConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.max == 0 {
            return Err(Error::InvalidConfiguration(
                "max must be greater than zero".to_string(),
            ));
        }
        if self.period == 0 {
            return Err(Error::InvalidConfiguration(
                "period must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Token bucket rate limiter keeping its state in a [`CacheManager`].
///
/// Each identity owns a bucket of `max` tokens refilled continuously at `max / period` tokens
/// per second. Buckets are stored under `"<name>:<identity>"` and expire after one idle period,
/// after which the identity starts over with a full bucket.
///
/// A first hit costing more than `max` is admitted and leaves the bucket in debt: the stored
/// stock goes negative and has to be recovered before the next admission.
///
/// Reading and writing a bucket are two separate cache operations: concurrent checks for the
/// same identity can both be admitted on the same tokens.
#[derive(Debug)]
pub struct RateLimit {
    name: String,
    max: u32,
    period: u32,
    cache: Arc<CacheManager>,
    clock: Arc<dyn Clock>,
}

impl RateLimit {
    pub fn new(
        name: impl Into<String>,
        max: u32,
        period: u32,
        cache: Arc<CacheManager>,
    ) -> Result<Self, Error> {
        RateLimitConfig { max, period }.validate()?;

        Ok(RateLimit {
            name: name.into(),
            max,
            period,
            cache,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn from_config(
        name: impl Into<String>,
        config: &RateLimitConfig,
        cache: Arc<CacheManager>,
    ) -> Result<Self, Error> {
        Self::new(name, config.max, config.period, cache)
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Try to take `cost` tokens from the bucket of `identity`.
    ///
    /// Returns `false` when not enough tokens have been recovered. The bucket is refilled and
    /// persisted in both cases. The first check of an identity is always admitted.
    #[instrument(skip(self), fields(limiter = %self.name))]
    pub async fn check(&self, identity: &str, cost: u32) -> Result<bool, Error> {
        let (allowed, _) = self.consume(identity, cost).await?;
        Ok(allowed)
    }

    /// Number of whole tokens currently available to `identity`.
    pub async fn remnant(&self, identity: &str) -> Result<u32, Error> {
        let (_, stock) = self.consume(identity, 0).await?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let remnant = stock.max(0.0).floor() as u32;
        Ok(remnant.min(self.max))
    }

    /// Forget the bucket of `identity`, its next check starts with a full bucket.
    pub async fn purge(&self, identity: &str) -> Result<(), Error> {
        Ok(self.cache.delete(&self.key(identity)).await?)
    }

    async fn consume(&self, identity: &str, cost: u32) -> Result<(bool, f64), Error> {
        let now = self.clock.now();
        let max = f64::from(self.max);
        let rate = max / f64::from(self.period);

        // First hit: admitted unconditionally, a cost above max leaves a negative stock
        let Some(previous) = self.load(identity).await? else {
            let stock = max - f64::from(cost);
            self.save(
                identity,
                Bucket {
                    last_refill: now,
                    stock,
                },
            )
            .await?;
            return Ok((true, stock));
        };

        let stock = previous.recovered_stock(now, rate, max);
        let last_refill = now.max(previous.last_refill);

        if stock < f64::from(cost) {
            debug!("Rate limit reached for {identity}");
            self.save(identity, Bucket { last_refill, stock }).await?;
            return Ok((false, stock));
        }

        let stock = stock - f64::from(cost);
        self.save(identity, Bucket { last_refill, stock }).await?;
        Ok((true, stock))
    }

    async fn load(&self, identity: &str) -> Result<Option<Bucket>, Error> {
        let key = self.key(identity);
        let Some(value) = self.cache.get(&key).await? else {
            return Ok(None);
        };

        match value.parse::<Bucket>() {
            Ok(bucket) => Ok(Some(bucket)),
            Err(MalformedBucket) => {
                warn!("Ignoring malformed rate limit bucket under {key}: {value}");
                Ok(None)
            }
        }
    }

    async fn save(&self, identity: &str, bucket: Bucket) -> Result<(), Error> {
        let value = bucket.to_string();
        Ok(self
            .cache
            .set(&self.key(identity), &value, u64::from(self.period))
            .await?)
    }

    fn key(&self, identity: &str) -> String {
        format!("{}:{identity}", self.name)
    }
}
