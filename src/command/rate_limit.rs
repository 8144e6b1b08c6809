use std::sync::Arc;

use argh::FromArgs;

use crate::cache::CacheManager;
use crate::command::Error;
use crate::configuration::Configuration;
use crate::rate_limit::RateLimit;

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "check",
    description = "Take tokens from an identity's bucket, exits with 1 when the limit is reached"
)]
pub struct CheckOptions {
    #[argh(positional)]
    /// the rate limit name, as configured under [rate_limit.<name>]
    pub limiter: String,
    #[argh(positional)]
    /// the identity being limited
    pub identity: String,
    #[argh(option, short = 'u', default = "1")]
    /// tokens consumed by this request, defaults to 1
    pub cost: u32,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "remnant",
    description = "Print the whole tokens left in an identity's bucket"
)]
pub struct RemnantOptions {
    #[argh(positional)]
    /// the rate limit name
    pub limiter: String,
    #[argh(positional)]
    /// the identity being limited
    pub identity: String,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "purge",
    description = "Reset an identity's bucket"
)]
pub struct PurgeOptions {
    #[argh(positional)]
    /// the rate limit name
    pub limiter: String,
    #[argh(positional)]
    /// the identity being limited
    pub identity: String,
}

fn build_limiter(
    config: &Configuration,
    name: &str,
    cache: Arc<CacheManager>,
) -> Result<RateLimit, Error> {
    let limit = config.rate_limit(name)?;
    Ok(RateLimit::from_config(name, limit, cache)?)
}

impl CheckOptions {
    /// Returns whether the request was admitted.
    pub async fn run(&self, config: &Configuration, cache: Arc<CacheManager>) -> Result<bool, Error> {
        let limiter = build_limiter(config, &self.limiter, cache)?;
        Ok(limiter.check(&self.identity, self.cost).await?)
    }
}

impl RemnantOptions {
    pub async fn run(&self, config: &Configuration, cache: Arc<CacheManager>) -> Result<String, Error> {
        let limiter = build_limiter(config, &self.limiter, cache)?;
        Ok(limiter.remnant(&self.identity).await?.to_string())
    }
}

impl PurgeOptions {
    pub async fn run(&self, config: &Configuration, cache: Arc<CacheManager>) -> Result<String, Error> {
        let limiter = build_limiter(config, &self.limiter, cache)?;
        limiter.purge(&self.identity).await?;
        Ok(String::new())
    }
}
