use argh::FromArgs;
use tracing::info;

use crate::cache::{CacheManager, DEFAULT_EXPIRATION, DEFAULT_OFFSET};
use crate::command::Error;

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "status",
    description = "Report whether the configured cache driver is reachable"
)]
pub struct StatusOptions {}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "get", description = "Print the value stored under a key")]
pub struct GetOptions {
    #[argh(positional)]
    /// the key to read
    pub key: String,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "set", description = "Store a value under a key")]
pub struct SetOptions {
    #[argh(positional)]
    /// the key to write
    pub key: String,
    #[argh(positional)]
    /// the value to store
    pub value: String,
    #[argh(option, short = 'e', default = "DEFAULT_EXPIRATION")]
    /// delay in seconds, or absolute epoch timestamp, before the value expires; 0 for the driver default
    pub expiration: u64,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "delete", description = "Remove a key")]
pub struct DeleteOptions {
    #[argh(positional)]
    /// the key to remove
    pub key: String,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "incr", description = "Increment an integer counter")]
pub struct IncrOptions {
    #[argh(positional)]
    /// the counter key
    pub key: String,
    #[argh(option, short = 'o', default = "DEFAULT_OFFSET")]
    /// amount to add, defaults to 1
    pub offset: i64,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "decr", description = "Decrement an integer counter")]
pub struct DecrOptions {
    #[argh(positional)]
    /// the counter key
    pub key: String,
    #[argh(option, short = 'o', default = "DEFAULT_OFFSET")]
    /// amount to subtract, defaults to 1
    pub offset: i64,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "clean",
    description = "Remove every key from the driver currently in use"
)]
pub struct CleanOptions {}

impl StatusOptions {
    pub async fn run(&self, cache: &CacheManager) -> Result<String, Error> {
        if cache.is_connected().await {
            Ok("connected".to_string())
        } else {
            Ok("disconnected, using failover store".to_string())
        }
    }
}

impl GetOptions {
    pub async fn run(&self, cache: &CacheManager) -> Result<String, Error> {
        Ok(cache.get(&self.key).await?.unwrap_or_default())
    }
}

impl SetOptions {
    pub async fn run(&self, cache: &CacheManager) -> Result<String, Error> {
        cache.set(&self.key, &self.value, self.expiration).await?;
        Ok(String::new())
    }
}

impl DeleteOptions {
    pub async fn run(&self, cache: &CacheManager) -> Result<String, Error> {
        cache.delete(&self.key).await?;
        Ok(String::new())
    }
}

impl IncrOptions {
    pub async fn run(&self, cache: &CacheManager) -> Result<String, Error> {
        cache.increment(&self.key, self.offset).await?;
        Ok(cache.get(&self.key).await?.unwrap_or_default())
    }
}

impl DecrOptions {
    pub async fn run(&self, cache: &CacheManager) -> Result<String, Error> {
        cache.decrement(&self.key, self.offset).await?;
        Ok(cache.get(&self.key).await?.unwrap_or_default())
    }
}

impl CleanOptions {
    pub async fn run(&self, cache: &CacheManager) -> Result<String, Error> {
        cache.clean().await?;
        info!("Cache cleaned");
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::StubDriver;

    #[tokio::test]
    async fn test_status() {
        let primary = StubDriver::new(true);
        let cache = CacheManager::new(primary.clone(), "");

        assert_eq!(StatusOptions {}.run(&cache).await.unwrap(), "connected");

        primary.set_connected(false);
        assert_eq!(
            StatusOptions {}.run(&cache).await.unwrap(),
            "disconnected, using failover store"
        );
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = CacheManager::new(StubDriver::new(true), "cli:");

        let set = SetOptions {
            key: "key".to_string(),
            value: "value".to_string(),
            expiration: DEFAULT_EXPIRATION,
        };
        set.run(&cache).await.unwrap();

        let get = GetOptions {
            key: "key".to_string(),
        };
        assert_eq!(get.run(&cache).await.unwrap(), "value");

        let delete = DeleteOptions {
            key: "key".to_string(),
        };
        delete.run(&cache).await.unwrap();
        assert_eq!(get.run(&cache).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_counters() {
        let cache = CacheManager::new(StubDriver::new(false), "");

        let incr = IncrOptions {
            key: "hits".to_string(),
            offset: 5,
        };
        assert_eq!(incr.run(&cache).await.unwrap(), "5");

        let decr = DecrOptions {
            key: "hits".to_string(),
            offset: DEFAULT_OFFSET,
        };
        assert_eq!(decr.run(&cache).await.unwrap(), "4");

        CleanOptions {}.run(&cache).await.unwrap();
        assert_eq!(cache.get("hits").await, Ok(None));
    }

    #[test]
    fn test_parse_set_defaults() {
        let options = SetOptions::from_args(&["set"], &["key", "value"]).unwrap();
        assert_eq!(options.expiration, DEFAULT_EXPIRATION);

        let options = SetOptions::from_args(&["set"], &["key", "value", "-e", "0"]).unwrap();
        assert_eq!(options.expiration, 0);
    }
}
