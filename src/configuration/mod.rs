use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

mod error;

use crate::cache::{CacheManager, DriverConfig};
use crate::rate_limit::RateLimitConfig;
use crate::session::SessionConfig;
pub use error::Error;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub rate_limit: HashMap<String, RateLimitConfig>, // hashmap of limiter name <-> bucket parameters
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct CacheConfig {
    #[serde(default)]
    pub key_prefix: String,
    #[serde(default)]
    pub driver: DriverConfig,
}

impl CacheConfig {
    pub fn to_manager(&self) -> Result<CacheManager, Error> {
        let driver = self.driver.to_driver()?;
        Ok(CacheManager::new(driver, self.key_prefix.clone()))
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ObservabilityConfig {
    #[serde(default = "ObservabilityConfig::default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        ObservabilityConfig {
            log_level: ObservabilityConfig::default_log_level(),
        }
    }
}

impl ObservabilityConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Configuration {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let config_str = fs::read_to_string(path)?;
        Self::load_from_str(&config_str)
    }

    pub fn load_from_str(slice: &str) -> Result<Self, Error> {
        let config: Configuration = toml::from_str(slice)?;

        for (name, rate_limit) in &config.rate_limit {
            rate_limit
                .validate()
                .map_err(|err| Error::RateLimit(format!("{name}: {err}")))?;
        }

        Ok(config)
    }

    pub fn rate_limit(&self, name: &str) -> Result<&RateLimitConfig, Error> {
        self.rate_limit
            .get(name)
            .ok_or_else(|| Error::RateLimit(format!("no rate limit named '{name}'")))
    }

    pub fn cache_manager(&self) -> Result<Arc<CacheManager>, Error> {
        Ok(Arc::new(self.cache.to_manager()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{files, memcached, redis};

    #[test]
    fn test_load_empty_config() {
        let config = Configuration::load_from_str("").unwrap();

        assert_eq!(config.cache.key_prefix, "");
        assert_eq!(config.cache.driver, DriverConfig::Failover);
        assert!(config.rate_limit.is_empty());
        assert_eq!(config.session.prefix, "sess_");
        assert_eq!(config.session.expiration, 3600);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_load_full_config() {
        let config = r#"
        [cache]
        key_prefix = "app:"

        [cache.driver.redis]
        url = "redis://localhost:6379/0"

        [rate_limit.api]
        max = 5
        period = 60

        [session]
        prefix = "session:"

        [observability]
        log_level = "debug"
        "#;

        let config = Configuration::load_from_str(config).unwrap();

        assert_eq!(config.cache.key_prefix, "app:");
        assert_eq!(
            config.cache.driver,
            DriverConfig::Redis(redis::BackendConfig {
                url: "redis://localhost:6379/0".to_string(),
                probe_timeout: 500,
            })
        );
        assert_eq!(
            config.rate_limit("api").unwrap(),
            &RateLimitConfig { max: 5, period: 60 }
        );
        assert_eq!(config.session.prefix, "session:");
        assert_eq!(config.session.expiration, 3600);
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn test_driver_by_name() {
        let config = r#"
        [cache]
        driver = "memory"
        "#;
        let config = Configuration::load_from_str(config).unwrap();
        assert_eq!(config.cache.driver, DriverConfig::Failover);

        let config = r#"
        [cache.driver.files]
        root_dir = "/var/cache/app"
        "#;
        let config = Configuration::load_from_str(config).unwrap();
        assert_eq!(
            config.cache.driver,
            DriverConfig::Files(files::BackendConfig {
                root_dir: Some("/var/cache/app".to_string()),
            })
        );

        let config = r#"
        [cache.driver.memcached]
        url = "memcache://localhost:11211"
        "#;
        let config = Configuration::load_from_str(config).unwrap();
        assert_eq!(
            config.cache.driver,
            DriverConfig::Memcached(memcached::BackendConfig {
                url: "memcache://localhost:11211".to_string(),
                probe_timeout: 500,
            })
        );
    }

    #[test]
    fn test_invalid_rate_limit_is_rejected() {
        let config = r#"
        [rate_limit.api]
        max = 0
        period = 60
        "#;

        let result = Configuration::load_from_str(config);
        assert!(matches!(result, Err(Error::RateLimit(_))));
    }

    #[test]
    fn test_invalid_format_is_rejected() {
        let result = Configuration::load_from_str("[cache\nkey_prefix = 1");
        assert!(matches!(result, Err(Error::ConfigurationFileFormat(_))));
    }

    #[test]
    fn test_unknown_rate_limit() {
        let config = Configuration::load_from_str("").unwrap();
        assert!(matches!(config.rate_limit("api"), Err(Error::RateLimit(_))));
    }

    #[tokio::test]
    async fn test_cache_manager_from_config() {
        let config = r#"
        [cache]
        key_prefix = "app:"
        driver = "failover"
        "#;
        let config = Configuration::load_from_str(config).unwrap();

        let manager = config.cache_manager().unwrap();
        assert_eq!(manager.key_prefix(), "app:");
        assert!(manager.is_connected().await);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Configuration::load("/this/file/does/not/exist.toml");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
