use std::sync::Arc;

use serde::Deserialize;

use crate::cache;
use crate::cache::{Driver, Error};

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub enum DriverConfig {
    #[default]
    #[serde(rename = "failover", alias = "memory")]
    Failover,
    #[serde(rename = "redis")]
    Redis(cache::redis::BackendConfig),
    #[serde(rename = "memcached")]
    Memcached(cache::memcached::BackendConfig),
    #[serde(rename = "files")]
    Files(cache::files::BackendConfig),
}

impl DriverConfig {
    pub fn to_driver(&self) -> Result<Arc<dyn Driver>, Error> {
        match self {
            DriverConfig::Redis(config) => Ok(Arc::new(cache::redis::Backend::new(config)?)),
            DriverConfig::Memcached(config) => {
                Ok(Arc::new(cache::memcached::Backend::new(config)?))
            }
            DriverConfig::Files(config) => Ok(Arc::new(cache::files::Backend::new(config))),
            DriverConfig::Failover => Ok(Arc::new(cache::failover::Backend::new())),
        }
    }

    /// Whether the primary forgets everything when the process exits.
    pub fn is_volatile(&self) -> bool {
        matches!(self, DriverConfig::Failover)
    }
}
