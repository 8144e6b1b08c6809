use std::{fmt, io};

use memcache::MemcacheError;
use redis::RedisError;
use tracing::{debug, warn};

#[derive(Debug, PartialEq)]
pub enum Error {
    Backend(String),
    Execution(String),
    Io(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Backend(err) | Error::Execution(err) => write!(f, "{err}"),
            Error::Io(err) => write!(f, "IO error: {err}"),
        }
    }
}

impl From<RedisError> for Error {
    fn from(error: RedisError) -> Self {
        warn!("Redis driver error: {error}");
        Error::Backend("Backend error".to_string())
    }
}

impl From<MemcacheError> for Error {
    fn from(error: MemcacheError) -> Self {
        warn!("Memcached driver error: {error}");
        Error::Backend("Backend error".to_string())
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        debug!("File driver error: {error}");
        Error::Io(error.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        debug!("Serialization error: {error}");
        Error::Execution(error.to_string())
    }
}
