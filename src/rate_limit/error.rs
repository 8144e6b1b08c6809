use std::fmt;

use tracing::debug;

use crate::cache;

#[derive(Debug, PartialEq)]
pub enum Error {
    InvalidConfiguration(String),
    Cache(cache::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidConfiguration(err) => write!(f, "Invalid rate limit configuration: {err}"),
            Error::Cache(err) => write!(f, "Cache error: {err}"),
        }
    }
}

impl From<cache::Error> for Error {
    fn from(error: cache::Error) -> Self {
        debug!("Rate limit cache error: {error}");
        Error::Cache(error)
    }
}
