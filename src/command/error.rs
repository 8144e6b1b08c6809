use std::fmt;

use crate::{cache, configuration, rate_limit};

#[derive(Debug)]
pub enum Error {
    Configuration(configuration::Error),
    Cache(cache::Error),
    RateLimit(rate_limit::Error),
    Runtime(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Configuration(err) => {
                write!(f, "Configuration error: ")?;
                write!(f, "{err}")
            }
            Error::Cache(err) => write!(f, "Cache error: {err}"),
            Error::RateLimit(err) => write!(f, "Rate limit error: {err}"),
            Error::Runtime(err) => write!(f, "Runtime error: {err}"),
        }
    }
}

impl From<configuration::Error> for Error {
    fn from(err: configuration::Error) -> Self {
        Error::Configuration(err)
    }
}

impl From<cache::Error> for Error {
    fn from(err: cache::Error) -> Self {
        Error::Cache(err)
    }
}

impl From<rate_limit::Error> for Error {
    fn from(err: rate_limit::Error) -> Self {
        Error::RateLimit(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Runtime(err.to_string())
    }
}
