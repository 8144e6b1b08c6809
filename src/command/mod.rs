pub mod cache;
mod error;
pub mod rate_limit;

pub use error::Error;
