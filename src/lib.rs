#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]

//! Key-value cache over interchangeable drivers, with automatic failover to an in-process store
//! while the configured driver is unreachable, and a token bucket rate limiter built on top.

pub mod cache;
pub mod clock;
pub mod command;
pub mod configuration;
pub mod rate_limit;
pub mod session;
