use std::fmt::Debug;

use chrono::Utc;

/// Source of the current epoch time, in whole seconds.
pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> u64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        u64::try_from(Utc::now().timestamp()).unwrap_or_default()
    }
}
