/// Far-future timestamp (2100-01-01) used by drivers that always need a concrete deadline.
pub const ALWAYS: u64 = 4_102_444_800;

/// Expiration requested by a caller, resolved against the current epoch time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expiration {
    /// `0` was given: the backend decides, which for every bundled driver means never.
    BackendDefault,
    /// Absolute epoch timestamp, in seconds.
    At(u64),
}

impl Expiration {
    /// Values lower than `now` are delays relative to `now`, anything else is already absolute.
    pub fn resolve(raw: u64, now: u64) -> Self {
        if raw == 0 {
            Expiration::BackendDefault
        } else if raw < now {
            Expiration::At(now.saturating_add(raw))
        } else {
            Expiration::At(raw)
        }
    }

    /// Remaining lifetime in seconds, `None` when the entry never expires.
    pub fn ttl(self, now: u64) -> Option<u64> {
        match self {
            Expiration::BackendDefault => None,
            Expiration::At(deadline) => Some(deadline.saturating_sub(now)),
        }
    }

    pub fn deadline(self) -> u64 {
        match self {
            Expiration::BackendDefault => ALWAYS,
            Expiration::At(deadline) => deadline,
        }
    }
}
