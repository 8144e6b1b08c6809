use std::fmt;
use std::str::FromStr;

/// Persisted state of one identity's bucket, serialized as `"<time>|<stock>"`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bucket {
    pub last_refill: u64,
    pub stock: f64,
}

impl Bucket {
    /// Stock after refilling at `rate` tokens per second until `now`, capped at `max`.
    pub fn recovered_stock(&self, now: u64, rate: f64, max: f64) -> f64 {
        let elapsed = now.saturating_sub(self.last_refill);
        #[allow(clippy::cast_precision_loss)]
        let recovered = self.stock + elapsed as f64 * rate;
        recovered.min(max)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}|{}", self.last_refill, self.stock)
    }
}

#[derive(Debug, PartialEq)]
pub struct MalformedBucket;

impl FromStr for Bucket {
    type Err = MalformedBucket;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (time, stock) = s.split_once('|').ok_or(MalformedBucket)?;
        let last_refill = time.trim().parse::<u64>().map_err(|_| MalformedBucket)?;
        let stock = stock.trim().parse::<f64>().map_err(|_| MalformedBucket)?;

        if !stock.is_finite() {
            return Err(MalformedBucket);
        }

        Ok(Bucket { last_refill, stock })
    }
}
