//! Keyed token-bucket admission control for auth flows.
//!
//! Buckets are process-local and reconstructed lazily; a restart resets
//! limits. Durable issuance limits (one-time codes per email) are counted
//! from persisted rows instead, see `otp::is_rate_limited`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub trait RateLimiter: Send + Sync {
    /// Take one token for `key` if available. Never fails, only denies.
    fn admit(&self, key: &str) -> bool;
    /// Administrative override: forget the bucket so the next call starts full.
    fn reset(&self, key: &str);
}

/// Limiter that admits everything; used in tests and as a wiring default.
#[derive(Clone, Debug)]
pub struct NoopRateLimiter;

impl RateLimiter for NoopRateLimiter {
    fn admit(&self, _key: &str) -> bool {
        true
    }

    fn reset(&self, _key: &str) {}
}

#[derive(Debug)]
struct Bucket {
    tokens: u32,
    last_refill: Instant,
}

/// Classic token bucket with discrete refills: every elapsed whole window
/// adds `refill` tokens up to `capacity`, partial windows add nothing.
#[derive(Debug)]
pub struct TokenBucketLimiter {
    capacity: u32,
    refill: u32,
    window: Duration,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl TokenBucketLimiter {
    #[must_use]
    pub fn new(capacity: u32, refill: u32, window: Duration) -> Self {
        Self {
            capacity,
            refill,
            window,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    fn refill_bucket(&self, bucket: &mut Bucket, now: Instant) {
        if self.window.is_zero() {
            bucket.tokens = self.capacity;
            bucket.last_refill = now;
            return;
        }
        let elapsed = now.duration_since(bucket.last_refill);
        let windows = u32::try_from(elapsed.as_nanos() / self.window.as_nanos()).unwrap_or(u32::MAX);
        if windows == 0 {
            return;
        }
        bucket.tokens = bucket
            .tokens
            .saturating_add(windows.saturating_mul(self.refill))
            .min(self.capacity);
        // Advance by whole windows only, so partial windows keep accruing.
        bucket.last_refill += self.window.saturating_mul(windows.min(1 << 16));
        if bucket.tokens == self.capacity {
            bucket.last_refill = now;
        }
    }
}

impl RateLimiter for TokenBucketLimiter {
    fn admit(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            tokens: self.capacity,
            last_refill: now,
        });
        self.refill_bucket(bucket, now);
        if bucket.tokens > 0 {
            bucket.tokens -= 1;
            true
        } else {
            false
        }
    }

    fn reset(&self, key: &str) {
        let mut buckets = self.buckets.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        buckets.remove(key);
    }
}
