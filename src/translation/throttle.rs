/*!
 * Token-bucket throttle for pacing window dispatches.
 *
 * The bucket starts full with `permits` tokens and regains one token every
 * `interval`. Each dispatch reserves a token; when the bucket is empty the
 * reservation goes into debt and reports how long the caller must wait.
 * A window is delayed, never dropped.
 */

use parking_lot::Mutex;
use std::time::{Duration, Instant};

use crate::errors::TranslationError;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last: Instant,
}

/// Token-bucket rate limiter
#[derive(Debug)]
pub struct Throttle {
    permits: u32,
    interval: Duration,
    bucket: Mutex<Bucket>,
}

impl Throttle {
    /// Create a throttle allowing bursts of `permits` dispatches and one
    /// additional dispatch per `interval`
    pub fn new(permits: u32, interval: Duration) -> Result<Self, TranslationError> {
        if permits == 0 {
            return Err(TranslationError::InvalidThrottle("permits must be at least 1".to_string()));
        }
        if interval.is_zero() {
            return Err(TranslationError::InvalidThrottle("interval must be greater than zero".to_string()));
        }

        Ok(Self {
            permits,
            interval,
            bucket: Mutex::new(Bucket {
                tokens: f64::from(permits),
                last: Instant::now(),
            }),
        })
    }

    /// Build a throttle only when both parameters are set
    pub fn from_settings(permits: u32, interval_secs: u64) -> Result<Option<Self>, TranslationError> {
        if permits == 0 || interval_secs == 0 {
            return Ok(None);
        }
        Self::new(permits, Duration::from_secs(interval_secs)).map(Some)
    }

    /// Reserve one token now and return how long to wait before using it
    pub fn reserve(&self) -> Duration {
        self.reserve_at(Instant::now())
    }

    /// Reserve one token at the given instant
    pub fn reserve_at(&self, now: Instant) -> Duration {
        let mut bucket = self.bucket.lock();

        let elapsed = now.saturating_duration_since(bucket.last);
        let refill = elapsed.as_secs_f64() / self.interval.as_secs_f64();
        bucket.tokens = (bucket.tokens + refill).min(f64::from(self.permits));
        bucket.last = now;

        bucket.tokens -= 1.0;
        if bucket.tokens >= 0.0 {
            Duration::ZERO
        } else {
            self.interval.mul_f64(-bucket.tokens)
        }
    }

    pub fn permits(&self) -> u32 {
        self.permits
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
