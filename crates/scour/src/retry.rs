//! Retry policy for transient remote failures.
//!
//! Transient errors (rate limiting, timeouts, 5xx-class responses) re-enqueue
//! the same logical descriptor after an exponentially growing, jittered
//! delay. The budget is bounded: once `max_attempts` tries have failed, the
//! failure escalates to permanent and the partition is abandoned.

use core::time::Duration;
use rand::Rng;

/// Exponential backoff with full jitter.
///
/// The delay before attempt `n + 1` is `base_delay * 2^n`, capped at
/// `max_delay`; half of the computed delay is kept and the other half is
/// re-drawn uniformly at random, which avoids retry stampedes from many
/// descriptors failing at once (e.g., a rate-limited burst).
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Total tries per page request, including the first (0 disables
    /// retries entirely; the first failure is final).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound for the computed delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Whether a request that just failed its `attempt`-th try (0-based) has
    /// budget left.
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts
    }

    /// The jittered delay to wait before re-enqueueing after `attempt`
    /// failed tries.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
            .min(self.max_delay);
        let half = exp / 2;
        let jitter_ms = rand::rng().random_range(0..=half.as_millis() as u64);
        half + Duration::from_millis(jitter_ms)
    }
}
