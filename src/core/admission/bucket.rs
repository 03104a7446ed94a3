//! Token bucket primitive

use std::time::{Duration, Instant};

/// A single capacity/refill pair with continuous refill.
///
/// Refill is computed from elapsed time whenever the bucket is touched, so
/// fractional tokens accumulate between observations instead of being lost
/// to a discrete tick. Callers provide synchronization; the exclusive borrow
/// on the mutating methods is what makes refill-check-subtract atomic.
#[derive(Debug)]
pub struct TokenBucket {
    /// Maximum tokens the bucket can hold.
    capacity: u64,
    /// Tokens regained per elapsed nanosecond.
    refill_per_nano: f64,
    /// Currently available tokens, `0.0..=capacity`.
    available: f64,
    /// Last instant tokens were topped up. Never moves backwards.
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a full bucket that regains `capacity` tokens per `window`.
    pub fn new(capacity: u64, window: Duration) -> Self {
        Self {
            capacity,
            refill_per_nano: capacity as f64 / window.as_nanos() as f64,
            available: capacity as f64,
            last_refill: Instant::now(),
        }
    }

    /// Refill from elapsed time, then subtract `n` tokens if the bucket can
    /// afford them. Returns whether the tokens were consumed.
    pub fn try_consume(&mut self, n: u64, now: Instant) -> bool {
        self.refill(now);
        let cost = n as f64;
        if self.available >= cost {
            self.available -= cost;
            true
        } else {
            false
        }
    }

    /// Token count a refill at `now` would produce, without mutating state.
    ///
    /// Used for the non-mutating pre-check in [`super::WindowSet`] and for
    /// telemetry snapshots; concurrent consumers may race it, which is
    /// acceptable for both uses.
    pub fn peek(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.last_refill);
        (self.available + elapsed.as_nanos() as f64 * self.refill_per_nano)
            .min(self.capacity as f64)
    }

    /// Whole tokens currently available.
    pub fn available(&self, now: Instant) -> u64 {
        self.peek(now) as u64
    }

    /// Configured ceiling.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        if elapsed.is_zero() {
            return;
        }
        self.available = (self.available + elapsed.as_nanos() as f64 * self.refill_per_nano)
            .min(self.capacity as f64);
        self.last_refill = now;
    }
}
