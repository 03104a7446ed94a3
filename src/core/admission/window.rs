//! Window set: the layered budgets enforced for one client

use super::bucket::TokenBucket;
use std::time::{Duration, Instant};

/// An enforced budget window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Second,
    Minute,
    Hour,
}

impl Window {
    /// Span over which the window's capacity refills.
    pub fn duration(&self) -> Duration {
        match self {
            Window::Second => Duration::from_secs(1),
            Window::Minute => Duration::from_secs(60),
            Window::Hour => Duration::from_secs(3600),
        }
    }

    /// Suffix used in the `X-RateLimit-*` response headers.
    pub fn label(&self) -> &'static str {
        match self {
            Window::Second => "Second",
            Window::Minute => "Minute",
            Window::Hour => "Hour",
        }
    }
}

/// Per-window telemetry read from a bucket.
#[derive(Debug, Clone)]
pub struct WindowSnapshot {
    pub window: Window,
    pub available: u64,
    pub limit: u64,
}

/// The ordered buckets enforced for one client, evaluated as a conjunction.
///
/// Length and ordering are fixed at construction. Exactly one `WindowSet`
/// exists per client; the owning store keeps it behind a per-client mutex,
/// so the `&mut` methods here run serialized for a given client without
/// contending with other clients.
#[derive(Debug)]
pub struct WindowSet {
    buckets: Vec<(Window, TokenBucket)>,
}

impl WindowSet {
    pub fn new(limits: &[(Window, u64)]) -> Self {
        Self {
            buckets: limits
                .iter()
                .map(|&(window, capacity)| (window, TokenBucket::new(capacity, window.duration())))
                .collect(),
        }
    }

    /// Consume `n` tokens from every window, or from none.
    ///
    /// A non-mutating peek pass runs first; only when every bucket can
    /// afford `n` is the consuming pass applied, in window order. A failed
    /// attempt therefore leaves every token count unchanged, so a partial
    /// debit can never corrupt later enforcement.
    pub fn try_consume(&mut self, n: u64, now: Instant) -> bool {
        let cost = n as f64;
        if self.buckets.iter().any(|(_, bucket)| bucket.peek(now) < cost) {
            return false;
        }
        for (_, bucket) in &mut self.buckets {
            let consumed = bucket.try_consume(n, now);
            debug_assert!(consumed, "bucket refused consumption after passing pre-check");
        }
        true
    }

    /// Remaining/limit telemetry for every window.
    pub fn snapshots(&self, now: Instant) -> Vec<WindowSnapshot> {
        self.buckets
            .iter()
            .map(|(window, bucket)| WindowSnapshot {
                window: *window,
                available: bucket.available(now),
                limit: bucket.capacity(),
            })
            .collect()
    }
}
