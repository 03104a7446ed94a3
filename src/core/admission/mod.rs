//! Admission control core
//!
//! Tracks every client's consumption against layered time budgets and
//! places offenders on a cooldown blocklist. One [`AdmissionControl`] value
//! owns all of the state; it is injected into the HTTP layer through
//! application state rather than living in a process global, so independent
//! instances (in tests, or in embedded use) never interfere.

mod blocklist;
mod bucket;
mod store;
mod window;

#[cfg(test)]
mod tests;

pub use blocklist::Blocklist;
pub use bucket::TokenBucket;
pub use store::{ClientEntry, ClientStore};
pub use window::{Window, WindowSet, WindowSnapshot};

use crate::config::models::rate_limit::RateLimitConfig;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Outcome of evaluating one request against a client's budgets.
#[derive(Debug, Clone)]
pub enum AdmissionDecision {
    /// Every window had capacity; one token was consumed from each.
    Admitted { windows: Vec<WindowSnapshot> },
    /// The client is still inside a cooldown from an earlier violation.
    /// Its window set was not touched.
    Blocked { unblock_at: DateTime<Utc> },
    /// A window ran dry on this request; the client enters cooldown.
    LimitExceeded { unblock_at: DateTime<Utc> },
}

impl AdmissionDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmissionDecision::Admitted { .. })
    }
}

/// Per-client, multi-window admission control with cooldown blocking.
pub struct AdmissionControl {
    store: ClientStore,
    blocklist: Blocklist,
    cooldown: Duration,
}

impl AdmissionControl {
    /// Build from configuration, with second/minute/hour windows.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_periods(
            config,
            Duration::from_secs(config.block_cooldown_minutes * 60),
            Duration::from_secs(config.idle_eviction_hours * 3600),
        )
    }

    /// Build with explicit cooldown and idle-eviction periods.
    pub fn with_periods(config: &RateLimitConfig, cooldown: Duration, idle_ttl: Duration) -> Self {
        let limits = vec![
            (Window::Second, config.requests_per_second),
            (Window::Minute, config.requests_per_minute),
            (Window::Hour, config.requests_per_hour),
        ];
        Self {
            store: ClientStore::new(limits, idle_ttl),
            blocklist: Blocklist::new(),
            cooldown,
        }
    }

    /// Evaluate one request for `identity`, consuming budget on admission.
    ///
    /// Blocked clients are rejected without touching their window set. A
    /// consume failure writes the blocklist entry as a side effect. The
    /// consume decision itself runs under the per-client lock, so two
    /// same-client racers for one remaining token resolve to exactly one
    /// admission.
    pub fn admit(&self, identity: &str) -> AdmissionDecision {
        if let Some(unblock_at) = self.blocklist.blocked_until(identity) {
            info!(client = identity, %unblock_at, "request rejected: client still blocked");
            return AdmissionDecision::Blocked { unblock_at };
        }

        let entry = self.store.get_or_create(identity);
        let now = Instant::now();
        let mut windows = entry.windows().lock();

        if windows.try_consume(1, now) {
            let snapshots = windows.snapshots(now);
            drop(windows);
            debug!(client = identity, "token consumed");
            AdmissionDecision::Admitted { windows: snapshots }
        } else {
            drop(windows);
            let unblock_at = self.blocklist.block(identity, self.cooldown);
            info!(
                client = identity,
                %unblock_at,
                "request rejected: budget exhausted, cooldown started"
            );
            AdmissionDecision::LimitExceeded { unblock_at }
        }
    }

    /// Fresh telemetry for a client that already has bucket state. Never
    /// creates an entry.
    pub fn snapshots(&self, identity: &str) -> Option<Vec<WindowSnapshot>> {
        let entry = self.store.get(identity)?;
        let now = Instant::now();
        let windows = entry.windows().lock();
        Some(windows.snapshots(now))
    }

    /// Configured cooldown applied on a violation.
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Number of clients currently holding bucket state.
    pub fn tracked_clients(&self) -> usize {
        self.store.len()
    }

    /// Number of clients currently on the blocklist, expired entries
    /// included until their next lookup.
    pub fn blocked_clients(&self) -> usize {
        self.blocklist.len()
    }

    /// Drop idle client entries now. Returns how many were evicted.
    pub fn sweep_idle(&self) -> usize {
        self.store.sweep()
    }

    /// Spawn the background sweeper that evicts idle client entries.
    ///
    /// Sweeping only reclaims memory; consumption stays correct however far
    /// the sweep lags, so the task runs at a relaxed cadence.
    pub fn start_sweeper(self: Arc<Self>, interval: Duration) {
        let control = Arc::clone(&self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // the first tick completes immediately
            loop {
                ticker.tick().await;
                let evicted = control.sweep_idle();
                if evicted > 0 {
                    debug!(evicted, "evicted idle client entries");
                }
            }
        });
    }
}
