//! Cooldown blocklist

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;
use tracing::debug;

/// Concurrent map from client identity to its unblock instant.
///
/// An entry whose instant has passed is logically absent; it is removed
/// lazily on the next lookup rather than by a sweeper. Wall-clock time is
/// used here because the unblock instant is surfaced to clients in the
/// rejection body.
#[derive(Default)]
pub struct Blocklist {
    entries: DashMap<String, DateTime<Utc>>,
}

impl Blocklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Some(unblock_at)` while the cooldown is active. An expired entry is
    /// deleted on lookup and reported as absent.
    pub fn blocked_until(&self, identity: &str) -> Option<DateTime<Utc>> {
        let unblock_at = *self.entries.get(identity)?;

        if Utc::now() < unblock_at {
            return Some(unblock_at);
        }

        // remove_if keeps a concurrent re-block from being deleted underneath us
        self.entries
            .remove_if(identity, |_, &until| Utc::now() >= until);
        debug!(client = identity, "cooldown elapsed, client unblocked");
        None
    }

    /// Insert or overwrite the entry with `now + cooldown` and return the
    /// resulting unblock instant. Reblocking an already-blocked client
    /// restarts the cooldown from the new violation.
    pub fn block(&self, identity: &str, cooldown: Duration) -> DateTime<Utc> {
        let cooldown = chrono::Duration::milliseconds(
            cooldown.as_millis().min(i64::MAX as u128) as i64,
        );
        let unblock_at = Utc::now() + cooldown;
        self.entries.insert(identity.to_string(), unblock_at);
        unblock_at
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
