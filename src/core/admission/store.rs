//! Client state store with idle eviction

use super::window::{Window, WindowSet};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One client's bucket state plus its idle stamp.
pub struct ClientEntry {
    windows: Mutex<WindowSet>,
    /// Nanoseconds since the store's anchor instant at last access.
    last_seen: AtomicU64,
}

impl ClientEntry {
    /// The per-client lock serializing consume decisions.
    pub fn windows(&self) -> &Mutex<WindowSet> {
        &self.windows
    }
}

/// Concurrent map from client identity to that client's window set.
///
/// Entries are created lazily on first sight of a client and evicted after
/// a fixed idle duration measured from last access. Eviction is best-effort:
/// it only reclaims memory, and an in-flight consumer holds its own `Arc`
/// clone, so removal from the map never invalidates a live entry. A client
/// that returns after eviction gets a fresh full set, indistinguishable from
/// a refilled long-lived one.
pub struct ClientStore {
    clients: DashMap<String, Arc<ClientEntry>>,
    limits: Vec<(Window, u64)>,
    idle_ttl: Duration,
    anchor: Instant,
}

impl ClientStore {
    pub fn new(limits: Vec<(Window, u64)>, idle_ttl: Duration) -> Self {
        Self {
            clients: DashMap::new(),
            limits,
            idle_ttl,
            anchor: Instant::now(),
        }
    }

    /// Fetch the entry for `identity`, creating it on first access.
    ///
    /// Compute-if-absent through the map's entry API: when two requests race
    /// on a new client, exactly one window set survives. Every call
    /// refreshes the entry's idle stamp.
    pub fn get_or_create(&self, identity: &str) -> Arc<ClientEntry> {
        let stamp = self.stamp();

        // Fast path avoids allocating the key for known clients.
        if let Some(entry) = self.clients.get(identity) {
            entry.last_seen.store(stamp, Ordering::Relaxed);
            return Arc::clone(&entry);
        }

        let entry = self
            .clients
            .entry(identity.to_string())
            .or_insert_with(|| {
                Arc::new(ClientEntry {
                    windows: Mutex::new(WindowSet::new(&self.limits)),
                    last_seen: AtomicU64::new(stamp),
                })
            });
        entry.last_seen.store(stamp, Ordering::Relaxed);
        Arc::clone(&entry)
    }

    /// Lookup without creation, for response-path telemetry.
    pub fn get(&self, identity: &str) -> Option<Arc<ClientEntry>> {
        self.clients.get(identity).map(|entry| {
            entry.last_seen.store(self.stamp(), Ordering::Relaxed);
            Arc::clone(&entry)
        })
    }

    /// Remove entries idle past the eviction threshold. Returns how many
    /// were dropped.
    pub fn sweep(&self) -> usize {
        let cutoff = self.stamp().saturating_sub(self.idle_ttl.as_nanos() as u64);
        let before = self.clients.len();
        self.clients
            .retain(|_, entry| entry.last_seen.load(Ordering::Relaxed) >= cutoff);
        before.saturating_sub(self.clients.len())
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    fn stamp(&self) -> u64 {
        self.anchor.elapsed().as_nanos() as u64
    }
}
