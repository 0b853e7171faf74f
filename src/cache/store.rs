//! Lock-guarded entry table.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::TimeDelta;
use parking_lot::RwLock;
use tracing::debug;

/// A stored value and the moment it was inserted.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    created_at: Instant,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self, lifetime: Option<Duration>, now: Instant) -> bool {
        lifetime.is_some_and(|lifetime| now.duration_since(self.created_at) > lifetime)
    }
}

/// Key to entry mapping shared by callers and the sweeper.
///
/// Reads take the shared lock, every mutation the exclusive one. No lock is
/// held while a wrapped function runs.
pub(crate) struct EntryStore<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    lifetime: Option<Duration>,
}

impl<T: Clone> EntryStore<T> {
    /// `lifetime` of `None` disables expiry.
    pub fn new(lifetime: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            lifetime,
        }
    }

    /// Return the value at `key` if present and not expired.
    ///
    /// An expired entry is removed on the way out.
    pub fn lookup_fresh(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        let created_at = {
            let entries = self.entries.read();
            let entry = entries.get(key)?;
            if !entry.is_expired(self.lifetime, now) {
                return Some(entry.value.clone());
            }
            entry.created_at
        };

        debug!("Cache entry expired, evicting");
        self.evict_stale(key, created_at);
        None
    }

    /// Remove the entry at `key` only if it is still the one created at
    /// `seen`. A concurrent insert may have replaced it since.
    fn evict_stale(&self, key: &str, seen: Instant) -> bool {
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|e| e.created_at == seen) {
            entries.remove(key);
            true
        } else {
            false
        }
    }

    /// Replace whatever is stored at `key` with a fresh entry.
    pub fn insert(&self, key: String, value: T) {
        self.entries.write().insert(
            key,
            CacheEntry {
                value,
                created_at: Instant::now(),
            },
        );
    }

    /// Remove the entry at `key`. Returns `true` if one existed.
    pub fn remove(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Drop every expired entry and return how many were removed.
    pub fn sweep_expired(&self) -> usize {
        if self.lifetime.is_none() {
            return 0;
        }

        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(self.lifetime, now));
        before - entries.len()
    }

    /// Time left before the entry at `key` expires.
    ///
    /// Zero when absent, negative once expired, [`TimeDelta::MAX`] when
    /// entries never expire.
    pub fn remaining(&self, key: &str) -> TimeDelta {
        let entries = self.entries.read();
        let Some(entry) = entries.get(key) else {
            return TimeDelta::zero();
        };
        let Some(lifetime) = self.lifetime else {
            return TimeDelta::MAX;
        };

        let lifetime = TimeDelta::from_std(lifetime).unwrap_or(TimeDelta::MAX);
        let age = TimeDelta::from_std(entry.created_at.elapsed()).unwrap_or(TimeDelta::MAX);
        lifetime - age
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }
}
