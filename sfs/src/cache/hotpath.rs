//! Memory-budgeted cache for hot-path file contents.
//!
//! The budget is fixed at construction from the host's free memory (see
//! [`HotPathConfig`]). Insertions that would exceed it are refused; nothing
//! is ever evicted to make room. Capacity only comes back through
//! [`HotPathCache::remove`] or [`HotPathCache::clear`].

use crate::cache::stats::HotPathStats;
use crate::cache::types::HotPathConfig;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, info};

/// Mutable cache state. `None` once the cache has been destroyed.
#[derive(Debug)]
struct Store {
    /// Buffers keyed by prefixed key
    entries: HashMap<String, Bytes>,
    /// Bytes charged against the budget
    allocated: usize,
    stats: HotPathStats,
}

/// Memory-bounded cache for the contents of frequently requested files.
///
/// All operations are synchronous and never touch storage. State is
/// guarded by a mutex so mutating calls are serialised even when the owner
/// is shared across tasks.
#[derive(Debug)]
pub struct HotPathCache {
    budget_bytes: usize,
    prefix: String,
    count_key_bytes: bool,
    store: Mutex<Option<Store>>,
}

impl HotPathCache {
    /// Create a cache, resolving its budget from the configuration.
    pub fn new(config: HotPathConfig) -> Self {
        let budget_bytes = config.budget_bytes();
        info!(
            budget_bytes,
            maximum = config.maximum,
            available = ?config.available,
            count_key_bytes = config.count_key_bytes,
            "Hot-path cache configured"
        );
        Self::with_budget(budget_bytes, config.prefix, config.count_key_bytes)
    }

    /// Create a cache with an explicit byte budget.
    pub fn with_budget(
        budget_bytes: usize,
        prefix: impl Into<String>,
        count_key_bytes: bool,
    ) -> Self {
        Self {
            budget_bytes,
            prefix: prefix.into(),
            count_key_bytes,
            store: Mutex::new(Some(Store {
                entries: HashMap::new(),
                allocated: 0,
                stats: HotPathStats::new(budget_bytes),
            })),
        }
    }

    fn prefixed(&self, key: &str) -> String {
        let mut prefixed = String::with_capacity(self.prefix.len() + key.len());
        prefixed.push_str(&self.prefix);
        prefixed.push_str(key);
        prefixed
    }

    /// Bytes charged for an entry under `prefixed` holding `len` bytes.
    fn charge(&self, prefixed: &str, len: usize) -> usize {
        if self.count_key_bytes {
            len + prefixed.len()
        } else {
            len
        }
    }

    /// Store a buffer under `key`.
    ///
    /// Returns `false` without touching the cache when the entry does not fit
    /// in the remaining budget or the cache has been destroyed. Replacing an
    /// existing key is charged by the size difference.
    pub fn set(&self, key: &str, data: impl Into<Bytes>) -> bool {
        let data = data.into();
        let prefixed = self.prefixed(key);
        let cost = self.charge(&prefixed, data.len());

        let mut guard = self.store.lock();
        let Some(store) = guard.as_mut() else {
            debug!(key, "Rejected set on destroyed hot-path cache");
            return false;
        };

        let replaced = store
            .entries
            .get(&prefixed)
            .map(|old| self.charge(&prefixed, old.len()))
            .unwrap_or(0);
        let allocated = store.allocated - replaced + cost;

        if allocated > self.budget_bytes {
            store.stats.record_rejection();
            debug!(
                key,
                size = data.len(),
                allocated = store.allocated,
                budget = self.budget_bytes,
                "Hot-path cache budget exceeded, refusing entry"
            );
            return false;
        }

        store.entries.insert(prefixed, data);
        store.allocated = allocated;
        store.stats.record_store();
        store.stats.update_size(allocated, store.entries.len());
        true
    }

    /// Get the buffer stored under `key`.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let prefixed = self.prefixed(key);
        let mut guard = self.store.lock();
        let store = guard.as_mut()?;

        match store.entries.get(&prefixed) {
            Some(data) => {
                let data = data.clone();
                store.stats.record_hit();
                Some(data)
            }
            None => {
                store.stats.record_miss();
                None
            }
        }
    }

    /// Check if a key exists in the cache.
    pub fn contains(&self, key: &str) -> bool {
        let prefixed = self.prefixed(key);
        self.store
            .lock()
            .as_ref()
            .is_some_and(|store| store.entries.contains_key(&prefixed))
    }

    /// Remove the entry stored under `key`, releasing its budget.
    ///
    /// Returns `false` if nothing was stored under the key.
    pub fn remove(&self, key: &str) -> bool {
        let prefixed = self.prefixed(key);
        let mut guard = self.store.lock();
        let Some(store) = guard.as_mut() else {
            return false;
        };

        let Some(data) = store.entries.remove(&prefixed) else {
            return false;
        };

        store.allocated -= self.charge(&prefixed, data.len());
        store.stats.record_removal();
        store.stats.update_size(store.allocated, store.entries.len());
        true
    }

    /// Drop every entry and release the whole budget.
    pub fn clear(&self) {
        if let Some(store) = self.store.lock().as_mut() {
            store.entries.clear();
            store.allocated = 0;
            store.stats.update_size(0, 0);
        }
    }

    /// Release all entries and disable the cache.
    ///
    /// Every later `set` is refused, `get` misses and `remove` returns `false`.
    pub fn destroy(&self) {
        if let Some(store) = self.store.lock().take() {
            info!(
                entries = store.entries.len(),
                allocated = store.allocated,
                "Hot-path cache destroyed"
            );
        }
    }

    /// Whether [`destroy`](Self::destroy) has been called.
    pub fn is_destroyed(&self) -> bool {
        self.store.lock().is_none()
    }

    /// Hard byte ceiling. Zero once destroyed.
    pub fn budget_bytes(&self) -> usize {
        if self.is_destroyed() {
            0
        } else {
            self.budget_bytes
        }
    }

    /// Bytes currently charged against the budget.
    pub fn allocated_bytes(&self) -> usize {
        self.store.lock().as_ref().map_or(0, |store| store.allocated)
    }

    /// Bytes still available for new entries.
    pub fn remaining_bytes(&self) -> usize {
        self.budget_bytes().saturating_sub(self.allocated_bytes())
    }

    /// Get the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.store.lock().as_ref().map_or(0, |store| store.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Key prefix applied to every entry.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Get cache statistics. Reports an empty snapshot once destroyed.
    pub fn stats(&self) -> HotPathStats {
        self.store
            .lock()
            .as_ref()
            .map(|store| store.stats.clone())
            .unwrap_or_else(|| HotPathStats::new(0))
    }

    /// Logs current statistics.
    pub fn log_stats(&self) {
        let stats = self.stats();
        info!(
            entries = stats.entry_count,
            allocated = stats.allocated_bytes,
            budget = stats.budget_bytes,
            hits = stats.hits,
            misses = stats.misses,
            rejected = stats.rejected,
            hit_rate = format!("{:.1}%", stats.hit_rate() * 100.0),
            "Hot-path cache statistics"
        );
    }
}
