//! Bounded, TTL-aware, LRU-ordered cache store.
//!
//! Uses `IndexMap` for O(1) LRU bookkeeping: entries are ordered by
//! recency (front = least recently used), a hit moves the entry to the
//! back, and capacity overflow evicts from the front.
//!
//! One exclusive lock guards the map and its counters, which makes every
//! operation on a single store linearizable. There is no ordering
//! guarantee across different stores.

use crate::entry::CacheEntry;
use indexmap::IndexMap;
use mnemo_core::CacheError;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Counters tracked by a cache store. All mutation happens under the
/// store's lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStoreStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expired: u64,
    pub invalidations: u64,
}

/// Point-in-time view of a store, including derived hit rate.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStoreSnapshot {
    pub category: String,
    pub size: usize,
    pub max_size: usize,
    pub hit_rate: f64,
    #[serde(flatten)]
    pub stats: CacheStoreStats,
}

struct Inner {
    entries: IndexMap<String, CacheEntry>,
    stats: CacheStoreStats,
}

/// A single bounded LRU cache with optional per-entry TTLs.
pub struct CacheStore {
    category: String,
    max_size: usize,
    default_ttl: Option<Duration>,
    inner: Mutex<Inner>,
}

impl CacheStore {
    pub fn new(category: impl Into<String>, max_size: usize, default_ttl: Option<Duration>) -> Self {
        Self {
            category: category.into(),
            max_size: max_size.max(1),
            default_ttl,
            inner: Mutex::new(Inner {
                entries: IndexMap::new(),
                stats: CacheStoreStats::default(),
            }),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, CacheError> {
        self.inner.lock().map_err(|_| CacheError::LockPoisoned {
            category: self.category.clone(),
        })
    }

    /// Get a value, refreshing its recency.
    ///
    /// An expired entry is removed as a side effect and counted under
    /// both `expired` and `misses`.
    pub fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let mut inner = self.lock()?;

        let Some(index) = inner.entries.get_index_of(key) else {
            inner.stats.misses += 1;
            return Ok(None);
        };

        if inner.entries[index].is_expired() {
            inner.entries.shift_remove_index(index);
            inner.stats.expired += 1;
            inner.stats.misses += 1;
            return Ok(None);
        }

        let last = inner.entries.len() - 1;
        inner.entries.move_index(index, last);
        let entry = &mut inner.entries[last];
        entry.touch();
        let value = entry.value.clone();
        inner.stats.hits += 1;
        Ok(Some(value))
    }

    /// Insert or replace a value.
    ///
    /// `ttl_override` takes precedence over the store default. Replacing
    /// an existing key refreshes its recency and never triggers eviction;
    /// inserting a new key evicts least-recently-used entries until the
    /// store is back within `max_size`.
    pub fn put(
        &self,
        key: impl Into<String>,
        value: Value,
        ttl_override: Option<Duration>,
    ) -> Result<(), CacheError> {
        let key = key.into();
        let ttl = ttl_override.or(self.default_ttl);
        let entry = CacheEntry::new(value, ttl);

        let mut inner = self.lock()?;
        let replaced = inner.entries.insert(key.clone(), entry).is_some();
        if replaced {
            // insert keeps the old position; refresh recency explicitly
            if let Some(index) = inner.entries.get_index_of(&key) {
                let last = inner.entries.len() - 1;
                inner.entries.move_index(index, last);
            }
        } else {
            while inner.entries.len() > self.max_size {
                inner.entries.shift_remove_index(0);
                inner.stats.evictions += 1;
            }
        }
        Ok(())
    }

    /// Remove one entry. Returns whether it was present.
    pub fn invalidate(&self, key: &str) -> Result<bool, CacheError> {
        let mut inner = self.lock()?;
        if inner.entries.shift_remove(key).is_some() {
            inner.stats.invalidations += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Remove every entry whose key contains `pattern`. Returns the count
    /// removed.
    pub fn invalidate_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
        let mut inner = self.lock()?;
        let matching: Vec<String> = inner
            .entries
            .keys()
            .filter(|k| k.contains(pattern))
            .cloned()
            .collect();
        for key in &matching {
            inner.entries.shift_remove(key);
        }
        inner.stats.invalidations += matching.len() as u64;
        Ok(matching.len())
    }

    /// Remove every currently-expired entry regardless of access order.
    /// Used by the background sweeper.
    pub fn sweep_expired(&self) -> Result<usize, CacheError> {
        let mut inner = self.lock()?;
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired());
        let removed = before - inner.entries.len();
        inner.stats.expired += removed as u64;
        Ok(removed)
    }

    /// Remove all entries. Counted under `invalidations`.
    pub fn clear(&self) -> Result<usize, CacheError> {
        let mut inner = self.lock()?;
        let cleared = inner.entries.len();
        inner.entries.clear();
        inner.stats.invalidations += cleared as u64;
        Ok(cleared)
    }

    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(self.lock()?.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.lock()?.entries.is_empty())
    }

    /// Current statistics, with `hit_rate = hits / (hits + misses)` and 0
    /// when there has been no traffic.
    pub fn stats(&self) -> Result<CacheStoreSnapshot, CacheError> {
        let inner = self.lock()?;
        let stats = inner.stats;
        let total = stats.hits + stats.misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            stats.hits as f64 / total as f64
        };
        Ok(CacheStoreSnapshot {
            category: self.category.clone(),
            size: inner.entries.len(),
            max_size: self.max_size,
            hit_rate,
            stats,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
