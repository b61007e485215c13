//! Registry of per-category cache stores.
//!
//! Owns one `CacheStore` per data category. The four known categories
//! (`knowledge`, `history`, `learning`, `similarity`) are created eagerly
//! with their tuned defaults; unknown categories are created on demand
//! with generic defaults.

use crate::store::{CacheStore, CacheStoreSnapshot};
use mnemo_core::constants::*;
use mnemo_core::CacheError;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Size and TTL for one cache category.
#[derive(Debug, Clone, Copy)]
pub struct CategoryConfig {
    pub max_size: usize,
    pub ttl: Option<Duration>,
}

impl CategoryConfig {
    pub fn new(max_size: usize, ttl_secs: u64) -> Self {
        Self {
            max_size,
            ttl: Some(Duration::from_secs(ttl_secs)),
        }
    }
}

/// Configuration for the cache registry.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub knowledge: CategoryConfig,
    pub history: CategoryConfig,
    pub learning: CategoryConfig,
    pub similarity: CategoryConfig,
    /// Applied to categories created on demand.
    pub generic: CategoryConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            knowledge: CategoryConfig::new(
                DEFAULT_KNOWLEDGE_CACHE_SIZE,
                DEFAULT_KNOWLEDGE_CACHE_TTL_SECS,
            ),
            history: CategoryConfig::new(
                DEFAULT_HISTORY_CACHE_SIZE,
                DEFAULT_HISTORY_CACHE_TTL_SECS,
            ),
            learning: CategoryConfig::new(
                DEFAULT_LEARNING_CACHE_SIZE,
                DEFAULT_LEARNING_CACHE_TTL_SECS,
            ),
            similarity: CategoryConfig::new(
                DEFAULT_SIMILARITY_CACHE_SIZE,
                DEFAULT_SIMILARITY_CACHE_TTL_SECS,
            ),
            generic: CategoryConfig::new(DEFAULT_GENERIC_CACHE_SIZE, DEFAULT_GENERIC_CACHE_TTL_SECS),
        }
    }
}

impl CacheConfig {
    /// Create a CacheConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `MNEMO_CACHE_<CATEGORY>_SIZE`: max entries (e.g. `MNEMO_CACHE_KNOWLEDGE_SIZE`)
    /// - `MNEMO_CACHE_<CATEGORY>_TTL_SECS`: entry TTL in seconds
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            knowledge: Self::category_from_env("KNOWLEDGE", defaults.knowledge),
            history: Self::category_from_env("HISTORY", defaults.history),
            learning: Self::category_from_env("LEARNING", defaults.learning),
            similarity: Self::category_from_env("SIMILARITY", defaults.similarity),
            generic: Self::category_from_env("GENERIC", defaults.generic),
        }
    }

    fn category_from_env(name: &str, default: CategoryConfig) -> CategoryConfig {
        let max_size = std::env::var(format!("MNEMO_CACHE_{name}_SIZE"))
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default.max_size);
        let ttl = std::env::var(format!("MNEMO_CACHE_{name}_TTL_SECS"))
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .or(default.ttl);
        CategoryConfig { max_size, ttl }
    }

    fn for_category(&self, category: &str) -> CategoryConfig {
        match category {
            "knowledge" => self.knowledge,
            "history" => self.history,
            "learning" => self.learning,
            "similarity" => self.similarity,
            _ => self.generic,
        }
    }
}

/// Aggregate statistics across every store in the registry.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub caches: HashMap<String, CacheStoreSnapshot>,
    pub summary: RegistrySummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrySummary {
    pub total_entries: usize,
    pub cache_count: usize,
    pub average_hit_rate: f64,
}

/// Owns every cache store, keyed by category name.
pub struct CacheRegistry {
    config: CacheConfig,
    stores: RwLock<HashMap<String, Arc<CacheStore>>>,
}

const KNOWN_CATEGORIES: [&str; 4] = ["knowledge", "history", "learning", "similarity"];

impl CacheRegistry {
    pub fn new(config: CacheConfig) -> Self {
        let mut stores = HashMap::new();
        for category in KNOWN_CATEGORIES {
            let cfg = config.for_category(category);
            stores.insert(
                category.to_string(),
                Arc::new(CacheStore::new(category, cfg.max_size, cfg.ttl)),
            );
        }
        Self {
            config,
            stores: RwLock::new(stores),
        }
    }

    fn read_lock(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Arc<CacheStore>>>, CacheError> {
        self.stores.read().map_err(|_| CacheError::LockPoisoned {
            category: "registry".to_string(),
        })
    }

    /// Get the store for a category, creating it on demand for categories
    /// the registry has not seen before.
    pub fn store(&self, category: &str) -> Result<Arc<CacheStore>, CacheError> {
        if let Some(store) = self.read_lock()?.get(category) {
            return Ok(Arc::clone(store));
        }

        let mut stores = self.stores.write().map_err(|_| CacheError::LockPoisoned {
            category: "registry".to_string(),
        })?;
        let store = stores.entry(category.to_string()).or_insert_with(|| {
            let cfg = self.config.for_category(category);
            tracing::debug!(category, max_size = cfg.max_size, "Creating cache store on demand");
            Arc::new(CacheStore::new(category, cfg.max_size, cfg.ttl))
        });
        Ok(Arc::clone(store))
    }

    /// Invalidate every cached entry tagged with the given agent, across
    /// all stores. Returns the total removed.
    pub fn invalidate_agent(&self, agent_id: &str) -> Result<usize, CacheError> {
        self.invalidate_all_stores(&format!("agent:{agent_id}"))
    }

    /// Invalidate every cached entry tagged with the given data kind,
    /// across all stores. Returns the total removed.
    pub fn invalidate_kind(&self, kind: &str) -> Result<usize, CacheError> {
        self.invalidate_all_stores(&format!("type:{kind}"))
    }

    fn invalidate_all_stores(&self, pattern: &str) -> Result<usize, CacheError> {
        let stores: Vec<Arc<CacheStore>> = self.read_lock()?.values().cloned().collect();
        let mut total = 0;
        for store in stores {
            total += store.invalidate_pattern(pattern)?;
        }
        if total > 0 {
            tracing::debug!(pattern, removed = total, "Invalidated cache entries");
        }
        Ok(total)
    }

    /// Clear every store.
    pub fn clear_all(&self) -> Result<usize, CacheError> {
        let stores: Vec<Arc<CacheStore>> = self.read_lock()?.values().cloned().collect();
        let mut total = 0;
        for store in stores {
            total += store.clear()?;
        }
        Ok(total)
    }

    /// Sweep expired entries out of every store. Returns the total removed.
    pub fn sweep_expired(&self) -> Result<usize, CacheError> {
        let stores: Vec<Arc<CacheStore>> = self.read_lock()?.values().cloned().collect();
        let mut total = 0;
        for store in stores {
            total += store.sweep_expired()?;
        }
        Ok(total)
    }

    /// Per-category statistics plus an aggregate summary.
    pub fn stats_all(&self) -> Result<RegistryStats, CacheError> {
        let stores: Vec<Arc<CacheStore>> = self.read_lock()?.values().cloned().collect();
        let mut caches = HashMap::new();
        let mut total_entries = 0;
        let mut hit_rate_sum = 0.0;
        for store in &stores {
            let snapshot = store.stats()?;
            total_entries += snapshot.size;
            hit_rate_sum += snapshot.hit_rate;
            caches.insert(store.category().to_string(), snapshot);
        }
        let cache_count = caches.len();
        let average_hit_rate = if cache_count == 0 {
            0.0
        } else {
            hit_rate_sum / cache_count as f64
        };
        Ok(RegistryStats {
            caches,
            summary: RegistrySummary {
                total_entries,
                cache_count,
                average_hit_rate,
            },
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_known_categories_created_eagerly() {
        let registry = CacheRegistry::new(CacheConfig::default());
        let stats = registry.stats_all().unwrap();
        assert_eq!(stats.summary.cache_count, 4);
        for category in KNOWN_CATEGORIES {
            assert!(stats.caches.contains_key(category));
        }
    }

    #[test]
    fn test_unknown_category_created_lazily_with_generic_defaults() {
        let registry = CacheRegistry::new(CacheConfig::default());
        let store = registry.store("sessions").unwrap();
        assert_eq!(store.category(), "sessions");
        let snapshot = store.stats().unwrap();
        assert_eq!(snapshot.max_size, DEFAULT_GENERIC_CACHE_SIZE);
        // Same instance on the second lookup.
        let again = registry.store("sessions").unwrap();
        assert!(Arc::ptr_eq(&store, &again));
    }

    #[test]
    fn test_invalidate_agent_spans_all_stores() {
        let registry = CacheRegistry::new(CacheConfig::default());
        registry
            .store("knowledge")
            .unwrap()
            .put("knowledge:agent:a1:x", json!(1), None)
            .unwrap();
        registry
            .store("similarity")
            .unwrap()
            .put("similarity:agent:a1:y", json!(2), None)
            .unwrap();
        registry
            .store("knowledge")
            .unwrap()
            .put("knowledge:agent:a2:x", json!(3), None)
            .unwrap();

        let removed = registry.invalidate_agent("a1").unwrap();
        assert_eq!(removed, 2);
        assert_eq!(
            registry
                .store("knowledge")
                .unwrap()
                .get("knowledge:agent:a2:x")
                .unwrap(),
            Some(json!(3))
        );
    }

    #[test]
    fn test_invalidate_kind() {
        let registry = CacheRegistry::new(CacheConfig::default());
        let store = registry.store("knowledge").unwrap();
        store
            .put("knowledge:agent:a1:type:report:h", json!(1), None)
            .unwrap();
        store
            .put("knowledge:agent:a1:type:note:h", json!(2), None)
            .unwrap();

        assert_eq!(registry.invalidate_kind("report").unwrap(), 1);
        assert_eq!(store.get("knowledge:agent:a1:type:note:h").unwrap(), Some(json!(2)));
    }

    #[test]
    fn test_clear_all_and_summary() {
        let registry = CacheRegistry::new(CacheConfig::default());
        registry
            .store("knowledge")
            .unwrap()
            .put("a", json!(1), None)
            .unwrap();
        registry
            .store("history")
            .unwrap()
            .put("b", json!(2), None)
            .unwrap();

        assert_eq!(registry.stats_all().unwrap().summary.total_entries, 2);
        assert_eq!(registry.clear_all().unwrap(), 2);
        assert_eq!(registry.stats_all().unwrap().summary.total_entries, 0);
    }

    #[test]
    fn test_sweep_expired_spans_stores() {
        let registry = CacheRegistry::new(CacheConfig::default());
        registry
            .store("knowledge")
            .unwrap()
            .put("gone", json!(1), Some(Duration::from_millis(5)))
            .unwrap();
        registry
            .store("history")
            .unwrap()
            .put("kept", json!(2), None)
            .unwrap();
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(registry.sweep_expired().unwrap(), 1);
    }
}
