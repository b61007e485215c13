//! Pool factory.
//!
//! Shares one `PoolManager` per distinct `(dsn, tuning)` configuration so
//! repeated requests for the same target reuse a single pool instead of
//! creating new pools per caller. The factory is an explicitly constructed
//! object held by the composition root, not a module-level global.

use crate::config::PoolConfig;
use crate::manager::{PoolManager, PoolStatus};
use crate::monitor::MonitorConfig;
use dashmap::DashMap;
use mnemo_core::StoreError;
use std::collections::HashMap;
use std::sync::Arc;

/// Creates and caches pool managers keyed by backing configuration.
#[derive(Default)]
pub struct PoolFactory {
    pools: DashMap<String, Arc<PoolManager>>,
    // Serializes pool creation so two concurrent first requests for the
    // same key build exactly one pool.
    create_lock: tokio::sync::Mutex<()>,
}

impl PoolFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the shared pool for this configuration, connecting it on first
    /// use. Connection failure propagates and nothing is cached.
    pub async fn get_pool(
        &self,
        config: PoolConfig,
        monitor_config: MonitorConfig,
    ) -> Result<Arc<PoolManager>, StoreError> {
        let key = config.cache_key();
        if let Some(pool) = self.pools.get(&key) {
            return Ok(Arc::clone(&pool));
        }

        let _guard = self.create_lock.lock().await;
        // Re-check: another caller may have connected while we waited.
        if let Some(pool) = self.pools.get(&key) {
            return Ok(Arc::clone(&pool));
        }

        let manager = Arc::new(PoolManager::connect(config, monitor_config).await?);
        self.pools.insert(key, Arc::clone(&manager));
        Ok(manager)
    }

    /// Number of distinct pools currently managed.
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Status of every managed pool, keyed by DSN-derived cache key.
    pub fn stats_all(&self) -> HashMap<String, PoolStatus> {
        self.pools
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().status()))
            .collect()
    }

    /// Close every managed pool and forget it.
    pub async fn close_all(&self) {
        let keys: Vec<String> = self.pools.iter().map(|e| e.key().clone()).collect();
        for key in keys {
            if let Some((_, pool)) = self.pools.remove(&key) {
                pool.close().await;
            }
        }
    }
}
