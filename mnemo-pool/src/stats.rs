//! Connection pool usage statistics.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Monotonic usage counters for a pool. Counters are lock-free; only the
/// reset timestamp sits behind a lock.
#[derive(Debug)]
pub struct PoolStats {
    /// Connections checked out since the last reset
    checked_out: AtomicU64,

    /// Errors observed while using a connection
    errors: AtomicU64,

    /// Statements executed through the pool
    query_count: AtomicU64,

    /// Total query wall-clock time in milliseconds
    total_query_time_ms: AtomicU64,

    last_reset: RwLock<DateTime<Utc>>,
}

impl Default for PoolStats {
    fn default() -> Self {
        Self {
            checked_out: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            query_count: AtomicU64::new(0),
            total_query_time_ms: AtomicU64::new(0),
            last_reset: RwLock::new(Utc::now()),
        }
    }
}

impl PoolStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_checkout(&self) {
        self.checked_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_query(&self, elapsed_ms: u64) {
        self.query_count.fetch_add(1, Ordering::Relaxed);
        self.total_query_time_ms
            .fetch_add(elapsed_ms, Ordering::Relaxed);
    }

    /// Reset all counters and stamp the reset time.
    pub fn reset(&self) {
        self.checked_out.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        self.query_count.store(0, Ordering::Relaxed);
        self.total_query_time_ms.store(0, Ordering::Relaxed);
        if let Ok(mut last_reset) = self.last_reset.write() {
            *last_reset = Utc::now();
        }
    }

    /// Get current snapshot of all counters.
    pub fn snapshot(&self) -> PoolStatsSnapshot {
        let query_count = self.query_count.load(Ordering::Relaxed);
        let total_query_time_ms = self.total_query_time_ms.load(Ordering::Relaxed);
        let avg_query_time_ms = if query_count == 0 {
            0.0
        } else {
            total_query_time_ms as f64 / query_count as f64
        };
        PoolStatsSnapshot {
            checked_out: self.checked_out.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            query_count,
            total_query_time_ms,
            avg_query_time_ms,
            last_reset: self
                .last_reset
                .read()
                .map(|ts| *ts)
                .unwrap_or_else(|_| Utc::now()),
        }
    }
}

/// Snapshot of pool statistics at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatsSnapshot {
    pub checked_out: u64,
    pub errors: u64,
    pub query_count: u64,
    pub total_query_time_ms: u64,
    pub avg_query_time_ms: f64,
    pub last_reset: DateTime<Utc>,
}
