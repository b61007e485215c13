//! Routing and performance metrics.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Request routing counters.
#[derive(Debug, Default)]
pub struct RoutingStats {
    pub total_requests: AtomicU64,
    pub successful_routes: AtomicU64,
    pub failed_routes: AtomicU64,
    pub fallback_used: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
}

impl RoutingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.successful_routes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed_routes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallback_used.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.total_requests.store(0, Ordering::Relaxed);
        self.successful_routes.store(0, Ordering::Relaxed);
        self.failed_routes.store(0, Ordering::Relaxed);
        self.fallback_used.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
    }

    /// Get current snapshot of all counters.
    pub fn snapshot(&self) -> RoutingSnapshot {
        RoutingSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_routes: self.successful_routes.load(Ordering::Relaxed),
            failed_routes: self.failed_routes.load(Ordering::Relaxed),
            fallback_used: self.fallback_used.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of routing counters at a point in time.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RoutingSnapshot {
    pub total_requests: u64,
    pub successful_routes: u64,
    pub failed_routes: u64,
    pub fallback_used: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl RoutingSnapshot {
    /// Router-level cache hit rate; 0 when no cached reads happened.
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

/// Running response-time average over every router operation.
#[derive(Debug, Default)]
pub struct PerformanceMetrics {
    total_operations: AtomicU64,
    total_response_time_ms: AtomicU64,
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, elapsed_ms: u64) {
        self.total_operations.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_ms
            .fetch_add(elapsed_ms, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.total_operations.store(0, Ordering::Relaxed);
        self.total_response_time_ms.store(0, Ordering::Relaxed);
    }

    /// Get current snapshot with the derived average.
    pub fn snapshot(&self) -> PerformanceSnapshot {
        let total_operations = self.total_operations.load(Ordering::Relaxed);
        let total_response_time_ms = self.total_response_time_ms.load(Ordering::Relaxed);
        let avg_response_time_ms = if total_operations == 0 {
            0.0
        } else {
            total_response_time_ms as f64 / total_operations as f64
        };
        PerformanceSnapshot {
            total_operations,
            total_response_time_ms,
            avg_response_time_ms,
        }
    }
}

/// Snapshot of performance metrics at a point in time.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PerformanceSnapshot {
    pub total_operations: u64,
    pub total_response_time_ms: u64,
    pub avg_response_time_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_counters_and_reset() {
        let stats = RoutingStats::new();
        stats.record_request();
        stats.record_request();
        stats.record_success();
        stats.record_fallback();
        stats.record_cache_hit();
        stats.record_cache_miss();

        let snap = stats.snapshot();
        assert_eq!(snap.total_requests, 2);
        assert_eq!(snap.successful_routes, 1);
        assert_eq!(snap.fallback_used, 1);
        assert!((snap.cache_hit_rate() - 0.5).abs() < f64::EPSILON);

        stats.reset();
        assert_eq!(stats.snapshot().total_requests, 0);
    }

    #[test]
    fn test_performance_running_average() {
        let perf = PerformanceMetrics::new();
        assert_eq!(perf.snapshot().avg_response_time_ms, 0.0);

        perf.record(10);
        perf.record(20);
        let snap = perf.snapshot();
        assert_eq!(snap.total_operations, 2);
        assert!((snap.avg_response_time_ms - 15.0).abs() < f64::EPSILON);
    }
}
