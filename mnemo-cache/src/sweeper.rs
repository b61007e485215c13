//! Background cache expiry sweeper.
//!
//! A supervised task that periodically calls `sweep_expired` on every
//! store in the registry. A failed cycle logs the error and retries after
//! a shorter backoff instead of terminating; the loop only exits on the
//! shutdown signal, so the sweeper never silently disappears while the
//! registry is alive.

use crate::registry::CacheRegistry;
use mnemo_core::constants::{DEFAULT_SWEEP_INTERVAL_SECS, DEFAULT_SWEEP_RETRY_BACKOFF_SECS};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the sweeper task.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// How often to sweep expired entries (default: 5 minutes)
    pub interval: Duration,

    /// Backoff before the next attempt after a failed cycle
    /// (default: 1 minute)
    pub retry_backoff: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            retry_backoff: Duration::from_secs(DEFAULT_SWEEP_RETRY_BACKOFF_SECS),
        }
    }
}

impl SweeperConfig {
    /// Create a SweeperConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `MNEMO_SWEEP_INTERVAL_SECS`: sweep interval (default: 300)
    /// - `MNEMO_SWEEP_RETRY_BACKOFF_SECS`: backoff after a failed cycle (default: 60)
    pub fn from_env() -> Self {
        let interval = Duration::from_secs(
            std::env::var("MNEMO_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
        );
        let retry_backoff = Duration::from_secs(
            std::env::var("MNEMO_SWEEP_RETRY_BACKOFF_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SWEEP_RETRY_BACKOFF_SECS),
        );
        Self {
            interval,
            retry_backoff,
        }
    }
}

// ============================================================================
// METRICS
// ============================================================================

/// Counters for sweeper activity.
#[derive(Debug, Default)]
pub struct SweeperMetrics {
    /// Total sweep cycles completed
    pub cycles: AtomicU64,

    /// Total expired entries removed since startup
    pub entries_removed: AtomicU64,

    /// Total failed cycles
    pub errors: AtomicU64,
}

impl SweeperMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current snapshot of all metrics.
    pub fn snapshot(&self) -> SweeperSnapshot {
        SweeperSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            entries_removed: self.entries_removed.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of sweeper metrics at a point in time.
#[derive(Debug, Clone)]
pub struct SweeperSnapshot {
    pub cycles: u64,
    pub entries_removed: u64,
    pub errors: u64,
}

// ============================================================================
// BACKGROUND TASK
// ============================================================================

/// Run the sweep loop until the shutdown signal flips to `true`.
///
/// Returns the metrics collected over the task's lifetime.
pub async fn sweep_task(
    registry: Arc<CacheRegistry>,
    config: SweeperConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Arc<SweeperMetrics> {
    let metrics = Arc::new(SweeperMetrics::new());

    let mut tick = interval(config.interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        interval_secs = config.interval.as_secs(),
        "Cache sweeper started"
    );

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    tracing::info!("Cache sweeper shutting down");
                    break;
                }
            }

            _ = tick.tick() => {
                match registry.sweep_expired() {
                    Ok(removed) => {
                        metrics.cycles.fetch_add(1, Ordering::Relaxed);
                        metrics.entries_removed.fetch_add(removed as u64, Ordering::Relaxed);
                        if removed > 0 {
                            tracing::debug!(removed, "Sweep cycle removed expired entries");
                        }
                    }
                    Err(e) => {
                        metrics.errors.fetch_add(1, Ordering::Relaxed);
                        tracing::error!(error = %e, "Sweep cycle failed; retrying after backoff");
                        tokio::time::sleep(config.retry_backoff).await;
                    }
                }
            }
        }
    }

    let snapshot = metrics.snapshot();
    tracing::info!(
        cycles = snapshot.cycles,
        entries_removed = snapshot.entries_removed,
        errors = snapshot.errors,
        "Cache sweeper stopped"
    );

    metrics
}

/// Handle to a running sweeper with explicit start/stop lifecycle.
pub struct Sweeper {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<Arc<SweeperMetrics>>,
}

impl Sweeper {
    /// Spawn the sweep loop on the current runtime.
    pub fn start(registry: Arc<CacheRegistry>, config: SweeperConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(sweep_task(registry, config, shutdown_rx));
        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Signal shutdown and wait for the loop to finish.
    pub async fn stop(self) -> Arc<SweeperMetrics> {
        let _ = self.shutdown_tx.send(true);
        match self.handle.await {
            Ok(metrics) => metrics,
            Err(e) => {
                tracing::error!(error = %e, "Sweeper task panicked before shutdown");
                Arc::new(SweeperMetrics::new())
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CacheConfig;
    use serde_json::json;

    #[test]
    fn test_config_default() {
        let config = SweeperConfig::default();
        assert_eq!(
            config.interval,
            Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS)
        );
        assert_eq!(
            config.retry_backoff,
            Duration::from_secs(DEFAULT_SWEEP_RETRY_BACKOFF_SECS)
        );
    }

    #[test]
    fn test_metrics_snapshot() {
        let metrics = SweeperMetrics::new();
        metrics.cycles.store(3, Ordering::Relaxed);
        metrics.entries_removed.store(17, Ordering::Relaxed);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cycles, 3);
        assert_eq!(snapshot.entries_removed, 17);
        assert_eq!(snapshot.errors, 0);
    }

    #[tokio::test]
    async fn test_sweeper_removes_expired_and_stops_cleanly() {
        let registry = Arc::new(CacheRegistry::new(CacheConfig::default()));
        registry
            .store("knowledge")
            .unwrap()
            .put("gone", json!(1), Some(Duration::from_millis(5)))
            .unwrap();

        let config = SweeperConfig {
            interval: Duration::from_millis(20),
            retry_backoff: Duration::from_millis(10),
        };
        let sweeper = Sweeper::start(Arc::clone(&registry), config);

        tokio::time::sleep(Duration::from_millis(60)).await;
        let metrics = sweeper.stop().await;

        assert!(metrics.snapshot().cycles >= 1);
        assert_eq!(metrics.snapshot().entries_removed, 1);
        assert!(registry.store("knowledge").unwrap().is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_stop_without_any_ticks() {
        let registry = Arc::new(CacheRegistry::new(CacheConfig::default()));
        let config = SweeperConfig {
            interval: Duration::from_secs(3600),
            retry_backoff: Duration::from_secs(60),
        };
        let sweeper = Sweeper::start(registry, config);
        // First tick of `interval` fires immediately; allow it to land.
        tokio::time::sleep(Duration::from_millis(10)).await;
        let metrics = sweeper.stop().await;
        assert!(metrics.snapshot().cycles <= 1);
    }
}
