//! Pool manager: scoped acquisition, query helpers, transactional blocks,
//! and the background health probe.
//!
//! Connections are never held past an operation: every call site goes
//! through `acquire()` (or the `execute`/`query` wrappers built on it) and
//! releases the connection when the guard drops. Multi-statement work uses
//! `with_transaction`, which commits on success and rolls back on error.

use crate::config::PoolConfig;
use crate::monitor::{HealthMonitor, HealthSnapshot, MonitorConfig};
use crate::stats::{PoolStats, PoolStatsSnapshot};
use deadpool_postgres::{Object, Pool, PoolError, Transaction};
use futures_util::future::BoxFuture;
use mnemo_core::error::ConstraintKind;
use mnemo_core::StoreError;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::Row;

// ============================================================================
// ERROR MAPPING
// ============================================================================

/// Map a deadpool checkout error to the store taxonomy.
fn map_pool_error(error: PoolError, waited: Duration) -> StoreError {
    match error {
        PoolError::Timeout(_) => StoreError::PoolExhausted {
            waited_ms: waited.as_millis() as u64,
        },
        PoolError::Backend(e) => map_pg_error(e, waited.as_millis() as u64),
        PoolError::Closed => StoreError::NotInitialized,
        other => StoreError::Operational {
            reason: other.to_string(),
        },
    }
}

/// Map a tokio-postgres error to the store taxonomy using its SQLSTATE.
fn map_pg_error(error: tokio_postgres::Error, elapsed_ms: u64) -> StoreError {
    let reason = error.to_string();
    match error.code() {
        Some(code) if *code == SqlState::UNIQUE_VIOLATION => StoreError::Constraint {
            kind: ConstraintKind::Unique,
            reason,
        },
        Some(code) if *code == SqlState::FOREIGN_KEY_VIOLATION => StoreError::Constraint {
            kind: ConstraintKind::ForeignKey,
            reason,
        },
        Some(code) if *code == SqlState::NOT_NULL_VIOLATION => StoreError::Constraint {
            kind: ConstraintKind::NotNull,
            reason,
        },
        Some(code) if *code == SqlState::CHECK_VIOLATION => StoreError::Constraint {
            kind: ConstraintKind::Check,
            reason,
        },
        Some(code) if *code == SqlState::INTEGRITY_CONSTRAINT_VIOLATION => {
            StoreError::Constraint {
                kind: ConstraintKind::Other,
                reason,
            }
        }
        // Class 08 covers every connection exception.
        Some(code) if code.code().starts_with("08") => StoreError::ConnectionLost { reason },
        Some(code) if *code == SqlState::QUERY_CANCELED => StoreError::Timeout { elapsed_ms },
        _ if error.is_closed() => StoreError::ConnectionLost { reason },
        _ => StoreError::Operational { reason },
    }
}

// ============================================================================
// POOL MANAGER
// ============================================================================

struct MonitorHandle {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Pooled connection manager over PostgreSQL.
pub struct PoolManager {
    config: PoolConfig,
    pool: Pool,
    stats: Arc<PoolStats>,
    health: Arc<HealthMonitor>,
    monitor: Mutex<Option<MonitorHandle>>,
    closed: AtomicBool,
}

impl PoolManager {
    /// Build the pool, verify it with one test round-trip, and start the
    /// background health monitor.
    ///
    /// A failed test round-trip is fatal and propagates: nothing can run
    /// without the backing store.
    pub async fn connect(
        config: PoolConfig,
        monitor_config: MonitorConfig,
    ) -> Result<Self, StoreError> {
        let pool = config.create_pool()?;
        let stats = Arc::new(PoolStats::new());
        let health = Arc::new(HealthMonitor::new(monitor_config.max_failures));

        probe(&pool, &stats).await?;
        health.record_success();

        tracing::info!(
            dsn = %config.dsn(),
            pool_size = config.pool_size,
            max_overflow = config.max_overflow,
            "Connection pool initialized"
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(monitor_task(
            pool.clone(),
            Arc::clone(&stats),
            Arc::clone(&health),
            monitor_config,
            shutdown_rx,
        ));

        Ok(Self {
            config,
            pool,
            stats,
            health,
            monitor: Mutex::new(Some(MonitorHandle {
                shutdown_tx,
                handle,
            })),
            closed: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Check out a connection. Waits are bounded by the configured
    /// timeout; a saturated pool yields `StoreError::PoolExhausted`.
    pub async fn acquire(&self) -> Result<Object, StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::NotInitialized);
        }
        let start = Instant::now();
        match self.pool.get().await {
            Ok(conn) => {
                self.stats.record_checkout();
                Ok(conn)
            }
            Err(e) => {
                self.stats.record_error();
                Err(map_pool_error(e, start.elapsed()))
            }
        }
    }

    /// Execute a statement, recording elapsed time into the pool stats.
    pub async fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, StoreError> {
        let start = Instant::now();
        let conn = self.acquire().await?;
        let result = conn.execute(sql, params).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        self.stats.record_query(elapsed_ms);
        result.map_err(|e| {
            self.stats.record_error();
            map_pg_error(e, elapsed_ms)
        })
    }

    /// Run a query returning all rows.
    pub async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, StoreError> {
        let start = Instant::now();
        let conn = self.acquire().await?;
        let result = conn.query(sql, params).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        self.stats.record_query(elapsed_ms);
        result.map_err(|e| {
            self.stats.record_error();
            map_pg_error(e, elapsed_ms)
        })
    }

    /// Run a query expected to return exactly one row.
    pub async fn query_one(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Row, StoreError> {
        let start = Instant::now();
        let conn = self.acquire().await?;
        let result = conn.query_one(sql, params).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        self.stats.record_query(elapsed_ms);
        result.map_err(|e| {
            self.stats.record_error();
            map_pg_error(e, elapsed_ms)
        })
    }

    /// Run a block inside a transaction: commit on `Ok`, roll back on
    /// `Err`. The connection is returned to the pool either way.
    pub async fn with_transaction<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: for<'a> FnOnce(&'a Transaction<'a>) -> BoxFuture<'a, Result<T, StoreError>>,
    {
        let start = Instant::now();
        let mut conn = self.acquire().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| map_pg_error(e, start.elapsed().as_millis() as u64))?;

        let result = f(&tx).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        self.stats.record_query(elapsed_ms);

        match result {
            Ok(value) => {
                tx.commit().await.map_err(|e| {
                    self.stats.record_error();
                    map_pg_error(e, elapsed_ms)
                })?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "Transaction rollback failed");
                }
                self.stats.record_error();
                Err(err)
            }
        }
    }

    /// One trivial round-trip through the pool.
    pub async fn probe(&self) -> Result<(), StoreError> {
        probe(&self.pool, &self.stats).await
    }

    pub fn is_healthy(&self) -> bool {
        self.health.is_healthy()
    }

    pub fn stats(&self) -> PoolStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Current pool status: sizing gauges from deadpool plus health and
    /// usage statistics.
    pub fn status(&self) -> PoolStatus {
        let status = self.pool.status();
        PoolStatus {
            pool_size: status.max_size,
            size: status.size,
            checked_in: status.available.min(status.size),
            checked_out: status.size.saturating_sub(status.available),
            waiting: status.waiting,
            health: self.health.snapshot(),
            stats: self.stats.snapshot(),
        }
    }

    /// Stop the health monitor and close the pool. Idempotent.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let handle = self.monitor.lock().ok().and_then(|mut m| m.take());
        if let Some(MonitorHandle {
            shutdown_tx,
            handle,
        }) = handle
        {
            let _ = shutdown_tx.send(true);
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Health monitor task did not shut down cleanly");
            }
        }
        self.pool.close();
        tracing::info!(dsn = %self.config.dsn(), "Connection pool closed");
    }
}

/// Pool status surface exposed to the operational layer.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    /// Maximum connections the pool may hold
    pub pool_size: usize,
    /// Connections currently created
    pub size: usize,
    /// Connections idle in the pool
    pub checked_in: usize,
    /// Connections currently leased out
    pub checked_out: usize,
    /// Callers waiting on a checkout
    pub waiting: usize,
    pub health: HealthSnapshot,
    pub stats: PoolStatsSnapshot,
}

// ============================================================================
// HEALTH PROBE
// ============================================================================

/// One `SELECT 1` round-trip through the pool, recorded into the stats.
async fn probe(pool: &Pool, stats: &PoolStats) -> Result<(), StoreError> {
    let start = Instant::now();
    let conn = pool.get().await.map_err(|e| {
        stats.record_error();
        map_pool_error(e, start.elapsed())
    })?;
    stats.record_checkout();

    let result = conn.query_one("SELECT 1", &[]).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;
    stats.record_query(elapsed_ms);

    let row = result.map_err(|e| {
        stats.record_error();
        map_pg_error(e, elapsed_ms)
    })?;
    let value: i32 = row.get(0);
    if value == 1 {
        Ok(())
    } else {
        Err(StoreError::Operational {
            reason: format!("health probe returned unexpected value: {}", value),
        })
    }
}

/// Background probe loop. Tolerates probe failures without exiting; only
/// the shutdown signal ends the loop.
async fn monitor_task(
    pool: Pool,
    stats: Arc<PoolStats>,
    health: Arc<HealthMonitor>,
    config: MonitorConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut tick = interval(config.probe_interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        probe_interval_secs = config.probe_interval.as_secs(),
        max_failures = config.max_failures,
        "Pool health monitor started"
    );

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    tracing::info!("Pool health monitor shutting down");
                    break;
                }
            }

            _ = tick.tick() => {
                match probe(&pool, &stats).await {
                    Ok(()) => health.record_success(),
                    Err(e) => {
                        if health.record_failure() {
                            tracing::error!(error = %e, "Pool marked unhealthy");
                        } else {
                            tracing::warn!(error = %e, "Pool health probe failed");
                        }
                    }
                }
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

    #[test]
    fn test_map_pool_error_closed() {
        let err = map_pool_error(PoolError::Closed, Duration::from_millis(1));
        assert_eq!(err, StoreError::NotInitialized);
    }

    #[tokio::test]
    async fn test_acquire_times_out_against_unreachable_host() {
        // No server listens here; checkout must fail with a typed error,
        // not hang.
        let config = PoolConfig {
            host: "127.0.0.1".to_string(),
            port: 1, // reserved port, nothing listening
            wait_timeout: Duration::from_millis(200),
            connect_timeout: Duration::from_millis(200),
            ..Default::default()
        };
        let pool = config.create_pool().expect("pool construction is local");
        let stats = PoolStats::new();
        let result = probe(&pool, &stats).await;
        assert!(result.is_err());
        assert_eq!(stats.snapshot().errors, 1);
    }

    // Round-trip tests need a live PostgreSQL; run them explicitly with
    // MNEMO_DB_* pointed at a server.
    #[tokio::test]
    #[ignore]
    async fn test_connect_execute_and_close() {
        let manager = PoolManager::connect(PoolConfig::from_env(), MonitorConfig::default())
            .await
            .expect("database reachable");
        let row = manager.query_one("SELECT 41 + 1", &[]).await.unwrap();
        let value: i32 = row.get(0);
        assert_eq!(value, 42);

        let status = manager.status();
        assert!(status.stats.query_count >= 1);
        assert!(status.health.is_healthy);

        manager.close().await;
        manager.close().await; // idempotent
        assert!(manager.acquire().await.is_err());
    }

    #[tokio::test]
    #[ignore]
    async fn test_transaction_rolls_back_on_error() {
        let manager = PoolManager::connect(PoolConfig::from_env(), MonitorConfig::default())
            .await
            .expect("database reachable");

        let result: Result<(), StoreError> = manager
            .with_transaction(|tx| {
                Box::pin(async move {
                    tx.execute("CREATE TEMPORARY TABLE tx_probe (id INT)", &[])
                        .await
                        .map_err(|e| StoreError::Operational {
                            reason: e.to_string(),
                        })?;
                    Err(StoreError::Operational {
                        reason: "forced rollback".to_string(),
                    })
                })
            })
            .await;

        assert!(result.is_err());
        assert!(manager.stats().errors >= 1);
        manager.close().await;
    }
}
