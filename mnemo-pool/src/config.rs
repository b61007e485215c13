//! Connection pool configuration.

use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime, Timeouts};
use mnemo_core::constants::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_POOL_MAX_OVERFLOW, DEFAULT_POOL_RECYCLE_SECS,
    DEFAULT_POOL_SIZE, DEFAULT_POOL_TIMEOUT_SECS,
};
use mnemo_core::StoreError;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tokio_postgres::NoTls;

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Base pool size
    pub pool_size: usize,
    /// Extra connections allowed beyond the base size
    pub max_overflow: usize,
    /// Maximum age before a connection is recycled
    pub recycle: Duration,
    /// How long a checkout may wait before failing with pool exhaustion
    pub wait_timeout: Duration,
    /// Timeout for establishing a new connection
    pub connect_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "mnemo".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            pool_size: DEFAULT_POOL_SIZE,
            max_overflow: DEFAULT_POOL_MAX_OVERFLOW,
            recycle: Duration::from_secs(DEFAULT_POOL_RECYCLE_SECS),
            wait_timeout: Duration::from_secs(DEFAULT_POOL_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl PoolConfig {
    /// Create a pool configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `MNEMO_DB_HOST`, `MNEMO_DB_PORT`, `MNEMO_DB_NAME`, `MNEMO_DB_USER`,
    ///   `MNEMO_DB_PASSWORD`
    /// - `MNEMO_DB_POOL_SIZE`, `MNEMO_DB_MAX_OVERFLOW`
    /// - `MNEMO_DB_RECYCLE_SECS`, `MNEMO_DB_TIMEOUT_SECS`,
    ///   `MNEMO_DB_CONNECT_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("MNEMO_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("MNEMO_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("MNEMO_DB_NAME").unwrap_or_else(|_| "mnemo".to_string()),
            user: std::env::var("MNEMO_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("MNEMO_DB_PASSWORD").unwrap_or_default(),
            pool_size: std::env::var("MNEMO_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_POOL_SIZE),
            max_overflow: std::env::var("MNEMO_DB_MAX_OVERFLOW")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_POOL_MAX_OVERFLOW),
            recycle: Duration::from_secs(
                std::env::var("MNEMO_DB_RECYCLE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_POOL_RECYCLE_SECS),
            ),
            wait_timeout: Duration::from_secs(
                std::env::var("MNEMO_DB_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_POOL_TIMEOUT_SECS),
            ),
            connect_timeout: Duration::from_secs(
                std::env::var("MNEMO_DB_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            ),
        }
    }

    /// The DSN this configuration points at (no credentials).
    pub fn dsn(&self) -> String {
        format!(
            "postgres://{}@{}:{}/{}",
            self.user, self.host, self.port, self.dbname
        )
    }

    /// Stable key identifying `(dsn, tuning)` so the factory can share one
    /// pool per distinct backing configuration.
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.dsn().as_bytes());
        hasher.update(
            format!(
                "{}:{}:{}:{}:{}",
                self.pool_size,
                self.max_overflow,
                self.recycle.as_secs(),
                self.wait_timeout.as_secs(),
                self.connect_timeout.as_secs()
            )
            .as_bytes(),
        );
        let mut key = hex::encode(hasher.finalize());
        key.truncate(16);
        format!("{}#{}", self.dsn(), key)
    }

    /// Total connections the pool may hold (base + overflow).
    pub fn max_size(&self) -> usize {
        self.pool_size + self.max_overflow
    }

    /// Create a deadpool pool from this configuration.
    pub fn create_pool(&self) -> Result<Pool, StoreError> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());
        cfg.connect_timeout = Some(self.connect_timeout);
        cfg.application_name = Some("mnemo".to_string());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        cfg.pool = Some(deadpool_postgres::PoolConfig {
            max_size: self.max_size(),
            timeouts: Timeouts {
                wait: Some(self.wait_timeout),
                create: Some(self.connect_timeout),
                recycle: Some(self.recycle),
            },
            ..Default::default()
        });

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StoreError::Operational {
                reason: format!("Failed to create pool: {}", e),
            })
    }
}
