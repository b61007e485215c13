//! MNEMO Pool - Pooled Connection Manager
//!
//! PostgreSQL connection pooling built on deadpool-postgres, with:
//!
//! - scoped acquisition (commit on success, rollback on error, connection
//!   always returned to the pool),
//! - usage statistics (checkout, error, and query-time counters),
//! - a background health monitor that flips a healthy/unhealthy flag after
//!   a threshold of consecutive probe failures,
//! - a factory that shares one pool per distinct backing configuration.
//!
//! Checkout waits are bounded by the configured timeout; a saturated pool
//! yields a typed pool-exhaustion error rather than hanging.

pub mod config;
pub mod factory;
pub mod manager;
pub mod monitor;
pub mod stats;

pub use config::PoolConfig;
pub use factory::PoolFactory;
pub use manager::{PoolManager, PoolStatus};
pub use monitor::{HealthMonitor, HealthSnapshot, MonitorConfig};
pub use stats::{PoolStats, PoolStatsSnapshot};
