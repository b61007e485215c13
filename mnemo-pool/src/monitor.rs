//! Pool health tracking.
//!
//! The monitor holds a healthy/unhealthy flag driven by probe outcomes:
//! any successful probe resets the failure counter and marks the pool
//! healthy; the flag flips unhealthy only once `consecutive_failures`
//! reaches the configured threshold. The probe loop itself lives in
//! `manager` next to the pool it probes.

use chrono::{DateTime, Utc};
use mnemo_core::constants::{DEFAULT_HEALTH_PROBE_INTERVAL_SECS, DEFAULT_MAX_PROBE_FAILURES};
use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;

/// Configuration for the background health probe.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// How often to probe the database (default: 5 minutes)
    pub probe_interval: Duration,

    /// Consecutive failures before the pool is marked unhealthy
    /// (default: 3)
    pub max_failures: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_secs(DEFAULT_HEALTH_PROBE_INTERVAL_SECS),
            max_failures: DEFAULT_MAX_PROBE_FAILURES,
        }
    }
}

impl MonitorConfig {
    /// Create a MonitorConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `MNEMO_HEALTH_PROBE_INTERVAL_SECS`: probe interval (default: 300)
    /// - `MNEMO_MAX_PROBE_FAILURES`: unhealthy threshold (default: 3)
    pub fn from_env() -> Self {
        let probe_interval = Duration::from_secs(
            std::env::var("MNEMO_HEALTH_PROBE_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_HEALTH_PROBE_INTERVAL_SECS),
        );
        let max_failures = std::env::var("MNEMO_MAX_PROBE_FAILURES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_PROBE_FAILURES);
        Self {
            probe_interval,
            max_failures,
        }
    }
}

#[derive(Debug)]
struct HealthState {
    is_healthy: bool,
    consecutive_failures: u32,
    last_checked_at: Option<DateTime<Utc>>,
}

/// Tracks pool health across probe outcomes.
#[derive(Debug)]
pub struct HealthMonitor {
    state: Mutex<HealthState>,
    max_failures: u32,
}

impl HealthMonitor {
    pub fn new(max_failures: u32) -> Self {
        Self {
            state: Mutex::new(HealthState {
                is_healthy: true,
                consecutive_failures: 0,
                last_checked_at: None,
            }),
            max_failures: max_failures.max(1),
        }
    }

    /// Record a successful probe: resets the failure counter and marks
    /// the pool healthy.
    pub fn record_success(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.is_healthy = true;
            state.consecutive_failures = 0;
            state.last_checked_at = Some(Utc::now());
        }
    }

    /// Record a failed probe. Returns `true` if this failure crossed the
    /// threshold and flipped the pool unhealthy.
    pub fn record_failure(&self) -> bool {
        let Ok(mut state) = self.state.lock() else {
            return false;
        };
        state.consecutive_failures += 1;
        state.last_checked_at = Some(Utc::now());
        if state.consecutive_failures >= self.max_failures && state.is_healthy {
            state.is_healthy = false;
            return true;
        }
        false
    }

    pub fn is_healthy(&self) -> bool {
        self.state.lock().map(|s| s.is_healthy).unwrap_or(false)
    }

    /// Get the current health state.
    pub fn snapshot(&self) -> HealthSnapshot {
        let Ok(state) = self.state.lock() else {
            return HealthSnapshot {
                is_healthy: false,
                consecutive_failures: 0,
                max_failures: self.max_failures,
                last_checked_at: None,
            };
        };
        HealthSnapshot {
            is_healthy: state.is_healthy,
            consecutive_failures: state.consecutive_failures,
            max_failures: self.max_failures,
            last_checked_at: state.last_checked_at,
        }
    }
}

/// Snapshot of the health state at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub is_healthy: bool,
    pub consecutive_failures: u32,
    pub max_failures: u32,
    pub last_checked_at: Option<DateTime<Utc>>,
}
