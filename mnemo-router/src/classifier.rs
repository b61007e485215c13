//! Fault classifier.
//!
//! Maps every `MnemoError` onto the closed `category x severity` taxonomy
//! with a user-facing message and retry guidance, keeps a bounded history
//! of error records for diagnosis, and counts faults per
//! `category:severity` pair. Security denials additionally emit a
//! security-log event.

use crate::response::{ErrorDetails, ErrorResponse};
use chrono::Utc;
use mnemo_core::constants::{
    MAX_ERROR_HISTORY, RETRY_DELAY_CONNECTION_SECS, RETRY_DELAY_GENERIC_SECS,
    RETRY_DELAY_OPERATIONAL_SECS, RETRY_DELAY_TIMEOUT_SECS,
};
use mnemo_core::error::ConstraintKind;
use mnemo_core::{
    ErrorCategory, ErrorSeverity, MnemoError, ProviderError, SecurityError, StoreError, Timestamp,
};
use mnemo_gate::{log_security_event, SecurityEventKind};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// One classified fault, kept in the bounded history.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub message: String,
    pub details: String,
    pub timestamp: Timestamp,
}

/// Aggregate error statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorStatistics {
    pub counts: HashMap<String, u64>,
    pub total_errors: u64,
    /// Errors recorded within the last hour.
    pub recent_errors: usize,
    pub categories: Vec<ErrorCategory>,
}

struct ClassifierState {
    history: VecDeque<ErrorRecord>,
    counts: HashMap<String, u64>,
}

/// Stateful classifier shared by every router operation.
pub struct FaultClassifier {
    state: Mutex<ClassifierState>,
    max_history: usize,
}

impl Default for FaultClassifier {
    fn default() -> Self {
        Self::new(MAX_ERROR_HISTORY)
    }
}

struct Classification {
    error_type: &'static str,
    category: ErrorCategory,
    severity: ErrorSeverity,
    message: String,
    retry_recommended: bool,
    retry_delay_seconds: Option<u64>,
}

fn classify_store(error: &StoreError) -> Classification {
    match error {
        StoreError::ConnectionLost { .. } => Classification {
            error_type: "database_connection",
            category: ErrorCategory::Database,
            severity: ErrorSeverity::High,
            message: "Database connection failed. Please try again later.".to_string(),
            retry_recommended: true,
            retry_delay_seconds: Some(RETRY_DELAY_CONNECTION_SECS),
        },
        StoreError::Timeout { .. } => Classification {
            error_type: "database_timeout",
            category: ErrorCategory::Database,
            severity: ErrorSeverity::Medium,
            message: "Database operation timed out. Please try again with a simpler query."
                .to_string(),
            retry_recommended: true,
            retry_delay_seconds: Some(RETRY_DELAY_TIMEOUT_SECS),
        },
        StoreError::Constraint { kind, .. } => {
            let message = match kind {
                ConstraintKind::Unique => "A record with this information already exists.",
                ConstraintKind::ForeignKey => "Referenced record does not exist.",
                ConstraintKind::NotNull => "Required information is missing.",
                ConstraintKind::Check => "Data does not meet validation requirements.",
                ConstraintKind::Other => "Data integrity constraint violated.",
            };
            Classification {
                error_type: "data_integrity",
                category: ErrorCategory::Database,
                severity: ErrorSeverity::Medium,
                message: message.to_string(),
                retry_recommended: false,
                retry_delay_seconds: None,
            }
        }
        StoreError::PoolExhausted { .. } | StoreError::Operational { .. } => Classification {
            error_type: "database_operational",
            category: ErrorCategory::Database,
            severity: ErrorSeverity::High,
            message: "Database operation failed. Please contact support if this persists."
                .to_string(),
            retry_recommended: true,
            retry_delay_seconds: Some(RETRY_DELAY_OPERATIONAL_SECS),
        },
        StoreError::NotInitialized | StoreError::LockPoisoned | StoreError::Unknown { .. } => {
            Classification {
                error_type: "database_general",
                category: ErrorCategory::Database,
                severity: ErrorSeverity::High,
                message: "Database error occurred. Please try again later.".to_string(),
                retry_recommended: true,
                retry_delay_seconds: Some(RETRY_DELAY_GENERIC_SECS),
            }
        }
    }
}

fn classify_provider(error: &ProviderError) -> Classification {
    let error_type = match error {
        ProviderError::Unavailable { .. } => "provider_unavailable",
        ProviderError::CallFailed { .. } => "provider_call_failed",
        ProviderError::Transport { .. } => "network",
    };
    Classification {
        error_type,
        category: ErrorCategory::Network,
        severity: ErrorSeverity::High,
        message: "A downstream service failed. Please try again later.".to_string(),
        retry_recommended: true,
        retry_delay_seconds: Some(RETRY_DELAY_GENERIC_SECS),
    }
}

impl FaultClassifier {
    pub fn new(max_history: usize) -> Self {
        Self {
            state: Mutex::new(ClassifierState {
                history: VecDeque::new(),
                counts: HashMap::new(),
            }),
            max_history: max_history.max(1),
        }
    }

    /// Classify a fault: record it, bump its counter, and produce the
    /// uniform error response returned to callers.
    pub fn classify(&self, error: &MnemoError) -> ErrorResponse {
        let classification = match error {
            MnemoError::Store(e) => classify_store(e),
            MnemoError::Validation(e) => Classification {
                error_type: "validation",
                category: ErrorCategory::Validation,
                severity: ErrorSeverity::Medium,
                message: format!("Validation failed: {}", e),
                retry_recommended: false,
                retry_delay_seconds: None,
            },
            MnemoError::Security(e) => {
                let caller = match e {
                    SecurityError::AccessDenied { caller, .. } => Some(*caller),
                    SecurityError::SuspiciousContent { .. } => None,
                };
                log_security_event(SecurityEventKind::SecurityError, caller, &e.to_string());
                Classification {
                    error_type: "security",
                    category: ErrorCategory::Security,
                    severity: ErrorSeverity::High,
                    message: "Access denied or security violation.".to_string(),
                    retry_recommended: false,
                    retry_delay_seconds: None,
                }
            }
            MnemoError::Provider(e) => classify_provider(e),
            MnemoError::Cache(_) | MnemoError::System { .. } => Classification {
                error_type: "system",
                category: ErrorCategory::System,
                severity: ErrorSeverity::High,
                message: "A system error occurred. Please try again later.".to_string(),
                retry_recommended: true,
                retry_delay_seconds: Some(RETRY_DELAY_GENERIC_SECS),
            },
        };

        let timestamp = Utc::now();
        self.record(ErrorRecord {
            category: classification.category,
            severity: classification.severity,
            message: classification.message.clone(),
            details: error.to_string(),
            timestamp,
        });

        tracing::debug!(
            error_type = classification.error_type,
            category = %classification.category,
            severity = %classification.severity,
            "Classified fault"
        );

        ErrorResponse {
            error_type: classification.error_type.to_string(),
            message: classification.message,
            details: ErrorDetails {
                category: classification.category,
                severity: classification.severity,
                retry_recommended: classification.retry_recommended,
                retry_delay_seconds: classification.retry_delay_seconds,
            },
            timestamp,
        }
    }

    fn record(&self, record: ErrorRecord) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        let key = format!("{}:{}", record.category, record.severity);
        *state.counts.entry(key).or_insert(0) += 1;
        state.history.push_back(record);
        while state.history.len() > self.max_history {
            state.history.pop_front();
        }
    }

    /// Aggregate statistics for monitoring.
    pub fn statistics(&self) -> ErrorStatistics {
        let Ok(state) = self.state.lock() else {
            return ErrorStatistics {
                counts: HashMap::new(),
                total_errors: 0,
                recent_errors: 0,
                categories: Vec::new(),
            };
        };
        let one_hour_ago = Utc::now() - chrono::Duration::hours(1);
        let recent_errors = state
            .history
            .iter()
            .filter(|r| r.timestamp > one_hour_ago)
            .count();
        let mut categories: Vec<ErrorCategory> = state
            .history
            .iter()
            .map(|r| r.category)
            .collect::<std::collections::HashSet<_>>()
            .into_iter()
            .collect();
        categories.sort_by_key(|c| c.to_string());
        ErrorStatistics {
            total_errors: state.counts.values().sum(),
            counts: state.counts.clone(),
            recent_errors,
            categories,
        }
    }

    /// The most recent `limit` error records, newest last.
    pub fn recent(&self, limit: usize) -> Vec<ErrorRecord> {
        let Ok(state) = self.state.lock() else {
            return Vec::new();
        };
        let skip = state.history.len().saturating_sub(limit);
        state.history.iter().skip(skip).cloned().collect()
    }

    /// Clear the history and counters.
    pub fn clear(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.history.clear();
            state.counts.clear();
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
