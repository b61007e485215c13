//! Router response types.
//!
//! Every router operation returns an explicit tagged reply rather than a
//! loosely-shaped map: callers dispatch on the variant, and the serialized
//! form carries a `status` discriminant (`success`, `agent_unavailable`,
//! or `error`).

use mnemo_cache::RegistryStats;
use mnemo_core::{EntryId, ErrorCategory, ErrorSeverity, HealthCheck, Timestamp};
use mnemo_pool::PoolStatus;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::metrics::{PerformanceSnapshot, RoutingSnapshot};

/// Classification details attached to every error response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetails {
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub retry_recommended: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_delay_seconds: Option<u64>,
}

/// Uniform error payload produced by the fault classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    pub details: ErrorDetails,
    pub timestamp: Timestamp,
}

/// Reply envelope for every router operation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RouteReply<T> {
    Success {
        #[serde(flatten)]
        data: T,
    },
    AgentUnavailable {
        provider: String,
        message: String,
        fallback_used: bool,
    },
    Error {
        #[serde(flatten)]
        error: ErrorResponse,
    },
}

impl<T> RouteReply<T> {
    pub fn success(data: T) -> Self {
        RouteReply::Success { data }
    }

    pub fn unavailable(provider: impl std::fmt::Display) -> Self {
        RouteReply::AgentUnavailable {
            provider: provider.to_string(),
            message: format!("{} provider is currently unavailable", provider),
            fallback_used: true,
        }
    }

    pub fn error(error: ErrorResponse) -> Self {
        RouteReply::Error { error }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RouteReply::Success { .. })
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RouteReply::AgentUnavailable { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RouteReply::Error { .. })
    }
}

/// Outcome of a successful store.
#[derive(Debug, Clone, Serialize)]
pub struct StoreOutcome {
    pub entry_id: EntryId,
    pub message: String,
}

/// Outcome of a successful retrieve.
#[derive(Debug, Clone, Serialize)]
pub struct RetrieveOutcome {
    pub results: Vec<Value>,
    pub from_cache: bool,
}

/// Outcome of a successful similarity search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub results: Vec<Value>,
    pub total_results: usize,
    pub from_cache: bool,
}

/// Outcome of a successful history write.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryLogOutcome {
    pub id: EntryId,
}

/// Outcome of a successful history read.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryOutcome {
    pub results: Vec<Value>,
}

/// Outcome of a successful recommendations call.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationsOutcome {
    pub recommendations: Vec<Value>,
}

/// Aggregate health surface exposed to the operational layer.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub overall_healthy: bool,
    pub providers: HashMap<String, HealthCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolStatus>,
    pub cache: RegistryStats,
    pub performance: PerformanceSnapshot,
    pub routing: RoutingSnapshot,
    pub timestamp: Timestamp,
}
