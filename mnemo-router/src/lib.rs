//! MNEMO Router - Routing Coordinator
//!
//! The composition root of the memory layer. The router owns the cache
//! registry, the connection pool, the access gate policy, and the fault
//! classifier, and routes every operation to one of three downstream
//! capability providers (knowledge storage, interaction history,
//! learning analytics).
//!
//! Per-provider health follows a simple state machine: a failed call
//! marks the provider unhealthy and schedules a non-blocking recovery
//! probe; while unhealthy, calls short-circuit to a structured
//! "unavailable" fallback without attempting the call. Reads are
//! cache-aside with category TTLs; writes invalidate affected entries
//! rather than updating them in place.

pub mod classifier;
pub mod metrics;
pub mod providers;
pub mod response;
pub mod router;

pub use classifier::{ErrorRecord, ErrorStatistics, FaultClassifier};
pub use metrics::{PerformanceMetrics, PerformanceSnapshot, RoutingStats, RoutingSnapshot};
pub use providers::{HistoryProvider, KnowledgeProvider, LearningProvider, ProviderKind};
pub use response::{
    ErrorDetails, ErrorResponse, HealthReport, HistoryLogOutcome, HistoryOutcome,
    RecommendationsOutcome, RetrieveOutcome, RouteReply, SearchOutcome, StoreOutcome,
};
pub use router::{CacheStatsReport, Caller, Router, RouterConfig};
