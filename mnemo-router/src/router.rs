//! The routing coordinator.
//!
//! Every operation follows the same pipeline: gate validation ->
//! cache-aside read (where applicable) -> provider call behind the
//! health check -> fault classification on any error. Providers that
//! fail are marked unhealthy and probed for recovery in the background;
//! unhealthy providers short-circuit to a structured fallback reply.

use crate::classifier::{ErrorRecord, ErrorStatistics, FaultClassifier};
use crate::metrics::{PerformanceMetrics, PerformanceSnapshot, RoutingStats, RoutingSnapshot};
use crate::providers::{HistoryProvider, KnowledgeProvider, LearningProvider, ProviderKind};
use crate::response::{
    HealthReport, HistoryLogOutcome, HistoryOutcome, RecommendationsOutcome, RetrieveOutcome,
    RouteReply, SearchOutcome, StoreOutcome,
};
use chrono::Utc;
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use mnemo_cache::{keys, CacheRegistry, RegistryStats, Sweeper, SweeperConfig};
use mnemo_core::constants::{
    DEFAULT_HISTORY_LIMIT, DEFAULT_SEARCH_TOP_K, RETRIEVE_CACHE_TTL_SECS, SEARCH_CACHE_TTL_SECS,
};
use mnemo_core::{AgentId, HealthStatus, MnemoError, SecurityError, ValidationError};
use mnemo_gate::{
    log_security_event, sanitize_content, validate_agent_id, validate_filters, validate_metadata,
    validate_query, validate_task_type, AccessPolicy, ContentKind, SecurityEventKind,
};
use mnemo_pool::{PoolManager, PoolStatus};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Router tuning knobs.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// TTL for cached retrieve results (default: 1 hour)
    pub retrieve_ttl: Duration,

    /// TTL for cached similarity-search results (default: 15 minutes)
    pub search_ttl: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            retrieve_ttl: Duration::from_secs(RETRIEVE_CACHE_TTL_SECS),
            search_ttl: Duration::from_secs(SEARCH_CACHE_TTL_SECS),
        }
    }
}

impl RouterConfig {
    /// Create a RouterConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `MNEMO_RETRIEVE_CACHE_TTL_SECS`: retrieve result TTL (default: 3600)
    /// - `MNEMO_SEARCH_CACHE_TTL_SECS`: search result TTL (default: 900)
    pub fn from_env() -> Self {
        let retrieve_ttl = Duration::from_secs(
            std::env::var("MNEMO_RETRIEVE_CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(RETRIEVE_CACHE_TTL_SECS),
        );
        let search_ttl = Duration::from_secs(
            std::env::var("MNEMO_SEARCH_CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(SEARCH_CACHE_TTL_SECS),
        );
        Self {
            retrieve_ttl,
            search_ttl,
        }
    }
}

/// The identity on whose behalf an operation runs. When absent, the call
/// is trusted (internal) and skips the access matrix.
#[derive(Debug, Clone)]
pub struct Caller {
    pub id: AgentId,
    pub department: String,
}

/// Cache statistics enriched with the router-level hit counters.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsReport {
    pub registry: RegistryStats,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub hit_rate: f64,
}

// ============================================================================
// ROUTER
// ============================================================================

/// Central coordinator for all memory operations.
pub struct Router {
    config: RouterConfig,
    policy: AccessPolicy,
    registry: Arc<CacheRegistry>,
    pool: Option<Arc<PoolManager>>,
    knowledge: Arc<dyn KnowledgeProvider>,
    history: Arc<dyn HistoryProvider>,
    learning: Arc<dyn LearningProvider>,
    provider_health: Arc<DashMap<ProviderKind, bool>>,
    classifier: FaultClassifier,
    routing: RoutingStats,
    performance: PerformanceMetrics,
    sweeper: Mutex<Option<Sweeper>>,
}

impl Router {
    pub fn new(
        config: RouterConfig,
        registry: Arc<CacheRegistry>,
        knowledge: Arc<dyn KnowledgeProvider>,
        history: Arc<dyn HistoryProvider>,
        learning: Arc<dyn LearningProvider>,
    ) -> Self {
        let provider_health = Arc::new(DashMap::new());
        for kind in ProviderKind::ALL {
            provider_health.insert(kind, true);
        }
        Self {
            config,
            policy: AccessPolicy::default(),
            registry,
            pool: None,
            knowledge,
            history,
            learning,
            provider_health,
            classifier: FaultClassifier::default(),
            routing: RoutingStats::new(),
            performance: PerformanceMetrics::new(),
            sweeper: Mutex::new(None),
        }
    }

    /// Attach the connection pool so `health_check` and `pool_status`
    /// cover it and `shutdown` closes it.
    pub fn with_pool(mut self, pool: Arc<PoolManager>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Replace the default access policy.
    pub fn with_policy(mut self, policy: AccessPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Start the background cache expiry sweeper.
    pub fn start_sweeper(&self, config: SweeperConfig) {
        let sweeper = Sweeper::start(Arc::clone(&self.registry), config);
        if let Ok(mut slot) = self.sweeper.lock() {
            *slot = Some(sweeper);
        }
    }

    // ========================================================================
    // PROVIDER HEALTH
    // ========================================================================

    fn is_provider_healthy(&self, kind: ProviderKind) -> bool {
        self.provider_health.get(&kind).map(|v| *v).unwrap_or(true)
    }

    /// Force a provider's health flag. Exposed for operational tooling.
    pub fn set_provider_health(&self, kind: ProviderKind, healthy: bool) {
        self.provider_health.insert(kind, healthy);
        tracing::info!(provider = %kind, healthy, "Provider health forced");
    }

    fn mark_unhealthy(&self, kind: ProviderKind) {
        self.provider_health.insert(kind, false);
        tracing::warn!(provider = %kind, "Provider marked unhealthy; scheduling recovery");
        self.spawn_recovery(kind);
    }

    /// Best-effort recovery probe. Never blocks the caller's response:
    /// the ping runs on a detached task and flips health back on success.
    fn spawn_recovery(&self, kind: ProviderKind) {
        let health = Arc::clone(&self.provider_health);
        let ping: BoxFuture<'static, Result<(), mnemo_core::ProviderError>> = match kind {
            ProviderKind::Knowledge => {
                let provider = Arc::clone(&self.knowledge);
                Box::pin(async move { provider.ping().await })
            }
            ProviderKind::History => {
                let provider = Arc::clone(&self.history);
                Box::pin(async move { provider.ping().await })
            }
            ProviderKind::Learning => {
                let provider = Arc::clone(&self.learning);
                Box::pin(async move { provider.ping().await })
            }
        };
        tokio::spawn(async move {
            match ping.await {
                Ok(()) => {
                    health.insert(kind, true);
                    tracing::info!(provider = %kind, "Provider recovered");
                }
                Err(e) => {
                    tracing::warn!(provider = %kind, error = %e, "Provider recovery attempt failed");
                }
            }
        });
    }

    // ========================================================================
    // PIPELINE HELPERS
    // ========================================================================

    fn observe(&self, start: Instant) {
        self.performance.record(start.elapsed().as_millis() as u64);
    }

    fn fail<T>(&self, error: MnemoError, start: Instant) -> RouteReply<T> {
        self.routing.record_failure();
        let response = self.classifier.classify(&error);
        self.observe(start);
        RouteReply::error(response)
    }

    fn fallback<T>(&self, kind: ProviderKind, start: Instant) -> RouteReply<T> {
        self.routing.record_fallback();
        tracing::info!(provider = %kind, "Short-circuiting to fallback: provider unhealthy");
        // Recovery is retried on every short-circuited invocation, so a
        // provider that comes back is picked up without waiting for an
        // explicit health check.
        self.spawn_recovery(kind);
        self.observe(start);
        RouteReply::unavailable(kind)
    }

    fn check_caller(
        &self,
        caller: Option<&Caller>,
        operation: &str,
        target: Option<AgentId>,
    ) -> Result<(), MnemoError> {
        let Some(caller) = caller else {
            return Ok(());
        };
        let decision = self
            .policy
            .check_access(caller.id, &caller.department, operation, target);
        if decision.allowed {
            return Ok(());
        }
        log_security_event(SecurityEventKind::AccessDenied, Some(caller.id), &decision.reason);
        Err(SecurityError::AccessDenied {
            caller: caller.id,
            operation: operation.to_string(),
            reason: decision.reason,
        }
        .into())
    }

    fn clean_filters(filters: Option<&Value>) -> Result<Map<String, Value>, MnemoError> {
        match filters {
            Some(f) => Ok(validate_filters(f)?),
            None => Ok(Map::new()),
        }
    }

    /// Record a task outcome with the learning provider. Best effort:
    /// failures are logged and never surface to the caller.
    async fn record_learning_outcome(&self, agent: AgentId, task_type: &str, success: bool) {
        if !self.is_provider_healthy(ProviderKind::Learning) {
            return;
        }
        if let Err(e) = self
            .learning
            .record_outcome(agent, task_type, success, &Value::Null)
            .await
        {
            tracing::debug!(error = %e, task_type, "Failed to record learning outcome");
        }
    }

    // ========================================================================
    // STORE
    // ========================================================================

    /// Store content for an agent. On success, every cache entry tagged
    /// with this agent or kind is invalidated (never updated in place).
    pub async fn store(
        &self,
        agent_id: &str,
        kind: &str,
        content: &str,
        metadata: Option<&Value>,
        caller: Option<&Caller>,
    ) -> RouteReply<StoreOutcome> {
        let start = Instant::now();
        self.routing.record_request();

        let agent = match validate_agent_id(agent_id) {
            Ok(agent) => agent,
            Err(e) => return self.fail(e.into(), start),
        };
        if let Err(e) = self.check_caller(caller, "write", Some(agent)) {
            return self.fail(e, start);
        }
        if kind.trim().is_empty() {
            return self.fail(
                ValidationError::RequiredFieldMissing {
                    field: "kind".to_string(),
                }
                .into(),
                start,
            );
        }
        let sanitized_content = match sanitize_content(content, ContentKind::parse(kind)) {
            Ok(clean) => clean,
            Err(e) => return self.fail(e.into(), start),
        };
        if sanitized_content.is_empty() {
            return self.fail(
                ValidationError::RequiredFieldMissing {
                    field: "content".to_string(),
                }
                .into(),
                start,
            );
        }
        let sanitized_metadata = match metadata {
            Some(m) => match validate_metadata(m) {
                Ok(clean) => clean,
                Err(e) => return self.fail(e.into(), start),
            },
            None => Map::new(),
        };

        if !self.is_provider_healthy(ProviderKind::Knowledge) {
            return self.fallback(ProviderKind::Knowledge, start);
        }

        let result = if kind.eq_ignore_ascii_case("structured") {
            self.knowledge
                .store_structured(agent, kind, &sanitized_content, &sanitized_metadata)
                .await
        } else {
            self.knowledge
                .store_unstructured(agent, kind, &sanitized_content, &sanitized_metadata)
                .await
        };

        match result {
            Ok(entry_id) => {
                if let Err(e) = self.registry.invalidate_agent(agent_id) {
                    tracing::warn!(error = %e, "Cache invalidation by agent failed");
                }
                if let Err(e) = self.registry.invalidate_kind(kind) {
                    tracing::warn!(error = %e, "Cache invalidation by kind failed");
                }
                self.record_learning_outcome(agent, &format!("store_{kind}"), true)
                    .await;
                self.routing.record_success();
                self.observe(start);
                RouteReply::success(StoreOutcome {
                    entry_id,
                    message: format!("Stored {} entry for agent {}", kind, agent_id),
                })
            }
            Err(e) => {
                self.mark_unhealthy(ProviderKind::Knowledge);
                self.record_learning_outcome(agent, &format!("store_{kind}"), false)
                    .await;
                self.fail(e.into(), start)
            }
        }
    }

    // ========================================================================
    // RETRIEVE / SEARCH (cache-aside reads)
    // ========================================================================

    /// Retrieve entries for an agent. Cache-aside: a hit returns without
    /// touching the provider; a miss calls the provider (if healthy) and
    /// caches successful results.
    pub async fn retrieve(
        &self,
        agent_id: &str,
        query: &str,
        kind: Option<&str>,
        filters: Option<&Value>,
        caller: Option<&Caller>,
    ) -> RouteReply<RetrieveOutcome> {
        let start = Instant::now();
        self.routing.record_request();

        let agent = match validate_agent_id(agent_id) {
            Ok(agent) => agent,
            Err(e) => return self.fail(e.into(), start),
        };
        if let Err(e) = self.check_caller(caller, "read", Some(agent)) {
            return self.fail(e, start);
        }
        let clean_query = match validate_query(query) {
            Ok(q) => q,
            Err(e) => return self.fail(e.into(), start),
        };
        let clean_filters = match Self::clean_filters(filters) {
            Ok(f) => f,
            Err(e) => return self.fail(e, start),
        };

        let filters_value = Value::Object(clean_filters.clone());
        let key = keys::retrieve_key(agent_id, kind.unwrap_or("any"), &clean_query, &filters_value);

        let cache = match self.registry.store("knowledge") {
            Ok(cache) => cache,
            Err(e) => return self.fail(e.into(), start),
        };

        match cache.get(&key) {
            Ok(Some(cached)) => {
                self.routing.record_cache_hit();
                self.routing.record_success();
                tracing::debug!(agent = %agent_id, "Cache hit for retrieve");
                self.observe(start);
                return RouteReply::success(RetrieveOutcome {
                    results: cached.as_array().cloned().unwrap_or_default(),
                    from_cache: true,
                });
            }
            Ok(None) => self.routing.record_cache_miss(),
            Err(e) => return self.fail(e.into(), start),
        }

        if !self.is_provider_healthy(ProviderKind::Knowledge) {
            return self.fallback(ProviderKind::Knowledge, start);
        }

        match self
            .knowledge
            .retrieve(agent, &clean_query, kind, &clean_filters)
            .await
        {
            Ok(results) => {
                if let Err(e) = cache.put(
                    key,
                    Value::Array(results.clone()),
                    Some(self.config.retrieve_ttl),
                ) {
                    tracing::warn!(error = %e, "Failed to cache retrieve result");
                }
                self.record_learning_outcome(
                    agent,
                    &format!("retrieve_{}", kind.unwrap_or("any")),
                    true,
                )
                .await;
                self.routing.record_success();
                self.observe(start);
                RouteReply::success(RetrieveOutcome {
                    results,
                    from_cache: false,
                })
            }
            Err(e) => {
                self.mark_unhealthy(ProviderKind::Knowledge);
                self.record_learning_outcome(
                    agent,
                    &format!("retrieve_{}", kind.unwrap_or("any")),
                    false,
                )
                .await;
                self.fail(e.into(), start)
            }
        }
    }

    /// Similarity search. Same cache-aside shape as `retrieve`, with a
    /// shorter TTL given result volatility.
    pub async fn search(
        &self,
        query: &str,
        top_k: Option<usize>,
        filters: Option<&Value>,
    ) -> RouteReply<SearchOutcome> {
        let start = Instant::now();
        self.routing.record_request();

        let top_k = top_k.unwrap_or(DEFAULT_SEARCH_TOP_K);
        let clean_query = match validate_query(query) {
            Ok(q) => q,
            Err(e) => return self.fail(e.into(), start),
        };
        let clean_filters = match Self::clean_filters(filters) {
            Ok(f) => f,
            Err(e) => return self.fail(e, start),
        };

        let filters_value = Value::Object(clean_filters.clone());
        let key = keys::similarity_key(&clean_query, top_k, &filters_value);

        let cache = match self.registry.store("similarity") {
            Ok(cache) => cache,
            Err(e) => return self.fail(e.into(), start),
        };

        match cache.get(&key) {
            Ok(Some(cached)) => {
                self.routing.record_cache_hit();
                self.routing.record_success();
                let results = cached.as_array().cloned().unwrap_or_default();
                self.observe(start);
                return RouteReply::success(SearchOutcome {
                    total_results: results.len(),
                    results,
                    from_cache: true,
                });
            }
            Ok(None) => self.routing.record_cache_miss(),
            Err(e) => return self.fail(e.into(), start),
        }

        if !self.is_provider_healthy(ProviderKind::Knowledge) {
            return self.fallback(ProviderKind::Knowledge, start);
        }

        match self
            .knowledge
            .search_similar(&clean_query, top_k, &clean_filters)
            .await
        {
            Ok(results) => {
                if let Err(e) =
                    cache.put(key, Value::Array(results.clone()), Some(self.config.search_ttl))
                {
                    tracing::warn!(error = %e, "Failed to cache search result");
                }
                self.routing.record_success();
                self.observe(start);
                RouteReply::success(SearchOutcome {
                    total_results: results.len(),
                    results,
                    from_cache: false,
                })
            }
            Err(e) => {
                self.mark_unhealthy(ProviderKind::Knowledge);
                self.fail(e.into(), start)
            }
        }
    }

    // ========================================================================
    // HISTORY (write-through, never cached)
    // ========================================================================

    /// Log a conversation thread for an agent.
    pub async fn log_conversation(
        &self,
        agent_id: &str,
        thread: &[Value],
    ) -> RouteReply<HistoryLogOutcome> {
        let start = Instant::now();
        self.routing.record_request();

        let agent = match validate_agent_id(agent_id) {
            Ok(agent) => agent,
            Err(e) => return self.fail(e.into(), start),
        };

        if !self.is_provider_healthy(ProviderKind::History) {
            return self.fallback(ProviderKind::History, start);
        }

        match self.history.log_conversation(agent, thread).await {
            Ok(id) => {
                self.record_learning_outcome(agent, "log_conversation", true).await;
                self.routing.record_success();
                self.observe(start);
                RouteReply::success(HistoryLogOutcome { id })
            }
            Err(e) => {
                self.mark_unhealthy(ProviderKind::History);
                self.fail(e.into(), start)
            }
        }
    }

    /// Log a single action for an agent.
    pub async fn log_action(
        &self,
        agent_id: &str,
        action: &str,
        context: Option<&Value>,
        result: Option<&str>,
    ) -> RouteReply<HistoryLogOutcome> {
        let start = Instant::now();
        self.routing.record_request();

        let agent = match validate_agent_id(agent_id) {
            Ok(agent) => agent,
            Err(e) => return self.fail(e.into(), start),
        };
        let clean_action = match sanitize_content(action, ContentKind::Text) {
            Ok(a) if !a.is_empty() => a,
            Ok(_) => {
                return self.fail(
                    ValidationError::RequiredFieldMissing {
                        field: "action".to_string(),
                    }
                    .into(),
                    start,
                )
            }
            Err(e) => return self.fail(e.into(), start),
        };

        if !self.is_provider_healthy(ProviderKind::History) {
            return self.fallback(ProviderKind::History, start);
        }

        match self
            .history
            .log_action(agent, &clean_action, context, result)
            .await
        {
            Ok(id) => {
                self.record_learning_outcome(agent, &clean_action, true).await;
                self.routing.record_success();
                self.observe(start);
                RouteReply::success(HistoryLogOutcome { id })
            }
            Err(e) => {
                self.mark_unhealthy(ProviderKind::History);
                self.fail(e.into(), start)
            }
        }
    }

    /// Fetch recent history for an agent.
    pub async fn get_agent_history(
        &self,
        agent_id: &str,
        limit: Option<usize>,
        filters: Option<&Value>,
    ) -> RouteReply<HistoryOutcome> {
        let start = Instant::now();
        self.routing.record_request();

        let agent = match validate_agent_id(agent_id) {
            Ok(agent) => agent,
            Err(e) => return self.fail(e.into(), start),
        };
        let clean_filters = match Self::clean_filters(filters) {
            Ok(f) => f,
            Err(e) => return self.fail(e, start),
        };
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);

        if !self.is_provider_healthy(ProviderKind::History) {
            return self.fallback(ProviderKind::History, start);
        }

        match self
            .history
            .get_agent_history(agent, limit, &clean_filters)
            .await
        {
            Ok(results) => {
                self.routing.record_success();
                self.observe(start);
                RouteReply::success(HistoryOutcome { results })
            }
            Err(e) => {
                self.mark_unhealthy(ProviderKind::History);
                self.fail(e.into(), start)
            }
        }
    }

    // ========================================================================
    // LEARNING
    // ========================================================================

    /// Fetch recommendations from the learning provider.
    pub async fn get_recommendations(
        &self,
        agent_id: &str,
        task_type: Option<&str>,
    ) -> RouteReply<RecommendationsOutcome> {
        let start = Instant::now();
        self.routing.record_request();

        let agent = match validate_agent_id(agent_id) {
            Ok(agent) => agent,
            Err(e) => return self.fail(e.into(), start),
        };
        let clean_task = match task_type {
            Some(t) => match validate_task_type(t) {
                Ok(clean) => Some(clean),
                Err(e) => return self.fail(e.into(), start),
            },
            None => None,
        };

        if !self.is_provider_healthy(ProviderKind::Learning) {
            return self.fallback(ProviderKind::Learning, start);
        }

        match self
            .learning
            .get_recommendations(agent, clean_task.as_deref())
            .await
        {
            Ok(recommendations) => {
                self.routing.record_success();
                self.observe(start);
                RouteReply::success(RecommendationsOutcome { recommendations })
            }
            Err(e) => {
                self.mark_unhealthy(ProviderKind::Learning);
                self.fail(e.into(), start)
            }
        }
    }

    // ========================================================================
    // OBSERVABILITY
    // ========================================================================

    /// Probe every provider and aggregate the memory layer's health.
    /// Probes also refresh the routing health flags.
    pub async fn health_check(&self) -> HealthReport {
        let mut providers = HashMap::new();
        for kind in ProviderKind::ALL {
            let ping = match kind {
                ProviderKind::Knowledge => self.knowledge.ping().await,
                ProviderKind::History => self.history.ping().await,
                ProviderKind::Learning => self.learning.ping().await,
            };
            let check = match ping {
                Ok(()) => {
                    self.provider_health.insert(kind, true);
                    mnemo_core::HealthCheck::healthy(kind.as_str())
                }
                Err(e) => {
                    self.provider_health.insert(kind, false);
                    mnemo_core::HealthCheck::unhealthy(kind.as_str(), e.to_string())
                }
            };
            providers.insert(kind.as_str().to_string(), check);
        }

        let pool = self.pool.as_ref().map(|p| p.status());
        let pool_healthy = self.pool.as_ref().map(|p| p.is_healthy()).unwrap_or(true);
        let cache = self.registry.stats_all().unwrap_or_else(|_| RegistryStats {
            caches: HashMap::new(),
            summary: mnemo_cache::RegistrySummary {
                total_entries: 0,
                cache_count: 0,
                average_hit_rate: 0.0,
            },
        });

        let overall_healthy = pool_healthy
            && providers
                .values()
                .all(|check| check.status == HealthStatus::Healthy);

        HealthReport {
            overall_healthy,
            providers,
            pool,
            cache,
            performance: self.performance.snapshot(),
            routing: self.routing.snapshot(),
            timestamp: Utc::now(),
        }
    }

    /// Per-category cache statistics plus router-level hit counters.
    pub fn cache_stats(&self) -> CacheStatsReport {
        let registry = self.registry.stats_all().unwrap_or_else(|_| RegistryStats {
            caches: HashMap::new(),
            summary: mnemo_cache::RegistrySummary {
                total_entries: 0,
                cache_count: 0,
                average_hit_rate: 0.0,
            },
        });
        let routing = self.routing.snapshot();
        CacheStatsReport {
            registry,
            cache_hits: routing.cache_hits,
            cache_misses: routing.cache_misses,
            hit_rate: routing.cache_hit_rate(),
        }
    }

    pub fn pool_status(&self) -> Option<PoolStatus> {
        self.pool.as_ref().map(|p| p.status())
    }

    pub fn routing_stats(&self) -> RoutingSnapshot {
        self.routing.snapshot()
    }

    pub fn performance_metrics(&self) -> PerformanceSnapshot {
        self.performance.snapshot()
    }

    pub fn error_statistics(&self) -> ErrorStatistics {
        self.classifier.statistics()
    }

    pub fn recent_errors(&self, limit: usize) -> Vec<ErrorRecord> {
        self.classifier.recent(limit)
    }

    /// Reset routing, performance, and pool statistics.
    pub fn reset_metrics(&self) {
        self.routing.reset();
        self.performance.reset();
        if let Some(pool) = &self.pool {
            pool.reset_stats();
        }
        tracing::info!("Router metrics reset");
    }

    /// Stop the sweeper and close the pool. Awaited so no background
    /// loop outlives shutdown.
    pub async fn shutdown(&self) {
        let sweeper = self.sweeper.lock().ok().and_then(|mut s| s.take());
        if let Some(sweeper) = sweeper {
            sweeper.stop().await;
        }
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
        tracing::info!("Router shutdown completed");
    }
}

// =============================================================================
// TESTS
// =============================================================================
