//! End-to-end router tests against mock providers.
//!
//! These exercise the full pipeline: gate validation, cache-aside reads,
//! write-through invalidation, provider health transitions, fallback
//! short-circuiting, and background recovery.

use async_trait::async_trait;
use mnemo_cache::{CacheConfig, CacheRegistry, SweeperConfig};
use mnemo_core::{AgentId, EntryId, ProviderError};
use mnemo_router::{
    Caller, HistoryProvider, KnowledgeProvider, LearningProvider, ProviderKind, RouteReply,
    Router, RouterConfig,
};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

// ============================================================================
// MOCK PROVIDERS
// ============================================================================

#[derive(Default)]
struct MockKnowledge {
    store_calls: AtomicUsize,
    retrieve_calls: AtomicUsize,
    search_calls: AtomicUsize,
    ping_calls: AtomicUsize,
    fail_calls: AtomicBool,
    fail_ping: AtomicBool,
}

impl MockKnowledge {
    fn failing(&self) -> Result<(), ProviderError> {
        if self.fail_calls.load(Ordering::SeqCst) {
            Err(ProviderError::CallFailed {
                provider: "knowledge".to_string(),
                reason: "simulated outage".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KnowledgeProvider for MockKnowledge {
    async fn store_structured(
        &self,
        _agent_id: AgentId,
        _kind: &str,
        _content: &str,
        _metadata: &Map<String, Value>,
    ) -> Result<EntryId, ProviderError> {
        self.store_calls.fetch_add(1, Ordering::SeqCst);
        self.failing()?;
        Ok(Uuid::now_v7())
    }

    async fn store_unstructured(
        &self,
        _agent_id: AgentId,
        _kind: &str,
        _content: &str,
        _metadata: &Map<String, Value>,
    ) -> Result<EntryId, ProviderError> {
        self.store_calls.fetch_add(1, Ordering::SeqCst);
        self.failing()?;
        Ok(Uuid::now_v7())
    }

    async fn retrieve(
        &self,
        _agent_id: AgentId,
        query: &str,
        _kind: Option<&str>,
        _filters: &Map<String, Value>,
    ) -> Result<Vec<Value>, ProviderError> {
        self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
        self.failing()?;
        Ok(vec![json!({"content": format!("result for {query}")})])
    }

    async fn search_similar(
        &self,
        query: &str,
        top_k: usize,
        _filters: &Map<String, Value>,
    ) -> Result<Vec<Value>, ProviderError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.failing()?;
        Ok((0..top_k.min(2))
            .map(|i| json!({"content": format!("match {i} for {query}")}))
            .collect())
    }

    async fn ping(&self) -> Result<(), ProviderError> {
        self.ping_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_ping.load(Ordering::SeqCst) {
            Err(ProviderError::Transport {
                provider: "knowledge".to_string(),
                reason: "simulated outage".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
struct MockHistory {
    log_calls: AtomicUsize,
    fail_calls: AtomicBool,
    fail_ping: AtomicBool,
}

#[async_trait]
impl HistoryProvider for MockHistory {
    async fn log_conversation(
        &self,
        _agent_id: AgentId,
        _thread: &[Value],
    ) -> Result<EntryId, ProviderError> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_calls.load(Ordering::SeqCst) {
            return Err(ProviderError::CallFailed {
                provider: "history".to_string(),
                reason: "simulated outage".to_string(),
            });
        }
        Ok(Uuid::now_v7())
    }

    async fn log_action(
        &self,
        _agent_id: AgentId,
        _action: &str,
        _context: Option<&Value>,
        _result: Option<&str>,
    ) -> Result<EntryId, ProviderError> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_calls.load(Ordering::SeqCst) {
            return Err(ProviderError::CallFailed {
                provider: "history".to_string(),
                reason: "simulated outage".to_string(),
            });
        }
        Ok(Uuid::now_v7())
    }

    async fn get_agent_history(
        &self,
        _agent_id: AgentId,
        limit: usize,
        _filters: &Map<String, Value>,
    ) -> Result<Vec<Value>, ProviderError> {
        Ok((0..limit.min(3)).map(|i| json!({"action": i})).collect())
    }

    async fn ping(&self) -> Result<(), ProviderError> {
        if self.fail_ping.load(Ordering::SeqCst) {
            Err(ProviderError::Transport {
                provider: "history".to_string(),
                reason: "simulated outage".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
struct MockLearning {
    outcomes: AtomicUsize,
}

#[async_trait]
impl LearningProvider for MockLearning {
    async fn record_outcome(
        &self,
        _agent_id: AgentId,
        _task_type: &str,
        _success: bool,
        _details: &Value,
    ) -> Result<(), ProviderError> {
        self.outcomes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_recommendations(
        &self,
        _agent_id: AgentId,
        task_type: Option<&str>,
    ) -> Result<Vec<Value>, ProviderError> {
        Ok(vec![json!({"recommendation": task_type.unwrap_or("general")})])
    }

    async fn ping(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

struct Fixture {
    router: Router,
    knowledge: Arc<MockKnowledge>,
    history: Arc<MockHistory>,
    learning: Arc<MockLearning>,
}

fn fixture() -> Fixture {
    let knowledge = Arc::new(MockKnowledge::default());
    let history = Arc::new(MockHistory::default());
    let learning = Arc::new(MockLearning::default());
    let registry = Arc::new(CacheRegistry::new(CacheConfig::default()));
    let router = Router::new(
        RouterConfig::default(),
        registry,
        Arc::clone(&knowledge) as Arc<dyn KnowledgeProvider>,
        Arc::clone(&history) as Arc<dyn HistoryProvider>,
        Arc::clone(&learning) as Arc<dyn LearningProvider>,
    );
    Fixture {
        router,
        knowledge,
        history,
        learning,
    }
}

fn agent() -> String {
    Uuid::now_v7().to_string()
}

// ============================================================================
// CACHE-ASIDE READS
// ============================================================================

#[tokio::test]
async fn test_retrieve_miss_then_hit() {
    let f = fixture();
    let a = agent();

    let first = f.router.retrieve(&a, "hello", None, None, None).await;
    match &first {
        RouteReply::Success { data } => {
            assert!(!data.from_cache);
            assert_eq!(data.results.len(), 1);
        }
        other => panic!("expected success, got {other:?}"),
    }

    let second = f.router.retrieve(&a, "hello", None, None, None).await;
    match &second {
        RouteReply::Success { data } => assert!(data.from_cache),
        other => panic!("expected success, got {other:?}"),
    }

    // Provider was only consulted once; second call was served by cache.
    assert_eq!(f.knowledge.retrieve_calls.load(Ordering::SeqCst), 1);
    let stats = f.router.routing_stats();
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.cache_misses, 1);
}

#[tokio::test]
async fn test_identical_requests_share_a_cache_entry_regardless_of_filter_order() {
    let f = fixture();
    let a = agent();

    let filters_a = json!({"limit": 5, "success": true});
    let filters_b = json!({"success": true, "limit": 5});

    f.router.retrieve(&a, "q", None, Some(&filters_a), None).await;
    let second = f.router.retrieve(&a, "q", None, Some(&filters_b), None).await;
    match second {
        RouteReply::Success { data } => assert!(data.from_cache),
        other => panic!("expected cached success, got {other:?}"),
    }
    assert_eq!(f.knowledge.retrieve_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cached_hit_bypasses_unhealthy_provider() {
    let f = fixture();
    let a = agent();

    // Warm the cache.
    f.router.retrieve(&a, "hello", None, None, None).await;

    // Force the provider down; keep its ping failing so recovery probes
    // cannot flip it back mid-test.
    f.knowledge.fail_ping.store(true, Ordering::SeqCst);
    f.router.set_provider_health(ProviderKind::Knowledge, false);

    // The cached query still answers.
    let cached = f.router.retrieve(&a, "hello", None, None, None).await;
    assert!(cached.is_success());

    // An uncached query falls back without touching the provider.
    let calls_before = f.knowledge.retrieve_calls.load(Ordering::SeqCst);
    let fallback = f.router.retrieve(&a, "different", None, None, None).await;
    match &fallback {
        RouteReply::AgentUnavailable {
            provider,
            fallback_used,
            ..
        } => {
            assert_eq!(provider, "knowledge");
            assert!(fallback_used);
        }
        other => panic!("expected fallback, got {other:?}"),
    }
    assert_eq!(f.knowledge.retrieve_calls.load(Ordering::SeqCst), calls_before);
    assert_eq!(f.router.routing_stats().fallback_used, 1);
}

#[tokio::test]
async fn test_search_caches_with_top_k_in_key() {
    let f = fixture();

    let first = f.router.search("find widgets", Some(2), None).await;
    match &first {
        RouteReply::Success { data } => {
            assert!(!data.from_cache);
            assert_eq!(data.total_results, 2);
        }
        other => panic!("expected success, got {other:?}"),
    }

    let second = f.router.search("find widgets", Some(2), None).await;
    match &second {
        RouteReply::Success { data } => assert!(data.from_cache),
        other => panic!("expected success, got {other:?}"),
    }

    // Different top_k is a different logical request.
    f.router.search("find widgets", Some(1), None).await;
    assert_eq!(f.knowledge.search_calls.load(Ordering::SeqCst), 2);
}

// ============================================================================
// STORE AND WRITE-THROUGH INVALIDATION
// ============================================================================

#[tokio::test]
async fn test_store_succeeds_and_records_learning_outcome() {
    let f = fixture();
    let reply = f
        .router
        .store(&agent(), "unstructured", "hello", Some(&json!({})), None)
        .await;
    assert!(reply.is_success());
    assert_eq!(f.knowledge.store_calls.load(Ordering::SeqCst), 1);
    assert_eq!(f.learning.outcomes.load(Ordering::SeqCst), 1);
    assert_eq!(f.router.routing_stats().successful_routes, 1);
}

#[tokio::test]
async fn test_store_invalidates_cached_retrieve_for_agent() {
    let f = fixture();
    let a = agent();

    f.router.retrieve(&a, "hello", None, None, None).await;
    assert_eq!(f.knowledge.retrieve_calls.load(Ordering::SeqCst), 1);

    // A successful write removes the cached read.
    let reply = f.router.store(&a, "unstructured", "new fact", None, None).await;
    assert!(reply.is_success());

    let after = f.router.retrieve(&a, "hello", None, None, None).await;
    match after {
        RouteReply::Success { data } => assert!(!data.from_cache),
        other => panic!("expected success, got {other:?}"),
    }
    assert_eq!(f.knowledge.retrieve_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_store_does_not_disturb_other_agents_cache() {
    let f = fixture();
    let a = agent();
    let b = agent();

    f.router.retrieve(&b, "hello", None, None, None).await;
    f.router.store(&a, "unstructured", "new fact", None, None).await;

    let still_cached = f.router.retrieve(&b, "hello", None, None, None).await;
    match still_cached {
        RouteReply::Success { data } => assert!(data.from_cache),
        other => panic!("expected cached success, got {other:?}"),
    }
}

// ============================================================================
// ACCESS CONTROL
// ============================================================================

#[tokio::test]
async fn test_read_only_caller_cannot_store() {
    let f = fixture();
    let caller = Caller {
        id: Uuid::now_v7(),
        department: "support".to_string(),
    };
    let reply = f
        .router
        .store(&agent(), "unstructured", "hello", None, Some(&caller))
        .await;
    match &reply {
        RouteReply::Error { error } => {
            assert_eq!(error.error_type, "security");
            assert!(!error.details.retry_recommended);
        }
        other => panic!("expected error, got {other:?}"),
    }
    assert_eq!(f.knowledge.store_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_read_write_caller_cannot_store_for_other_agent() {
    let f = fixture();
    let caller = Caller {
        id: Uuid::now_v7(),
        department: "engineering".to_string(),
    };
    let other_agent = agent();
    let denied = f
        .router
        .store(&other_agent, "unstructured", "hello", None, Some(&caller))
        .await;
    assert!(denied.is_error());

    let own = f
        .router
        .store(&caller.id.to_string(), "unstructured", "hello", None, Some(&caller))
        .await;
    assert!(own.is_success());
}

#[tokio::test]
async fn test_system_caller_can_store_anywhere() {
    let f = fixture();
    let caller = Caller {
        id: Uuid::now_v7(),
        department: "memory".to_string(),
    };
    let reply = f
        .router
        .store(&agent(), "unstructured", "hello", None, Some(&caller))
        .await;
    assert!(reply.is_success());
}

// ============================================================================
// HEALTH, FALLBACK, RECOVERY
// ============================================================================

#[tokio::test]
async fn test_provider_failure_flips_health_and_short_circuits() {
    let f = fixture();
    f.knowledge.fail_calls.store(true, Ordering::SeqCst);
    f.knowledge.fail_ping.store(true, Ordering::SeqCst);

    let first = f.router.store(&agent(), "unstructured", "x", None, None).await;
    match &first {
        RouteReply::Error { error } => {
            assert_eq!(error.details.category, mnemo_core::ErrorCategory::Network);
        }
        other => panic!("expected error, got {other:?}"),
    }

    // Second call never reaches the provider.
    let calls_before = f.knowledge.store_calls.load(Ordering::SeqCst);
    let second = f.router.store(&agent(), "unstructured", "x", None, None).await;
    assert!(second.is_fallback());
    assert_eq!(f.knowledge.store_calls.load(Ordering::SeqCst), calls_before);
}

#[tokio::test]
async fn test_recovery_probe_restores_health() {
    let f = fixture();
    f.knowledge.fail_calls.store(true, Ordering::SeqCst);
    f.knowledge.fail_ping.store(true, Ordering::SeqCst);

    // Fail once to go unhealthy, and let the scheduled recovery probe
    // run (and fail) before the provider comes back.
    f.router.store(&agent(), "unstructured", "x", None, None).await;
    tokio::time::sleep(Duration::from_millis(30)).await;

    // Provider comes back; the next short-circuited call schedules a
    // recovery probe that succeeds.
    f.knowledge.fail_calls.store(false, Ordering::SeqCst);
    f.knowledge.fail_ping.store(false, Ordering::SeqCst);

    let fallback = f.router.store(&agent(), "unstructured", "x", None, None).await;
    assert!(fallback.is_fallback());

    // Give the detached probe a moment to land.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let recovered = f.router.store(&agent(), "unstructured", "x", None, None).await;
    assert!(recovered.is_success());
}

#[tokio::test]
async fn test_health_check_aggregates_and_refreshes_flags() {
    let f = fixture();

    let report = f.router.health_check().await;
    assert!(report.overall_healthy);
    assert_eq!(report.providers.len(), 3);
    assert!(report.pool.is_none());

    f.knowledge.fail_ping.store(true, Ordering::SeqCst);
    let report = f.router.health_check().await;
    assert!(!report.overall_healthy);
    assert_eq!(
        report.providers["knowledge"].status,
        mnemo_core::HealthStatus::Unhealthy
    );

    // The failed probe also drops the routing flag: calls now fall back.
    let reply = f.router.retrieve(&agent(), "q", None, None, None).await;
    assert!(reply.is_fallback());
}

// ============================================================================
// HISTORY AND LEARNING
// ============================================================================

#[tokio::test]
async fn test_log_action_and_history_round_trip() {
    let f = fixture();
    let a = agent();

    let logged = f
        .router
        .log_action(&a, "generate_report", Some(&json!({"k": 1})), Some("ok"))
        .await;
    assert!(logged.is_success());

    let history = f.router.get_agent_history(&a, Some(3), None).await;
    match history {
        RouteReply::Success { data } => assert_eq!(data.results.len(), 3),
        other => panic!("expected success, got {other:?}"),
    }
}

#[tokio::test]
async fn test_log_conversation() {
    let f = fixture();
    let thread = vec![json!({"role": "user", "text": "hi"}), json!({"role": "assistant", "text": "hello"})];
    let reply = f.router.log_conversation(&agent(), &thread).await;
    assert!(reply.is_success());
    assert_eq!(f.history.log_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_history_provider_failure_falls_back_without_caching() {
    let f = fixture();
    f.history.fail_calls.store(true, Ordering::SeqCst);
    f.history.fail_ping.store(true, Ordering::SeqCst);

    let first = f.router.log_action(&agent(), "act", None, None).await;
    assert!(first.is_error());

    let second = f.router.log_action(&agent(), "act", None, None).await;
    assert!(second.is_fallback());
}

#[tokio::test]
async fn test_get_recommendations() {
    let f = fixture();
    let reply = f.router.get_recommendations(&agent(), Some("Report_Gen")).await;
    match reply {
        RouteReply::Success { data } => {
            assert_eq!(data.recommendations[0]["recommendation"], json!("report_gen"));
        }
        other => panic!("expected success, got {other:?}"),
    }
}

// ============================================================================
// VALIDATION AND ERROR SHAPE
// ============================================================================

#[tokio::test]
async fn test_invalid_agent_id_classified_as_validation() {
    let f = fixture();
    let reply = f.router.retrieve("not-a-uuid", "q", None, None, None).await;
    match &reply {
        RouteReply::Error { error } => {
            assert_eq!(error.error_type, "validation");
            assert_eq!(error.details.category, mnemo_core::ErrorCategory::Validation);
            assert!(!error.details.retry_recommended);
        }
        other => panic!("expected error, got {other:?}"),
    }
    let json = serde_json::to_value(&reply).unwrap();
    assert_eq!(json["status"], "error");
}

#[tokio::test]
async fn test_script_payload_sanitized_before_store() {
    let f = fixture();
    let reply = f
        .router
        .store(&agent(), "unstructured", "hi<script>x</script>", None, None)
        .await;
    assert!(reply.is_success());
}

#[tokio::test]
async fn test_metrics_and_stats_surfaces() {
    let f = fixture();
    let a = agent();
    f.router.retrieve(&a, "q", None, None, None).await;
    f.router.retrieve(&a, "q", None, None, None).await;

    let perf = f.router.performance_metrics();
    assert_eq!(perf.total_operations, 2);

    let cache_stats = f.router.cache_stats();
    assert_eq!(cache_stats.cache_hits, 1);
    assert_eq!(cache_stats.cache_misses, 1);
    assert!((cache_stats.hit_rate - 0.5).abs() < f64::EPSILON);
    assert!(cache_stats.registry.summary.total_entries >= 1);

    f.router.reset_metrics();
    assert_eq!(f.router.routing_stats().total_requests, 0);
    assert_eq!(f.router.performance_metrics().total_operations, 0);
}

#[tokio::test]
async fn test_shutdown_stops_sweeper() {
    let f = fixture();
    f.router.start_sweeper(SweeperConfig {
        interval: Duration::from_millis(20),
        retry_backoff: Duration::from_millis(10),
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    // Must return promptly with the sweeper loop joined.
    f.router.shutdown().await;
}
