//! Constants for the MNEMO memory layer
//!
//! Centralizing default sizes, TTLs, and limits makes them easy to find,
//! modify, and test. Environment variables can override most of these at
//! runtime through the per-crate `Config` types.

// ============================================================================
// CACHE DEFAULTS
// ============================================================================

/// Default max entries for the knowledge cache.
pub const DEFAULT_KNOWLEDGE_CACHE_SIZE: usize = 500;

/// Default TTL for knowledge cache entries in seconds (1 hour).
pub const DEFAULT_KNOWLEDGE_CACHE_TTL_SECS: u64 = 3600;

/// Default max entries for the history cache.
pub const DEFAULT_HISTORY_CACHE_SIZE: usize = 300;

/// Default TTL for history cache entries in seconds (30 minutes).
pub const DEFAULT_HISTORY_CACHE_TTL_SECS: u64 = 1800;

/// Default max entries for the learning cache.
pub const DEFAULT_LEARNING_CACHE_SIZE: usize = 200;

/// Default TTL for learning cache entries in seconds (2 hours).
pub const DEFAULT_LEARNING_CACHE_TTL_SECS: u64 = 7200;

/// Default max entries for the similarity-search cache.
pub const DEFAULT_SIMILARITY_CACHE_SIZE: usize = 100;

/// Default TTL for similarity cache entries in seconds (15 minutes).
pub const DEFAULT_SIMILARITY_CACHE_TTL_SECS: u64 = 900;

/// Max entries for caches created on demand for unknown categories.
pub const DEFAULT_GENERIC_CACHE_SIZE: usize = 100;

/// TTL for caches created on demand for unknown categories (1 hour).
pub const DEFAULT_GENERIC_CACHE_TTL_SECS: u64 = 3600;

/// How often the background sweeper removes expired entries (5 minutes).
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Backoff before retrying after a failed sweep cycle (1 minute).
pub const DEFAULT_SWEEP_RETRY_BACKOFF_SECS: u64 = 60;

// ============================================================================
// VALIDATION LIMITS
// ============================================================================

/// Maximum content length accepted by the gate (100 KB).
pub const MAX_CONTENT_LENGTH: usize = 100_000;

/// Maximum serialized metadata size (10 KB).
pub const MAX_METADATA_SIZE: usize = 10_000;

/// Maximum serialized size of a nested metadata value (1 KB).
pub const MAX_NESTED_METADATA_SIZE: usize = 1_000;

/// Maximum metadata key length.
pub const MAX_METADATA_KEY_LENGTH: usize = 100;

/// Maximum query length (1 KB).
pub const MAX_QUERY_LENGTH: usize = 1_000;

/// Maximum task-type string length.
pub const MAX_TASK_TYPE_LENGTH: usize = 100;

/// Maximum value accepted for the `limit` filter.
pub const MAX_FILTER_LIMIT: i64 = 1_000;

// ============================================================================
// CONNECTION POOL
// ============================================================================

/// Default connection pool size.
pub const DEFAULT_POOL_SIZE: usize = 10;

/// Default overflow connections allowed beyond the pool size.
pub const DEFAULT_POOL_MAX_OVERFLOW: usize = 20;

/// Default connection recycle period in seconds (1 hour).
pub const DEFAULT_POOL_RECYCLE_SECS: u64 = 3600;

/// Default checkout wait timeout in seconds.
pub const DEFAULT_POOL_TIMEOUT_SECS: u64 = 30;

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// How often the pool health monitor probes the database (5 minutes).
pub const DEFAULT_HEALTH_PROBE_INTERVAL_SECS: u64 = 300;

/// Backoff before retrying after a failed probe cycle (1 minute).
pub const DEFAULT_HEALTH_PROBE_RETRY_BACKOFF_SECS: u64 = 60;

/// Consecutive probe failures before the pool is marked unhealthy.
pub const DEFAULT_MAX_PROBE_FAILURES: u32 = 3;

// ============================================================================
// FAULT CLASSIFIER
// ============================================================================

/// Maximum number of error records kept in the classifier history.
pub const MAX_ERROR_HISTORY: usize = 1_000;

/// Retry delay advised after a lost database connection (seconds).
pub const RETRY_DELAY_CONNECTION_SECS: u64 = 5;

/// Retry delay advised after a database timeout (seconds).
pub const RETRY_DELAY_TIMEOUT_SECS: u64 = 2;

/// Retry delay advised after an operational database failure (seconds).
pub const RETRY_DELAY_OPERATIONAL_SECS: u64 = 10;

/// Retry delay advised after an unclassified failure (seconds).
pub const RETRY_DELAY_GENERIC_SECS: u64 = 5;

// ============================================================================
// ROUTER
// ============================================================================

/// TTL for cached retrieve results in seconds (1 hour).
pub const RETRIEVE_CACHE_TTL_SECS: u64 = 3600;

/// TTL for cached similarity-search results in seconds (15 minutes).
pub const SEARCH_CACHE_TTL_SECS: u64 = 900;

/// Default result count for similarity searches.
pub const DEFAULT_SEARCH_TOP_K: usize = 5;

/// Default history page size.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;
