//! MNEMO Cache - Multi-Cache Eviction Manager
//!
//! Bounded, TTL-aware, LRU-ordered caches with hit/miss/eviction statistics,
//! a registry that owns one cache per data category, a deterministic
//! facet-encoded key builder, and a supervised background sweeper that
//! removes expired entries.
//!
//! # Key Construction
//!
//! Cache keys are not opaque hashes: they embed `agent:{id}` and
//! `type:{kind}` facets so that a write can invalidate every affected entry
//! with a substring scan, without maintaining a secondary index. The
//! free-form parts of a request (query text, filter sets) are folded into
//! the key through a canonical content hash, so logically identical
//! requests map to the same key regardless of incidental ordering.

pub mod entry;
pub mod keys;
pub mod registry;
pub mod store;
pub mod sweeper;

pub use entry::CacheEntry;
pub use keys::{
    hash_content, hash_text, history_key, knowledge_key, learning_key, retrieve_key,
    similarity_key,
};
pub use registry::{CacheConfig, CacheRegistry, CategoryConfig, RegistryStats, RegistrySummary};
pub use store::{CacheStore, CacheStoreSnapshot, CacheStoreStats};
pub use sweeper::{sweep_task, Sweeper, SweeperConfig, SweeperMetrics, SweeperSnapshot};
