//! MNEMO Core - Shared Types
//!
//! Identity types, error taxonomy, health primitives, and constants shared
//! by every MNEMO crate. This crate contains no business logic; the cache,
//! pool, gate, and router crates all depend on it.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub mod constants;
pub mod error;
pub mod health;
pub mod taxonomy;

pub use error::{
    CacheError, MnemoError, MnemoResult, ProviderError, SecurityError, StoreError,
    ValidationError,
};
pub use health::{HealthCheck, HealthStatus};
pub use taxonomy::{ErrorCategory, ErrorSeverity};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Agent identifier. Agents are the tenants of the memory layer; every
/// stored entry and every history record is owned by exactly one agent.
pub type AgentId = Uuid;

/// Identifier for a stored knowledge entry.
pub type EntryId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 identifier (timestamp-sortable).
pub fn new_entry_id() -> EntryId {
    Uuid::now_v7()
}

/// Compute the SHA-256 hash of content.
pub fn compute_content_hash(content: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}
