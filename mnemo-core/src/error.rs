//! Error types for MNEMO operations

use thiserror::Error;
use uuid::Uuid;

/// Backing-store and connection-pool errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Connection to the backing store lost: {reason}")]
    ConnectionLost { reason: String },

    #[error("Store operation timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("Constraint violation ({kind:?}): {reason}")]
    Constraint { kind: ConstraintKind, reason: String },

    #[error("Connection pool exhausted (waited {waited_ms}ms)")]
    PoolExhausted { waited_ms: u64 },

    #[error("Pool is not initialized")]
    NotInitialized,

    #[error("Operational store failure: {reason}")]
    Operational { reason: String },

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Store failure: {reason}")]
    Unknown { reason: String },
}

/// Sub-kinds of constraint violations, used to pick the user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    NotNull,
    Check,
    Other,
}

/// Validation errors raised by the access gate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("{field} exceeds maximum length of {max} characters (got {len})")]
    TooLong { field: String, len: usize, max: usize },

    #[error("Invalid JSON content: {reason}")]
    InvalidJson { reason: String },

    #[error("Invalid identifier format for {field}")]
    InvalidIdentifier { field: String },

    #[error("Invalid timestamp for {field}: {value}")]
    InvalidTimestamp { field: String, value: String },
}

/// Security errors raised by the access gate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SecurityError {
    #[error("Access denied for {caller}: {operation} - {reason}")]
    AccessDenied {
        caller: Uuid,
        operation: String,
        reason: String,
    },

    #[error("Suspicious content rejected: {reason}")]
    SuspiciousContent { reason: String },
}

/// Errors from downstream capability providers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider {provider} is unavailable")]
    Unavailable { provider: String },

    #[error("Call to provider {provider} failed: {reason}")]
    CallFailed { provider: String, reason: String },

    #[error("Transport failure reaching {provider}: {reason}")]
    Transport { provider: String, reason: String },
}

/// Cache-layer errors. The in-memory cache can only fail through lock
/// poisoning, which callers treat as a system fault.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache lock poisoned for store {category}")]
    LockPoisoned { category: String },
}

/// Master error type for all MNEMO errors.
#[derive(Debug, Clone, Error)]
pub enum MnemoError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Security error: {0}")]
    Security(#[from] SecurityError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("System error: {reason}")]
    System { reason: String },
}

/// Result type alias for MNEMO operations.
pub type MnemoResult<T> = Result<T, MnemoError>;

// =============================================================================
// TESTS
// =============================================================================
