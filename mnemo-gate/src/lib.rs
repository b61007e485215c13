//! MNEMO Gate - Validation and Access Control
//!
//! Every identifier, free-text payload, metadata map, query, and filter
//! set passes through this crate before it reaches the cache or the pool.
//! The gate enforces a department-based access matrix, strips dangerous
//! markup, caps payload sizes, and emits structured security events.
//!
//! Sanitization is fail-closed and idempotent: unknown operations are
//! denied, and re-sanitizing already-clean text is a no-op.

pub mod access;
pub mod events;
pub mod filters;
pub mod metadata;
pub mod query;
pub mod sanitize;

pub use access::{AccessDecision, AccessLevel, AccessPolicy, Operation};
pub use events::{log_security_event, SecurityEventKind};
pub use filters::validate_filters;
pub use metadata::validate_metadata;
pub use query::{validate_query, validate_task_type};
pub use sanitize::{sanitize_content, ContentKind};

use mnemo_core::ValidationError;
use uuid::Uuid;

/// Validate an agent identifier string. Agent ids are UUIDs.
pub fn validate_agent_id(agent_id: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(agent_id).map_err(|_| ValidationError::InvalidIdentifier {
        field: "agent_id".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_agent_id_accepts_uuid() {
        let id = Uuid::now_v7();
        assert_eq!(validate_agent_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_validate_agent_id_rejects_garbage() {
        assert!(validate_agent_id("not-a-uuid").is_err());
        assert!(validate_agent_id("").is_err());
        assert!(validate_agent_id("12345").is_err());
    }
}
