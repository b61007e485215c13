//! Security event logging.
//!
//! Append-only structured log on a dedicated `security` target so
//! operators can route it separately from application logs. Denials,
//! validation failures, and suspicious activity log at `warn`; the rest
//! at `info`.

use serde::Serialize;
use uuid::Uuid;

/// Kinds of security events the gate emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEventKind {
    AccessGranted,
    AccessDenied,
    ValidationFailed,
    SuspiciousActivity,
    SecurityError,
}

impl SecurityEventKind {
    /// Whether this kind is logged at elevated severity.
    pub fn is_elevated(&self) -> bool {
        matches!(
            self,
            SecurityEventKind::AccessDenied
                | SecurityEventKind::ValidationFailed
                | SecurityEventKind::SuspiciousActivity
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityEventKind::AccessGranted => "access_granted",
            SecurityEventKind::AccessDenied => "access_denied",
            SecurityEventKind::ValidationFailed => "validation_failed",
            SecurityEventKind::SuspiciousActivity => "suspicious_activity",
            SecurityEventKind::SecurityError => "security_error",
        }
    }
}

/// Emit a structured security event.
pub fn log_security_event(kind: SecurityEventKind, caller: Option<Uuid>, details: &str) {
    let caller = caller.map(|c| c.to_string()).unwrap_or_else(|| "unknown".to_string());
    if kind.is_elevated() {
        tracing::warn!(
            target: "security",
            event = kind.as_str(),
            caller = %caller,
            details,
            "Security event"
        );
    } else {
        tracing::info!(
            target: "security",
            event = kind.as_str(),
            caller = %caller,
            details,
            "Security event"
        );
    }
}
