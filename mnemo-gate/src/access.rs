//! Department-based access control.
//!
//! Every caller belongs to a department, and every department maps to
//! exactly one access level. Unknown departments fall back to read-only,
//! and unknown operations are denied outright.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Access levels granted to departments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    ReadOnly,
    ReadWrite,
    Admin,
    System,
}

/// Operations a caller can request. Parsed fail-closed: anything that is
/// not one of these four spellings is denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Write,
    Delete,
    Admin,
}

impl Operation {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "read" => Some(Operation::Read),
            "write" => Some(Operation::Write),
            "delete" => Some(Operation::Delete),
            "admin" => Some(Operation::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::Delete => "delete",
            Operation::Admin => "admin",
        }
    }
}

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: String,
}

impl AccessDecision {
    fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
        }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

/// Department to access-level mapping plus policy flags.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    levels: HashMap<String, AccessLevel>,
    default_level: AccessLevel,
    /// Whether Admin-level callers may delete data owned by other agents.
    pub admin_cross_delete: bool,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        let mut levels = HashMap::new();
        levels.insert("executive".to_string(), AccessLevel::Admin);
        levels.insert("memory".to_string(), AccessLevel::System);
        for dept in ["engineering", "finance", "marketing", "hr", "research"] {
            levels.insert(dept.to_string(), AccessLevel::ReadWrite);
        }
        levels.insert("support".to_string(), AccessLevel::ReadOnly);
        Self {
            levels,
            default_level: AccessLevel::ReadOnly,
            // Cross-agent deletes by admins need an explicit opt-in.
            admin_cross_delete: false,
        }
    }
}

impl AccessPolicy {
    /// Look up a department's level; unknown departments get the default.
    pub fn level_for(&self, department: &str) -> AccessLevel {
        self.levels
            .get(&department.to_ascii_lowercase())
            .copied()
            .unwrap_or(self.default_level)
    }

    /// Override the level for one department.
    pub fn set_level(&mut self, department: impl Into<String>, level: AccessLevel) {
        self.levels
            .insert(department.into().to_ascii_lowercase(), level);
    }

    /// Decide whether `caller` (from `department`) may perform `operation`,
    /// optionally against data owned by `target`.
    ///
    /// Rules:
    /// - `System` passes everything.
    /// - `Admin` passes read/write/admin; cross-agent delete requires the
    ///   `admin_cross_delete` policy flag.
    /// - `ReadWrite` may read anything but write only its own data
    ///   (`target` unset or equal to `caller`); delete/admin are denied.
    /// - `ReadOnly` may only read.
    pub fn check_access(
        &self,
        caller: Uuid,
        department: &str,
        operation: &str,
        target: Option<Uuid>,
    ) -> AccessDecision {
        let Some(operation) = Operation::parse(operation) else {
            return AccessDecision::deny(format!("Unknown operation: {}", operation));
        };

        let level = self.level_for(department);

        match level {
            AccessLevel::System => AccessDecision::allow("System-level access granted"),

            AccessLevel::Admin => match operation {
                Operation::Read | Operation::Write | Operation::Admin => {
                    AccessDecision::allow("Admin-level access granted")
                }
                Operation::Delete => {
                    let cross_agent = target.map(|t| t != caller).unwrap_or(false);
                    if cross_agent && !self.admin_cross_delete {
                        AccessDecision::deny(
                            "Admin delete of another agent's data is not permitted",
                        )
                    } else {
                        AccessDecision::allow("Admin delete access granted")
                    }
                }
            },

            AccessLevel::ReadWrite => match operation {
                Operation::Read => AccessDecision::allow("Read access granted"),
                Operation::Write => {
                    let own_data = target.map(|t| t == caller).unwrap_or(true);
                    if own_data {
                        AccessDecision::allow("Write access granted for own data")
                    } else {
                        AccessDecision::deny("Cannot write to other agents' data")
                    }
                }
                Operation::Delete | Operation::Admin => AccessDecision::deny(format!(
                    "Insufficient privileges for {} operation",
                    operation.as_str()
                )),
            },

            AccessLevel::ReadOnly => match operation {
                Operation::Read => AccessDecision::allow("Read-only access granted"),
                other => AccessDecision::deny(format!(
                    "Read-only access level cannot perform {}",
                    other.as_str()
                )),
            },
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
