//! Error classification taxonomy
//!
//! Closed category and severity enums used by the fault classifier.
//! Keeping the taxonomy closed (rather than matching on arbitrary error
//! types at call sites) guarantees every fault maps to exactly one
//! `category:severity` pair.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error categories for classification and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Database,
    Validation,
    Security,
    Network,
    System,
}

/// Error severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::Database => "database",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Security => "security",
            ErrorCategory::Network => "network",
            ErrorCategory::System => "system",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorSeverity::Low => "low",
            ErrorSeverity::Medium => "medium",
            ErrorSeverity::High => "high",
            ErrorSeverity::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}
