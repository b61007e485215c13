//! Query and task-type validation.

use crate::sanitize::{sanitize_content, ContentKind};
use mnemo_core::constants::{MAX_QUERY_LENGTH, MAX_TASK_TYPE_LENGTH};
use mnemo_core::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;

static INJECTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i);\s*drop\s+table",
        r"(?i);\s*delete\s+from",
        r"(?i);\s*update\s+",
        r"(?i);\s*insert\s+into",
        r"(?i)union\s+select",
        r"--\s*",
        r"(?s)/\*.*?\*/",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern compiles"))
    .collect()
});

static TASK_TYPE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_\-\s]+$").expect("static pattern compiles"));

/// Validate and sanitize a search query: length cap, non-empty, markup
/// strip, and removal of common injection sequences.
pub fn validate_query(query: &str) -> Result<String, ValidationError> {
    if query.len() > MAX_QUERY_LENGTH {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            len: query.len(),
            max: MAX_QUERY_LENGTH,
        });
    }
    if query.trim().is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "query".to_string(),
        });
    }

    let mut sanitized = sanitize_content(query, ContentKind::Text)?;
    for pattern in INJECTION_PATTERNS.iter() {
        sanitized = pattern.replace_all(&sanitized, "").into_owned();
    }

    Ok(sanitized.trim().to_string())
}

/// Validate a task-type label: bounded, non-empty, restricted character
/// set, normalized to lowercase.
pub fn validate_task_type(task_type: &str) -> Result<String, ValidationError> {
    if task_type.len() > MAX_TASK_TYPE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "task_type".to_string(),
            len: task_type.len(),
            max: MAX_TASK_TYPE_LENGTH,
        });
    }
    if task_type.trim().is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "task_type".to_string(),
        });
    }
    if !TASK_TYPE_CHARS.is_match(task_type) {
        return Err(ValidationError::InvalidValue {
            field: "task_type".to_string(),
            reason: "contains invalid characters".to_string(),
        });
    }
    Ok(task_type.trim().to_ascii_lowercase())
}

// =============================================================================
// TESTS
// =============================================================================
