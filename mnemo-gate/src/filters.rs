//! Filter-set validation.
//!
//! Retrieval and history queries carry an optional filter map. Only
//! recognized keys are kept, each with its own type and format check;
//! unknown keys are dropped with a warning rather than failing the whole
//! request.

use crate::metadata::validate_metadata;
use crate::sanitize::{sanitize_content, ContentKind};
use crate::validate_agent_id;
use mnemo_core::constants::MAX_FILTER_LIMIT;
use mnemo_core::ValidationError;
use serde_json::{Map, Value};

fn parse_datetime(field: &str, value: &Value) -> Result<String, ValidationError> {
    let Some(s) = value.as_str() else {
        return Err(ValidationError::InvalidTimestamp {
            field: field.to_string(),
            value: value.to_string(),
        });
    };
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|_| s.to_string())
        .map_err(|_| ValidationError::InvalidTimestamp {
            field: field.to_string(),
            value: s.to_string(),
        })
}

fn parse_non_negative_int(field: &str, value: &Value) -> Result<i64, ValidationError> {
    let n = value
        .as_i64()
        .ok_or_else(|| ValidationError::InvalidValue {
            field: field.to_string(),
            reason: "must be a non-negative integer".to_string(),
        })?;
    if n < 0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            reason: "must be a non-negative integer".to_string(),
        });
    }
    Ok(n)
}

/// Validate and sanitize a filter map. Returns the cleaned map with
/// unknown keys removed.
pub fn validate_filters(filters: &Value) -> Result<Map<String, Value>, ValidationError> {
    let Some(map) = filters.as_object() else {
        return Err(ValidationError::InvalidValue {
            field: "filters".to_string(),
            reason: "must be an object".to_string(),
        });
    };

    let mut sanitized = Map::new();

    for (key, value) in map {
        match key.as_str() {
            "agent_id" => {
                let s = value.as_str().unwrap_or_default();
                let id = validate_agent_id(s)?;
                sanitized.insert(key.clone(), Value::String(id.to_string()));
            }

            "created_after" | "created_before" => {
                let ts = parse_datetime(key, value)?;
                sanitized.insert(key.clone(), Value::String(ts));
            }

            "content_type" | "action_type" | "task_type" => {
                let s = value.as_str().unwrap_or_default();
                let clean = sanitize_content(s, ContentKind::Text)?;
                sanitized.insert(key.clone(), Value::String(clean));
            }

            "success" => {
                if !value.is_boolean() {
                    return Err(ValidationError::InvalidValue {
                        field: "success".to_string(),
                        reason: "must be a boolean".to_string(),
                    });
                }
                sanitized.insert(key.clone(), value.clone());
            }

            "metadata_contains" => {
                let clean = validate_metadata(value)?;
                sanitized.insert(key.clone(), Value::Object(clean));
            }

            "limit" => {
                let n = parse_non_negative_int("limit", value)?;
                if n > MAX_FILTER_LIMIT {
                    return Err(ValidationError::InvalidValue {
                        field: "limit".to_string(),
                        reason: format!("cannot exceed {}", MAX_FILTER_LIMIT),
                    });
                }
                sanitized.insert(key.clone(), Value::from(n));
            }

            "offset" => {
                let n = parse_non_negative_int("offset", value)?;
                sanitized.insert(key.clone(), Value::from(n));
            }

            "date_range" => {
                let Some(range) = value.as_array().filter(|a| a.len() == 2) else {
                    return Err(ValidationError::InvalidValue {
                        field: "date_range".to_string(),
                        reason: "must be a pair of timestamps".to_string(),
                    });
                };
                let start = parse_datetime("date_range.start", &range[0])?;
                let end = parse_datetime("date_range.end", &range[1])?;
                if start > end {
                    return Err(ValidationError::InvalidValue {
                        field: "date_range".to_string(),
                        reason: "start cannot be after end".to_string(),
                    });
                }
                sanitized.insert(key.clone(), value.clone());
            }

            unknown => {
                tracing::warn!(key = unknown, "Unknown filter key ignored");
            }
        }
    }

    Ok(sanitized)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_non_object_rejected() {
        assert!(validate_filters(&json!([1, 2])).is_err());
        assert!(validate_filters(&json!("x")).is_err());
    }

    #[test]
    fn test_unknown_keys_dropped_not_fatal() {
        let filters = json!({"limit": 10, "frobnicate": true});
        let out = validate_filters(&filters).unwrap();
        assert!(out.contains_key("limit"));
        assert!(!out.contains_key("frobnicate"));
    }

    #[test]
    fn test_agent_id_must_be_uuid() {
        let id = Uuid::now_v7();
        let ok = validate_filters(&json!({"agent_id": id.to_string()})).unwrap();
        assert_eq!(ok["agent_id"], json!(id.to_string()));

        assert!(validate_filters(&json!({"agent_id": "bogus"})).is_err());
        assert!(validate_filters(&json!({"agent_id": 42})).is_err());
    }

    #[test]
    fn test_limit_bounds() {
        assert!(validate_filters(&json!({"limit": MAX_FILTER_LIMIT})).is_ok());
        assert!(validate_filters(&json!({"limit": MAX_FILTER_LIMIT + 1})).is_err());
        assert!(validate_filters(&json!({"limit": -1})).is_err());
        assert!(validate_filters(&json!({"limit": "ten"})).is_err());
    }

    #[test]
    fn test_datetime_filters_must_parse() {
        let ok = validate_filters(&json!({"created_after": "2026-01-01T00:00:00Z"})).unwrap();
        assert!(ok.contains_key("created_after"));

        assert!(validate_filters(&json!({"created_after": "yesterday"})).is_err());
        assert!(validate_filters(&json!({"created_before": 1234})).is_err());
    }

    #[test]
    fn test_success_must_be_boolean() {
        assert!(validate_filters(&json!({"success": true})).is_ok());
        assert!(validate_filters(&json!({"success": "yes"})).is_err());
    }

    #[test]
    fn test_date_range_ordering() {
        let ok = json!({"date_range": ["2026-01-01T00:00:00Z", "2026-02-01T00:00:00Z"]});
        assert!(validate_filters(&ok).is_ok());

        let backwards = json!({"date_range": ["2026-02-01T00:00:00Z", "2026-01-01T00:00:00Z"]});
        assert!(validate_filters(&backwards).is_err());

        let wrong_arity = json!({"date_range": ["2026-01-01T00:00:00Z"]});
        assert!(validate_filters(&wrong_arity).is_err());
    }

    #[test]
    fn test_content_type_sanitized() {
        let out = validate_filters(&json!({"content_type": "re<script>x</script>port"})).unwrap();
        assert_eq!(out["content_type"], json!("report"));
    }

    #[test]
    fn test_metadata_contains_validated() {
        let ok = json!({"metadata_contains": {"source": "crawler"}});
        assert!(validate_filters(&ok).is_ok());

        let bad = json!({"metadata_contains": "not a map"});
        assert!(validate_filters(&bad).is_err());
    }
}
