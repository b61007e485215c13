//! Metadata validation.
//!
//! Metadata travels with every stored entry and ends up serialized into
//! the backing store, so the gate caps its size, sanitizes every string
//! key and value, and bounds nested structures.

use crate::sanitize::{sanitize_content, ContentKind};
use mnemo_core::constants::{
    MAX_METADATA_KEY_LENGTH, MAX_METADATA_SIZE, MAX_NESTED_METADATA_SIZE,
};
use mnemo_core::ValidationError;
use serde_json::{Map, Value};

/// Validate and sanitize a metadata map.
///
/// - total serialized size is capped,
/// - keys must be short strings and are sanitized,
/// - string values are sanitized,
/// - numbers and booleans pass through,
/// - nested arrays/objects are allowed only under a smaller serialized cap,
/// - null values are dropped.
pub fn validate_metadata(metadata: &Value) -> Result<Map<String, Value>, ValidationError> {
    let Some(map) = metadata.as_object() else {
        return Err(ValidationError::InvalidValue {
            field: "metadata".to_string(),
            reason: "must be an object".to_string(),
        });
    };

    let serialized_len = metadata.to_string().len();
    if serialized_len > MAX_METADATA_SIZE {
        return Err(ValidationError::TooLong {
            field: "metadata".to_string(),
            len: serialized_len,
            max: MAX_METADATA_SIZE,
        });
    }

    let mut sanitized = Map::new();
    for (key, value) in map {
        if key.len() > MAX_METADATA_KEY_LENGTH {
            return Err(ValidationError::TooLong {
                field: "metadata key".to_string(),
                len: key.len(),
                max: MAX_METADATA_KEY_LENGTH,
            });
        }
        let clean_key = sanitize_content(key, ContentKind::Text)?;

        let clean_value = match value {
            Value::String(s) => Value::String(sanitize_content(s, ContentKind::Text)?),
            Value::Number(_) | Value::Bool(_) => value.clone(),
            Value::Array(_) | Value::Object(_) => {
                let nested_len = value.to_string().len();
                if nested_len > MAX_NESTED_METADATA_SIZE {
                    return Err(ValidationError::TooLong {
                        field: format!("metadata.{}", clean_key),
                        len: nested_len,
                        max: MAX_NESTED_METADATA_SIZE,
                    });
                }
                value.clone()
            }
            Value::Null => continue,
        };

        sanitized.insert(clean_key, clean_value);
    }

    Ok(sanitized)
}

// =============================================================================
// TESTS
// =============================================================================
