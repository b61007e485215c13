//! Deterministic cache key construction.
//!
//! Keys embed `agent:{id}` and `type:{kind}` facets so pattern-based
//! invalidation can target everything a write affects. Free-form request
//! parts (queries, filter sets) are folded in through a canonical SHA-256
//! content hash: `serde_json` serializes object keys in sorted order, so
//! logically identical filter maps hash identically regardless of how the
//! caller assembled them.

use mnemo_core::compute_content_hash;
use serde_json::Value;

/// Hex length kept from the full SHA-256 digest. Collisions at this
/// length are vanishingly unlikely for cache-sized keyspaces.
const HASH_PREFIX_LEN: usize = 16;

/// Canonical content hash of an arbitrary JSON value.
pub fn hash_content(value: &Value) -> String {
    let serialized = value.to_string();
    hash_text(&serialized)
}

/// Canonical content hash of a string.
pub fn hash_text(text: &str) -> String {
    let digest = compute_content_hash(text.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(HASH_PREFIX_LEN);
    hex
}

/// Key for a stored knowledge entry.
pub fn knowledge_key(agent_id: &str, kind: &str, content_hash: &str) -> String {
    format!("knowledge:agent:{agent_id}:type:{kind}:hash:{content_hash}")
}

/// Key for a retrieve query result.
pub fn retrieve_key(agent_id: &str, kind: &str, query: &str, filters: &Value) -> String {
    format!(
        "retrieve:agent:{agent_id}:type:{kind}:query:{}:filters:{}",
        hash_text(query),
        hash_content(filters)
    )
}

/// Key for a history query result.
pub fn history_key(agent_id: &str, kind: &str, filters: &Value) -> String {
    format!(
        "history:agent:{agent_id}:type:{kind}:filters:{}",
        hash_content(filters)
    )
}

/// Key for learning insights.
pub fn learning_key(agent_id: &str, task_type: &str) -> String {
    format!("learning:agent:{agent_id}:task:{task_type}")
}

/// Key for a similarity-search result.
pub fn similarity_key(query: &str, top_k: usize, filters: &Value) -> String {
    format!(
        "similarity:query:{}:k:{top_k}:filters:{}",
        hash_text(query),
        hash_content(filters)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hash_is_stable_and_short() {
        let h1 = hash_text("hello world");
        let h2 = hash_text("hello world");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), HASH_PREFIX_LEN);
    }

    #[test]
    fn test_hash_is_order_independent_for_objects() {
        // serde_json maps are sorted, so construction order is irrelevant.
        let a = json!({"limit": 10, "agent_id": "x", "success": true});
        let b = json!({"success": true, "limit": 10, "agent_id": "x"});
        assert_eq!(hash_content(&a), hash_content(&b));
    }

    #[test]
    fn test_different_filters_hash_differently() {
        let a = json!({"limit": 10});
        let b = json!({"limit": 11});
        assert_ne!(hash_content(&a), hash_content(&b));
    }

    #[test]
    fn test_keys_embed_invalidation_facets() {
        let key = retrieve_key("a1", "unstructured", "hello", &json!({}));
        assert!(key.contains("agent:a1"));
        assert!(key.contains("type:unstructured"));

        let key = knowledge_key("a1", "report", "abc123");
        assert!(key.starts_with("knowledge:agent:a1:type:report:"));
    }

    #[test]
    fn test_identical_requests_map_to_one_key() {
        let k1 = similarity_key("find widgets", 5, &json!({"success": true, "limit": 3}));
        let k2 = similarity_key("find widgets", 5, &json!({"limit": 3, "success": true}));
        assert_eq!(k1, k2);
        let k3 = similarity_key("find widgets", 6, &json!({"limit": 3, "success": true}));
        assert_ne!(k1, k3);
    }
}
