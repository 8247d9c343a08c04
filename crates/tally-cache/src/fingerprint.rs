// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request fingerprinting.
//!
//! A fingerprint is the SHA-256 of a canonical JSON serialization of the
//! request: object keys sorted recursively, array order preserved. Two
//! requests that differ only in incidental field ordering fingerprint
//! identically; any difference in model, message content, or sampling
//! parameters changes the digest.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Derive the cache key for a request.
pub fn fingerprint(request: &Value) -> String {
    let canonical = canonicalize(request).to_string();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Rebuild a value with object keys in sorted order at every level.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut pairs: Vec<(&String, &Value)> = map.iter().collect();
            pairs.sort_by_key(|(k, _)| k.as_str());
            let mut sorted = Map::new();
            for (key, val) in pairs {
                sorted.insert(key.clone(), canonicalize(val));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn identical_requests_collide() {
        let a = json!({
            "model": "gpt-4o",
            "messages": [{"role": "user", "content": "hello"}],
            "temperature": 0.7
        });
        let b = a.clone();
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn key_order_is_incidental() {
        let a: Value =
            serde_json::from_str(r#"{"model":"gpt-4o","temperature":0.7,"max_tokens":64}"#)
                .unwrap();
        let b: Value =
            serde_json::from_str(r#"{"max_tokens":64,"temperature":0.7,"model":"gpt-4o"}"#)
                .unwrap();
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn message_content_changes_the_digest() {
        let a = json!({"model": "gpt-4o", "messages": [{"role": "user", "content": "hello"}]});
        let b = json!({"model": "gpt-4o", "messages": [{"role": "user", "content": "hello!"}]});
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn sampling_parameters_change_the_digest() {
        let a = json!({"model": "gpt-4o", "prompt": "x", "temperature": 0.0});
        let b = json!({"model": "gpt-4o", "prompt": "x", "temperature": 1.0});
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn array_order_is_significant() {
        let a = json!({"messages": [{"content": "first"}, {"content": "second"}]});
        let b = json!({"messages": [{"content": "second"}, {"content": "first"}]});
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn nested_objects_are_canonicalized() {
        let a: Value = serde_json::from_str(r#"{"outer":{"a":1,"b":{"x":1,"y":2}}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"outer":{"b":{"y":2,"x":1},"a":1}}"#).unwrap();
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn digest_is_hex_sha256() {
        let digest = fingerprint(&json!({"model": "m"}));
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    proptest! {
        #[test]
        fn insertion_order_never_matters(
            fields in proptest::collection::btree_map("[a-z]{1,8}", 0u64..1000, 1..8)
        ) {
            let mut forward = Map::new();
            for (k, v) in &fields {
                forward.insert(k.clone(), json!(v));
            }
            let mut reverse = Map::new();
            for (k, v) in fields.iter().rev() {
                reverse.insert(k.clone(), json!(v));
            }
            prop_assert_eq!(
                fingerprint(&Value::Object(forward)),
                fingerprint(&Value::Object(reverse))
            );
        }
    }
}
