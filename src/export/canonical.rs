//! Canonical key ordering.
//!
//! Two exports of the same logical state must serialize to identical bytes.
//! Every map is re-ordered by key (byte order); sequences keep their order,
//! which belongs to whoever built them (priority, name, resolution order).

use serde_json::{Map, Value};

/// Recursively sort the keys of every map in `tree`.
#[must_use]
pub fn canonicalize(tree: Value) -> Value {
    match tree {
        Value::Object(map) => Value::Object(sort_map(map)),
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        scalar => scalar,
    }
}

/// Sort one map by key, canonicalizing its values.
#[must_use]
pub fn sort_map(map: Map<String, Value>) -> Map<String, Value> {
    let mut entries: Vec<(String, Value)> = map.into_iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));
    entries
        .into_iter()
        .map(|(key, value)| (key, canonicalize(value)))
        .collect()
}

/// Whether every map in `tree` is already in canonical order.
#[must_use]
pub fn is_canonical(tree: &Value) -> bool {
    match tree {
        Value::Object(map) => {
            let keys: Vec<&String> = map.keys().collect();
            keys.windows(2).all(|w| w[0].as_bytes() <= w[1].as_bytes())
                && map.values().all(is_canonical)
        }
        Value::Array(items) => items.iter().all(is_canonical),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(value: &Value) -> Vec<&str> {
        value
            .as_object()
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_sorts_nested_maps() {
        let tree = json!({
            "zone": "master",
            "vars": {"os": "Linux", "env": "prod"},
            "address": "10.0.0.1",
        });
        let sorted = canonicalize(tree);

        assert_eq!(keys(&sorted), vec!["address", "vars", "zone"]);
        assert_eq!(keys(&sorted["vars"]), vec!["env", "os"]);
        assert!(is_canonical(&sorted));
    }

    #[test]
    fn test_sequences_keep_order() {
        let tree = json!({"modifiers": [{"priority": 2, "b": 1, "a": 0}, {"priority": 1}]});
        let sorted = canonicalize(tree);

        assert_eq!(sorted["modifiers"][0]["priority"], 2);
        assert_eq!(sorted["modifiers"][1]["priority"], 1);
        assert_eq!(keys(&sorted["modifiers"][0]), vec!["a", "b", "priority"]);
    }

    #[test]
    fn test_sorts_by_key_bytes() {
        let tree = json!({"b": 1, "B": 2, "_": 3, "a": 4});
        let sorted = canonicalize(tree);
        assert_eq!(keys(&sorted), vec!["B", "_", "a", "b"]);
    }

    #[test]
    fn test_idempotent() {
        let tree = json!({"x": {"d": [ {"z": 1, "y": 2} ], "c": null}, "a": true});
        let once = canonicalize(tree);
        let twice = canonicalize(once.clone());
        assert_eq!(
            serde_json::to_string(&once).unwrap(),
            serde_json::to_string(&twice).unwrap()
        );
    }

    #[test]
    fn test_detects_unsorted() {
        assert!(!is_canonical(&json!({"b": 1, "a": 2})));
        assert!(!is_canonical(&json!([{"b": 1, "a": 2}])));
        assert!(is_canonical(&json!("scalar")));
    }
}
