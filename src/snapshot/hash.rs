//! Content hashing for change detection.
//!
//! Records are hashed over their serialized JSON. Export trees are
//! canonical, so equal configuration always yields equal hashes.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::snapshot::types::SnapshotResult;

/// Compute a SHA256 hash of a serializable value, as lowercase hex.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized to JSON.
pub fn content_hash<T: Serialize + ?Sized>(value: &T) -> SnapshotResult<String> {
    let json = serde_json::to_string(value)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Check if a record has changed since the last snapshot.
///
/// Returns `true` if there is no stored hash or the hashes differ.
#[must_use]
pub fn has_changed(current_hash: &str, stored_hash: Option<&str>) -> bool {
    stored_hash.is_none_or(|h| h != current_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_hash_deterministic() {
        let tree = json!({"object_name": "web1", "vars": {"env": "prod"}});

        let hash1 = content_hash(&tree).unwrap();
        let hash2 = content_hash(&tree.clone()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_content_hash_changes_with_content() {
        let hash1 = content_hash(&json!({"max_check_attempts": 3})).unwrap();
        let hash2 = content_hash(&json!({"max_check_attempts": 4})).unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_has_changed() {
        assert!(has_changed("abc123", None));
        assert!(has_changed("abc123", Some("xyz789")));
        assert!(!has_changed("abc123", Some("abc123")));
    }
}
