//! Property filtering.
//!
//! Pure transforms over a property bag: null stripping, denial of internal
//! and per-kind state properties, and projection onto a caller allowlist.

use serde_json::Value;

use crate::model::Properties;

/// Key of the nested settings bag.
pub const SETTINGS: &str = "settings";

/// Internal auto-increment id.
pub const ID: &str = "id";

/// Drop null-valued properties, including those inside `settings`.
#[must_use]
pub fn strip_nulls(mut props: Properties) -> Properties {
    props.retain(|_, value| !value.is_null());
    if let Some(Value::Object(settings)) = props.get_mut(SETTINGS) {
        settings.retain(|_, value| !value.is_null());
    }
    props
}

/// Remove `id` (unless `show_ids`) and every denied key.
///
/// The id is removed from the settings bag as well. Denied keys are exact
/// names.
#[must_use]
pub fn deny(mut props: Properties, denied: &[&str], show_ids: bool) -> Properties {
    if !show_ids {
        props.remove(ID);
        if let Some(Value::Object(settings)) = props.get_mut(SETTINGS) {
            settings.remove(ID);
        }
    }
    for key in denied {
        props.remove(*key);
    }
    props
}

/// Keep only keys listed in `allowlist`.
///
/// Requested keys missing from `props` stay missing; nothing is synthesized.
#[must_use]
pub fn project(props: Properties, allowlist: &[String]) -> Properties {
    props
        .into_iter()
        .filter(|(key, _)| allowlist.iter().any(|allowed| allowed == key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Properties {
        match value {
            Value::Object(map) => map,
            _ => Properties::new(),
        }
    }

    #[test]
    fn test_strip_nulls() {
        let stripped = strip_nulls(props(json!({
            "job_name": "sync",
            "timeperiod_id": null,
            "settings": {"rule": "hosts", "unused": null},
        })));

        assert!(stripped.contains_key("job_name"));
        assert!(!stripped.contains_key("timeperiod_id"));
        assert_eq!(stripped["settings"], json!({"rule": "hosts"}));
    }

    #[test]
    fn test_deny_removes_id_everywhere() {
        let denied = deny(
            props(json!({"id": 1, "last_attempt": 5, "settings": {"id": 9, "a": 1}})),
            &["last_attempt"],
            false,
        );
        assert_eq!(denied, props(json!({"settings": {"a": 1}})));
    }

    #[test]
    fn test_deny_keeps_id_when_asked() {
        let denied = deny(props(json!({"id": 1, "source_id": 2})), &["source_id"], true);
        assert_eq!(denied, props(json!({"id": 1})));
    }

    #[test]
    fn test_deny_is_exact_match() {
        let denied = deny(props(json!({"sync_state_x": 1, "sync_state": 2})), &["sync_state"], false);
        assert!(denied.contains_key("sync_state_x"));
        assert!(!denied.contains_key("sync_state"));
    }

    #[test]
    fn test_project_is_intersection() {
        let allow = vec!["object_name".to_string(), "zone".to_string()];
        let projected = project(
            props(json!({"object_name": "web1", "address": "10.0.0.1", "object_type": "object"})),
            &allow,
        );
        assert_eq!(projected, props(json!({"object_name": "web1"})));
    }
}
