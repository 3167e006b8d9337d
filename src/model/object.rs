//! Configuration objects as handed out by a repository.

use serde_json::{Map, Value};
use uuid::Uuid;

use super::ObjectType;

/// Flat property bag: column (or property) name to scalar or null.
pub type Properties = Map<String, Value>;

/// A typed configuration record.
///
/// Objects are either *stored* (loaded from a table, carrying their `id`) or
/// *detached*: built from a resolved plain representation, with inheritance
/// already flattened and no database identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigObject {
    kind: ObjectType,
    properties: Properties,
    detached: bool,
    pending_removal: bool,
}

impl ConfigObject {
    /// Wrap a stored row.
    #[must_use]
    pub fn new(kind: ObjectType, properties: Properties) -> Self {
        Self {
            kind,
            properties,
            detached: false,
            pending_removal: false,
        }
    }

    /// Build a detached object from a resolved plain representation.
    ///
    /// The `id` is dropped: a detached object has no row behind it.
    #[must_use]
    pub fn detached(kind: ObjectType, mut plain: Properties) -> Self {
        plain.remove("id");
        Self {
            kind,
            properties: plain,
            detached: true,
            pending_removal: false,
        }
    }

    /// Flag this object as scheduled for removal.
    #[must_use]
    pub fn with_pending_removal(mut self, pending: bool) -> Self {
        self.pending_removal = pending;
        self
    }

    #[must_use]
    pub const fn kind(&self) -> ObjectType {
        self.kind
    }

    #[must_use]
    pub const fn properties(&self) -> &Properties {
        &self.properties
    }

    #[must_use]
    pub fn into_properties(self) -> Properties {
        self.properties
    }

    #[must_use]
    pub const fn is_detached(&self) -> bool {
        self.detached
    }

    /// Whether a pending sync run is about to delete this object.
    #[must_use]
    pub const fn should_be_removed(&self) -> bool {
        self.pending_removal
    }

    /// Raw property value; `None` when absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Integer property, accepting numeric strings. Null counts as absent.
    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(value_as_i64)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Auto-increment id of a stored object.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        if self.detached {
            return None;
        }
        self.get_i64("id")
    }

    /// Stable unique identifier, for kinds that carry one.
    #[must_use]
    pub fn uuid(&self) -> Option<Uuid> {
        self.get_str("uuid").and_then(|s| Uuid::parse_str(s).ok())
    }

    /// Human-facing name, falling back to `#<id>` for unnamed kinds.
    #[must_use]
    pub fn name(&self) -> String {
        self.kind
            .name_column()
            .and_then(|column| self.get_str(column))
            .map_or_else(
                || self.id().map_or_else(|| "<unnamed>".to_string(), |id| format!("#{id}")),
                ToString::to_string,
            )
    }

    /// Whether this is a template (as opposed to an object or apply rule).
    #[must_use]
    pub fn is_template(&self) -> bool {
        self.get_str("object_type") == Some("template")
    }
}

/// Interpret a JSON scalar as an integer id.
///
/// Settings are stored as text, so `"42"` counts as well as `42`.
#[must_use]
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
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
    fn test_stored_object_accessors() {
        let host = ConfigObject::new(
            ObjectType::Host,
            props(json!({
                "id": 7,
                "uuid": "00000000-0000-0000-0000-000000000007",
                "object_name": "web1",
                "object_type": "object",
                "zone_id": null,
            })),
        );

        assert_eq!(host.id(), Some(7));
        assert_eq!(host.name(), "web1");
        assert_eq!(host.uuid(), Some(Uuid::from_u128(7)));
        assert_eq!(host.get_i64("zone_id"), None);
        assert!(!host.is_template());
        assert!(!host.is_detached());
    }

    #[test]
    fn test_detached_object_has_no_id() {
        let service = ConfigObject::detached(
            ObjectType::Service,
            props(json!({"id": 3, "object_name": "ping"})),
        );
        assert!(service.is_detached());
        assert_eq!(service.id(), None);
        assert!(service.get("id").is_none());
    }

    #[test]
    fn test_unnamed_kinds_fall_back_to_id() {
        let modifier = ConfigObject::new(ObjectType::ImportRowModifier, props(json!({"id": 12})));
        assert_eq!(modifier.name(), "#12");
    }

    #[test]
    fn test_value_as_i64() {
        assert_eq!(value_as_i64(&json!(5)), Some(5));
        assert_eq!(value_as_i64(&json!("17")), Some(17));
        assert_eq!(value_as_i64(&json!("x")), None);
        assert_eq!(value_as_i64(&Value::Null), None);
    }
}
