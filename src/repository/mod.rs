//! Read-side interfaces the exporter depends on.
//!
//! The exporter never talks to a database directly. It asks a
//! [`ConfigRepository`] for objects, plain representations and relations,
//! a [`TemplateRepository`] for import chains and a
//! [`FieldReferenceLoader`] for custom data fields.
//! [`crate::storage::SqliteRepository`] implements all three.

mod query;

pub use query::{ServiceQuery, ServiceRow, ServiceSource};

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::error::Result;
use crate::model::{ConfigObject, FieldReference, ObjectType, Properties};

/// Access to the template (import) graph.
pub trait TemplateRepository {
    /// Direct parents of `object`, in import order.
    ///
    /// Detached or unstored objects have no parents.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails or a parent row is missing.
    fn parents(&self, object: &ConfigObject) -> Result<Vec<ConfigObject>>;
}

/// Loads custom data field references.
pub trait FieldReferenceLoader {
    /// Field references attached to `object`, ordered by variable name.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn load_for(&self, object: &ConfigObject) -> Result<Vec<FieldReference>>;
}

/// Read access to stored configuration objects and their relations.
///
/// Implementations own all storage access and must release any cursor they
/// open before returning, on success and failure alike.
pub trait ConfigRepository: TemplateRepository {
    /// Load an object by its name, or by numeric id for unnamed kinds.
    ///
    /// # Errors
    ///
    /// `NotFound` when nothing matches, `AmbiguousName` when several do.
    fn load(&self, kind: ObjectType, key: &str) -> Result<ConfigObject>;

    /// Load an object by its auto-increment id.
    ///
    /// # Errors
    ///
    /// `NotFound` when no row has this id.
    fn load_by_id(&self, kind: ObjectType, id: i64) -> Result<ConfigObject>;

    /// Load an object by its stable unique identifier.
    ///
    /// # Errors
    ///
    /// `NotFound` when no row has this uuid.
    fn load_by_uuid(&self, kind: ObjectType, uuid: Uuid) -> Result<ConfigObject>;

    /// All objects of a kind, ordered by name, then id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn load_all(&self, kind: ObjectType) -> Result<Vec<ConfigObject>>;

    /// Settings bag of a settings-capable object, sorted by setting name.
    ///
    /// Depending on the object this is computed by a hook or read from the
    /// settings table.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be read or computed.
    fn settings(&self, object: &ConfigObject) -> Result<Properties>;

    /// Plain representation of an Icinga object: relations as names,
    /// `imports`, `vars` and type-specific collections inline.
    ///
    /// With `resolved`, inherited properties are flattened in and `imports`
    /// is dropped. With `skip_defaults`, unset properties are left out.
    ///
    /// # Errors
    ///
    /// Returns an error if a reference cannot be resolved.
    fn plain_object(
        &self,
        object: &ConfigObject,
        resolved: bool,
        skip_defaults: bool,
    ) -> Result<Properties>;

    /// Re-create `object` from its resolved plain representation.
    ///
    /// # Errors
    ///
    /// Returns an error if resolving the plain representation fails.
    fn materialize(&self, object: &ConfigObject) -> Result<ConfigObject> {
        let plain = self.plain_object(object, true, false)?;
        Ok(ConfigObject::detached(object.kind(), plain))
    }

    /// Entries of a datalist, including the ones pending removal.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn datalist_entries(&self, list: &ConfigObject) -> Result<Vec<ConfigObject>>;

    /// Name of the datalist with the given id.
    ///
    /// # Errors
    ///
    /// `NotFound` for a dangling id.
    fn datalist_name(&self, id: i64) -> Result<String>;

    /// Name of the datafield category with the given id.
    ///
    /// # Errors
    ///
    /// `NotFound` for a dangling id.
    fn datafield_category_name(&self, id: i64) -> Result<String>;

    /// Row modifiers of an import source, by priority.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn row_modifiers(&self, source: &ConfigObject) -> Result<Vec<ConfigObject>>;

    /// Raw properties of the sync properties of a rule, by priority.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn sync_properties(&self, rule: &ConfigObject) -> Result<Vec<Properties>>;

    /// Import source names keyed by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn import_source_names(&self) -> Result<BTreeMap<i64, String>>;

    /// Name of the time period with the given id.
    ///
    /// # Errors
    ///
    /// `NotFound` for a dangling id.
    fn timeperiod_name(&self, id: i64) -> Result<String>;

    /// Name of the template of `kind` with the given id.
    ///
    /// # Errors
    ///
    /// `NotFound` when there is no template with this id.
    fn template_name(&self, kind: ObjectType, id: i64) -> Result<String>;

    /// Names of the templates offered by a template choice.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn template_choice_members(&self, choice: &ConfigObject) -> Result<Vec<String>>;

    /// Service objects belonging to a service set, by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn service_set_services(&self, set: &ConfigObject) -> Result<Vec<ConfigObject>>;

    /// Template sets imported by the service sets a host owns, by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn host_service_sets(&self, host: &ConfigObject) -> Result<Vec<ConfigObject>>;

    /// Service sets whose assign filter matches the host.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a filter is malformed.
    fn applied_service_sets(&self, host: &ConfigObject) -> Result<Vec<ConfigObject>>;

    /// Execute a service listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a filter is malformed.
    fn service_rows(&self, query: &ServiceQuery) -> Result<Vec<ServiceRow>>;
}
