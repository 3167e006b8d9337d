//! The export orchestrator.
//!
//! `export` turns one configuration object into a canonical tree:
//!
//! 1. base extraction (raw row plus settings, or the plain representation
//!    plus custom fields for Icinga objects)
//! 2. denial of `id` and per-kind state properties
//! 3. kind-specific enrichment, which may export related objects
//! 4. optional projection onto an allowlist
//! 5. canonical key ordering
//!
//! Each step is a transform on an owned property bag. Any error aborts the
//! whole export; there is no partial result.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::export::canonical::canonicalize;
use crate::export::filter::{self, SETTINGS};
use crate::export::options::ExportOptions;
use crate::export::relations::{RelationResolver, ServiceResolution};
use crate::model::{value_as_i64, ConfigObject, ExportTree, ObjectType, Properties};
use crate::repository::{ConfigRepository, FieldReferenceLoader};

/// Exports configuration objects from a repository.
///
/// The exporter holds no mutable state; one instance can serve any number
/// of (concurrent) exports.
pub struct Exporter<'a, R: ?Sized> {
    repo: &'a R,
    options: ExportOptions,
}

impl<'a, R> Exporter<'a, R>
where
    R: ConfigRepository + FieldReferenceLoader + ?Sized,
{
    /// Create an exporter with default options.
    #[must_use]
    pub fn new(repo: &'a R) -> Self {
        Self::with_options(repo, ExportOptions::default())
    }

    #[must_use]
    pub const fn with_options(repo: &'a R, options: ExportOptions) -> Self {
        Self { repo, options }
    }

    #[must_use]
    pub const fn options(&self) -> &ExportOptions {
        &self.options
    }

    #[must_use]
    pub const fn enable_host_services(mut self, enable: bool) -> Self {
        self.options.include_host_services = enable;
        self
    }

    #[must_use]
    pub const fn resolve_host_services(mut self, enable: bool) -> Self {
        self.options.resolve_all_host_services = enable;
        self
    }

    #[must_use]
    pub const fn show_defaults(mut self, show: bool) -> Self {
        self.options.show_defaults = show;
        self
    }

    #[must_use]
    pub const fn show_ids(mut self, show: bool) -> Self {
        self.options.show_ids = show;
        self
    }

    #[must_use]
    pub const fn resolve_objects(mut self, resolve: bool) -> Self {
        self.options.resolve_objects = resolve;
        self
    }

    /// Restrict the top level of every export to `properties`.
    #[must_use]
    pub fn filter_properties(mut self, properties: Vec<String>) -> Self {
        self.options.properties = Some(properties);
        self
    }

    /// Export `object` as a canonical tree.
    ///
    /// # Errors
    ///
    /// - `NotFound` for dangling references (time period, template, import
    ///   source, datalist, category, service)
    /// - `Unsupported` for service sets owned by a host
    /// - `CyclicInheritance` for cyclic template chains
    /// - repository errors, unchanged
    pub fn export(&self, object: &ConfigObject) -> Result<ExportTree> {
        let kind = object.kind();
        debug!(%kind, name = %object.name(), "exporting object");

        let props = self.extract(object)?;
        let props = filter::deny(props, kind.denied_properties(), self.options.show_ids);
        let props = self.enrich(object, props)?;
        let props = match &self.options.properties {
            Some(allowlist) => filter::project(props, allowlist),
            None => props,
        };

        Ok(canonicalize(Value::Object(props)))
    }

    fn extract(&self, object: &ConfigObject) -> Result<Properties> {
        if object.kind().is_icinga_object() {
            self.extract_icinga_object(object)
        } else {
            self.extract_db_object(object)
        }
    }

    fn extract_db_object(&self, object: &ConfigObject) -> Result<Properties> {
        let mut props = object.properties().clone();
        if object.kind().supports_settings() {
            props.insert(
                SETTINGS.to_string(),
                Value::Object(self.repo.settings(object)?),
            );
        }
        if self.options.show_defaults {
            Ok(props)
        } else {
            // Null is the default for every property of these kinds.
            Ok(filter::strip_nulls(props))
        }
    }

    fn extract_icinga_object(&self, object: &ConfigObject) -> Result<Properties> {
        let mut props = self.repo.plain_object(
            object,
            self.options.resolve_objects,
            !self.options.show_defaults,
        )?;
        if object.kind().supports_fields() {
            let fields = self.repo.load_for(object)?;
            props.insert("fields".to_string(), serde_json::to_value(fields)?);
        }
        Ok(props)
    }

    fn enrich(&self, object: &ConfigObject, mut props: Properties) -> Result<Properties> {
        match object.kind() {
            ObjectType::Datalist => {
                props.insert("entries".to_string(), self.datalist_entries(object)?);
            }
            ObjectType::Datafield => self.resolve_datafield_refs(&mut props)?,
            ObjectType::ImportSource => {
                props.insert("modifiers".to_string(), self.row_modifiers(object)?);
            }
            ObjectType::SyncRule => {
                props.insert("properties".to_string(), self.sync_properties(object)?);
            }
            ObjectType::Command => strip_argument_owner(&mut props),
            ObjectType::Job => {
                if let Some(id) = object.get_i64("timeperiod_id") {
                    let name = self.repo.timeperiod_name(id)?;
                    props.insert("timeperiod".to_string(), Value::String(name));
                }
                props.remove("timeperiod_id");
            }
            ObjectType::HostTemplateChoice => {
                self.resolve_template_choice(object, ObjectType::Host, &mut props)?;
            }
            ObjectType::ServiceTemplateChoice => {
                self.resolve_template_choice(object, ObjectType::Service, &mut props)?;
            }
            ObjectType::ServiceSet => {
                props.insert("services".to_string(), self.service_set_services(object)?);
            }
            ObjectType::Host => {
                if self.options.exports_host_services() {
                    props.insert("services".to_string(), self.host_services(object)?);
                }
            }
            ObjectType::Service
            | ObjectType::Timeperiod
            | ObjectType::Zone
            | ObjectType::Endpoint
            | ObjectType::User
            | ObjectType::Notification
            | ObjectType::HostGroup
            | ObjectType::ServiceGroup
            | ObjectType::ImportRowModifier
            | ObjectType::SyncProperty
            | ObjectType::DatalistEntry
            | ObjectType::DatafieldCategory => {}
        }
        Ok(props)
    }

    /// Entries sorted by name, pending removals skipped, owner stripped.
    fn datalist_entries(&self, list: &ConfigObject) -> Result<Value> {
        if list.id().is_none() {
            return Ok(Value::Array(Vec::new()));
        }

        let mut by_name: BTreeMap<String, Properties> = BTreeMap::new();
        for entry in self.repo.datalist_entries(list)? {
            if entry.should_be_removed() {
                continue;
            }
            let name = entry.get_str("entry_name").unwrap_or_default().to_string();
            let mut plain = entry.into_properties();
            plain.remove("list_id");
            by_name.insert(name, plain);
        }

        Ok(Value::Array(
            by_name
                .into_values()
                .map(|entry| canonicalize(Value::Object(entry)))
                .collect(),
        ))
    }

    fn resolve_datafield_refs(&self, props: &mut Properties) -> Result<()> {
        if let Some(Value::Object(settings)) = props.get_mut(SETTINGS) {
            // A null datalist_id stays as it is.
            if let Some(raw) = settings.get("datalist_id").filter(|v| !v.is_null()).cloned() {
                let id = value_as_i64(&raw)
                    .ok_or_else(|| Error::not_found(ObjectType::Datalist, &raw))?;
                let name = self.repo.datalist_name(id)?;
                settings.remove("datalist_id");
                settings.insert("datalist".to_string(), Value::String(name));
            }
        }

        let category = match props.remove("category_id").as_ref().and_then(value_as_i64) {
            Some(id) => Value::String(self.repo.datafield_category_name(id)?),
            None => Value::Null,
        };
        props.insert("category".to_string(), category);
        Ok(())
    }

    /// Row modifiers in priority order, each fully exported.
    fn row_modifiers(&self, source: &ConfigObject) -> Result<Value> {
        self.repo
            .row_modifiers(source)?
            .iter()
            .map(|modifier| self.export(modifier))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array)
    }

    fn sync_properties(&self, rule: &ConfigObject) -> Result<Value> {
        let source_names = self.repo.import_source_names()?;
        let mut all = Vec::new();

        for mut property in self.repo.sync_properties(rule)? {
            let source_id = property.get("source_id").and_then(value_as_i64);
            let name = source_id
                .and_then(|id| source_names.get(&id))
                .ok_or_else(|| {
                    Error::not_found(
                        ObjectType::ImportSource,
                        source_id.map_or_else(|| "null".to_string(), |id| id.to_string()),
                    )
                })?;
            property.insert("source".to_string(), Value::String(name.clone()));
            property.remove("id");
            property.remove("rule_id");
            property.remove("source_id");
            all.push(canonicalize(Value::Object(property)));
        }

        Ok(Value::Array(all))
    }

    fn resolve_template_choice(
        &self,
        choice: &ConfigObject,
        target: ObjectType,
        props: &mut Properties,
    ) -> Result<()> {
        if let Some(raw) = props.remove("required_template_id") {
            if let Some(id) = value_as_i64(&raw) {
                let name = self.repo.template_name(target, id)?;
                props.insert("required_template".to_string(), Value::String(name));
            }
        }

        let members = self.repo.template_choice_members(choice)?;
        props.insert(
            "members".to_string(),
            Value::Array(members.into_iter().map(Value::String).collect()),
        );
        Ok(())
    }

    /// Member services keyed (and sorted) by name.
    fn service_set_services(&self, set: &ConfigObject) -> Result<Value> {
        if set.get_i64("host_id").is_some() {
            return Err(Error::Unsupported(format!(
                "service set '{}' belongs to a single host",
                set.name()
            )));
        }

        let mut services = BTreeMap::new();
        for service in self.repo.service_set_services(set)? {
            services.insert(service.name(), self.export(&service)?);
        }
        Ok(Value::Object(services.into_iter().collect()))
    }

    fn host_services(&self, host: &ConfigObject) -> Result<Value> {
        let mode = if self.options.resolve_all_host_services {
            ServiceResolution::Full
        } else {
            ServiceResolution::Direct
        };

        let resolved = RelationResolver::new(self.repo).host_services(host, mode)?;
        let mut services = Vec::with_capacity(resolved.len());
        for entry in resolved {
            let mut service = self.repo.load_by_uuid(ObjectType::Service, entry.uuid)?;
            if self.options.resolve_objects {
                service = self.repo.materialize(&service)?;
            }
            services.push(self.export(&service)?);
        }
        Ok(Value::Array(services))
    }
}

/// Arguments are nested below their command; the back reference is noise.
fn strip_argument_owner(props: &mut Properties) {
    match props.get_mut("arguments") {
        Some(Value::Object(arguments)) => {
            for argument in arguments.values_mut() {
                if let Value::Object(argument) = argument {
                    argument.remove("command_id");
                }
            }
        }
        Some(Value::Array(arguments)) => {
            for argument in arguments {
                if let Value::Object(argument) = argument {
                    argument.remove("command_id");
                }
            }
        }
        _ => {}
    }
}
