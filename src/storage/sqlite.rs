//! SQLite storage implementation.
//!
//! [`SqliteRepository`] reads a Director-shaped configuration database and
//! implements the repository traits the exporter consumes. Rows are handed
//! out as raw property bags; the plain representation of Icinga objects is
//! computed here because it needs further lookups (reference names,
//! imports, custom variables, command arguments).

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension, Params};
use serde_json::Value;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::export::templates::ancestors;
use crate::model::{value_as_i64, ConfigObject, FieldReference, ObjectType, Properties};
use crate::repository::{
    ConfigRepository, FieldReferenceLoader, ServiceQuery, ServiceRow, ServiceSource,
    TemplateRepository,
};
use crate::storage::assign::AssignFilter;
use crate::storage::hooks::JobHook;
use crate::storage::schema::apply_schema;

/// Icinga object columns holding `'y'`/`'n'` flags.
const FLAG_COLUMNS: &[&str] = &[
    "disabled",
    "is_global",
    "prefer_includes",
    "enable_notifications",
    "enable_active_checks",
    "use_agent",
    "skip_key",
    "repeat_key",
    "required",
];

/// SQLite-based configuration repository.
#[derive(Debug)]
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection.
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // ==================
    // Row Access
    // ==================

    fn select<P: Params>(&self, sql: &str, params: P) -> Result<Vec<Properties>> {
        trace!(sql, "select");
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let rows = stmt.query_map(params, |row| {
            let mut props = Properties::new();
            for (idx, column) in columns.iter().enumerate() {
                props.insert(column.clone(), sql_to_json(row.get_ref(idx)?));
            }
            Ok(props)
        })?;
        let collected = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(collected)
    }

    fn select_objects<P: Params>(
        &self,
        kind: ObjectType,
        sql: &str,
        params: P,
    ) -> Result<Vec<ConfigObject>> {
        Ok(self
            .select(sql, params)?
            .into_iter()
            .map(|props| wrap(kind, props))
            .collect())
    }

    fn select_names<P: Params>(&self, sql: &str, params: P) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;
        let names = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    /// Name of the `kind` row with the given id.
    fn name_of(&self, kind: ObjectType, id: i64) -> Result<String> {
        let column = kind
            .name_column()
            .ok_or_else(|| Error::Unsupported(format!("{kind} has no name")))?;
        let sql = format!("SELECT {column} FROM {} WHERE id = ?1", kind.table());
        self.conn
            .query_row(&sql, [id], |row| row.get::<_, String>(0))
            .optional()?
            .ok_or_else(|| Error::not_found(kind, id))
    }

    fn stored_settings(&self, object: &ConfigObject) -> Result<Properties> {
        let (Some((table, fk)), Some(id)) = (object.kind().settings_table(), object.id()) else {
            return Ok(Properties::new());
        };
        let sql = format!(
            "SELECT setting_name, setting_value FROM {table} WHERE {fk} = ?1 ORDER BY setting_name"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?;

        let mut settings = Properties::new();
        for row in rows {
            let (name, value) = row?;
            settings.insert(name, value.map_or(Value::Null, Value::String));
        }
        Ok(settings)
    }

    // ==================
    // Plain Representation
    // ==================

    fn plain_unresolved(&self, object: &ConfigObject) -> Result<Properties> {
        let kind = object.kind();
        let mut plain = Properties::new();

        for (column, value) in object.properties() {
            if column == "uuid" {
                continue;
            }
            if let Some((property, target)) = reference(kind, column) {
                let name = match value_as_i64(value) {
                    Some(id) => Value::String(self.name_of(target, id)?),
                    None => Value::Null,
                };
                plain.insert(property.to_string(), name);
            } else if FLAG_COLUMNS.contains(&column.as_str()) {
                plain.insert(column.clone(), flag(value));
            } else {
                plain.insert(column.clone(), value.clone());
            }
        }

        if kind.supports_inheritance() {
            let imports = self
                .parents(object)?
                .iter()
                .map(|parent| Value::String(parent.name()))
                .collect();
            plain.insert("imports".to_string(), Value::Array(imports));
        }
        if kind.supports_vars() {
            plain.insert("vars".to_string(), Value::Object(self.vars(object)?));
        }
        if kind == ObjectType::Command {
            plain.insert("arguments".to_string(), Value::Object(self.arguments(object)?));
        }

        Ok(plain)
    }

    fn plain_resolved(&self, object: &ConfigObject) -> Result<Properties> {
        let mut merged = Properties::new();
        for template in ancestors(self, object)? {
            merge_plain(&mut merged, strip_defaults(self.plain_unresolved(&template)?));
        }
        merge_plain(&mut merged, self.plain_unresolved(object)?);
        merged.remove("imports");
        Ok(merged)
    }

    fn vars(&self, object: &ConfigObject) -> Result<Properties> {
        let Some(id) = object.id() else {
            return Ok(Properties::new());
        };
        let sql = format!(
            "SELECT varname, varvalue, format FROM {}_var WHERE object_id = ?1 ORDER BY varname",
            object.kind().table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut vars = Properties::new();
        for row in rows {
            let (name, value, format) = row?;
            let value = match (value, format.as_str()) {
                (None, _) => Value::Null,
                (Some(text), "json") => serde_json::from_str(&text)?,
                (Some(text), _) => Value::String(text),
            };
            vars.insert(name, value);
        }
        Ok(vars)
    }

    /// Command arguments keyed by argument name.
    fn arguments(&self, command: &ConfigObject) -> Result<Properties> {
        let Some(id) = command.id() else {
            return Ok(Properties::new());
        };
        let rows = self.select(
            "SELECT * FROM icinga_command_argument WHERE command_id = ?1
             ORDER BY sort_order, argument_name",
            [id],
        )?;

        let mut arguments = Properties::new();
        for mut row in rows {
            row.remove("id");
            let Some(Value::String(name)) = row.remove("argument_name") else {
                continue;
            };
            for column in FLAG_COLUMNS {
                if let Some(value) = row.get_mut(*column) {
                    *value = flag(value);
                }
            }
            arguments.insert(name, Value::Object(row));
        }
        Ok(arguments)
    }

    /// Properties an assign filter is evaluated against.
    fn host_context(&self, host: &ConfigObject) -> Result<Value> {
        let mut context = self.plain_object(host, true, false)?;
        let templates = ancestors(self, host)?
            .iter()
            .map(|template| Value::String(template.name()))
            .collect();
        context.insert("name".to_string(), Value::String(host.name()));
        context.insert("templates".to_string(), Value::Array(templates));
        Ok(Value::Object(context))
    }

    fn assigned(&self, filter: Option<&Value>, context: &Value) -> Result<bool> {
        match filter.and_then(Value::as_str) {
            Some(filter) => Ok(AssignFilter::parse(filter)?.matches(context)),
            None => Ok(false),
        }
    }
}

// ==================
// Helpers
// ==================

fn sql_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn wrap(kind: ObjectType, mut props: Properties) -> ConfigObject {
    if kind == ObjectType::DatalistEntry {
        let pending = props.remove("pending_removal");
        let pending = pending.as_ref().and_then(Value::as_str) == Some("y");
        return ConfigObject::new(kind, props).with_pending_removal(pending);
    }
    ConfigObject::new(kind, props)
}

fn flag(value: &Value) -> Value {
    match value.as_str() {
        Some("y") => Value::Bool(true),
        Some("n") => Value::Bool(false),
        _ => value.clone(),
    }
}

/// Plain property name and target kind of a reference column.
fn reference(kind: ObjectType, column: &str) -> Option<(&'static str, ObjectType)> {
    match column {
        "check_command_id" => Some(("check_command", ObjectType::Command)),
        "command_id" => Some(("command", ObjectType::Command)),
        "zone_id" => Some(("zone", ObjectType::Zone)),
        "host_id" => Some(("host", ObjectType::Host)),
        "service_id" => Some(("service", ObjectType::Service)),
        "service_set_id" => Some(("service_set", ObjectType::ServiceSet)),
        "period_id" => Some(("period", ObjectType::Timeperiod)),
        "parent_id" if kind == ObjectType::Zone => Some(("parent", ObjectType::Zone)),
        "template_choice_id" => kind.template_choice().map(|choice| ("template_choice", choice)),
        _ => None,
    }
}

/// Drop unset values: nulls, `disabled: false` and empty collections.
fn strip_defaults(mut plain: Properties) -> Properties {
    plain.retain(|key, value| match (key.as_str(), &*value) {
        (_, Value::Null) => false,
        ("disabled", Value::Bool(false)) => false,
        ("imports", Value::Array(items)) => !items.is_empty(),
        ("vars" | "arguments", Value::Object(map)) => !map.is_empty(),
        _ => true,
    });
    if let Some(Value::Object(arguments)) = plain.get_mut("arguments") {
        for argument in arguments.values_mut() {
            if let Value::Object(argument) = argument {
                argument.retain(|_, value| !value.is_null());
            }
        }
    }
    plain
}

/// Fold `source` over `target`: later values win, nulls never override,
/// `vars` and `arguments` merge key-wise.
fn merge_plain(target: &mut Properties, source: Properties) {
    for (key, value) in source {
        if value.is_null() && target.contains_key(&key) {
            continue;
        }
        if matches!(key.as_str(), "vars" | "arguments") {
            if let (Some(Value::Object(existing)), Value::Object(incoming)) =
                (target.get_mut(&key), &value)
            {
                for (name, entry) in incoming {
                    existing.insert(name.clone(), entry.clone());
                }
                continue;
            }
        }
        target.insert(key, value);
    }
}

fn order_clause(kind: ObjectType) -> String {
    match kind {
        ObjectType::ImportRowModifier | ObjectType::SyncProperty => "priority, id".to_string(),
        ObjectType::DatalistEntry => "list_id, entry_name".to_string(),
        _ => kind
            .name_column()
            .map_or_else(|| "id".to_string(), |column| format!("{column}, id")),
    }
}

fn service_row(props: &Properties) -> Result<ServiceRow> {
    let object_name = props
        .get("object_name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let uuid = props
        .get("uuid")
        .and_then(Value::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or_else(|| Error::Other(format!("service '{object_name}' has no valid uuid")))?;
    Ok(ServiceRow { uuid, object_name })
}

fn sql_limit(query: &ServiceQuery) -> (i64, i64) {
    let limit = query.limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
    let offset = query.offset.map_or(0, |o| i64::try_from(o).unwrap_or(i64::MAX));
    (limit, offset)
}

// ==================
// Trait Implementations
// ==================

impl TemplateRepository for SqliteRepository {
    fn parents(&self, object: &ConfigObject) -> Result<Vec<ConfigObject>> {
        let kind = object.kind();
        let Some(id) = object.id().filter(|_| kind.supports_inheritance()) else {
            return Ok(Vec::new());
        };
        let table = kind.table();
        let sql = format!(
            "SELECT p.* FROM {table} p
             JOIN {table}_inheritance i ON i.parent_id = p.id
             WHERE i.object_id = ?1
             ORDER BY i.weight, p.id"
        );
        self.select_objects(kind, &sql, [id])
    }
}

impl FieldReferenceLoader for SqliteRepository {
    fn load_for(&self, object: &ConfigObject) -> Result<Vec<FieldReference>> {
        let kind = object.kind();
        let Some(id) = object.id().filter(|_| kind.supports_fields()) else {
            return Ok(Vec::new());
        };
        let sql = format!(
            "SELECT f.datafield_id, d.varname, f.is_required, f.var_filter
             FROM {}_field f
             JOIN director_datafield d ON d.id = f.datafield_id
             WHERE f.object_id = ?1
             ORDER BY d.varname, f.datafield_id",
            kind.table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([id], |row| {
            Ok(FieldReference {
                datafield_id: row.get(0)?,
                varname: row.get(1)?,
                is_required: row.get::<_, String>(2)? == "y",
                var_filter: row.get(3)?,
            })
        })?;
        let fields = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(fields)
    }
}

impl ConfigRepository for SqliteRepository {
    fn load(&self, kind: ObjectType, key: &str) -> Result<ConfigObject> {
        let Some(column) = kind.name_column() else {
            let id = key
                .parse::<i64>()
                .map_err(|_| Error::InvalidArgument(format!("{kind} is loaded by numeric id")))?;
            return self.load_by_id(kind, id);
        };

        let sql = format!(
            "SELECT * FROM {} WHERE {column} = ?1 ORDER BY {}",
            kind.table(),
            order_clause(kind)
        );
        let mut found = self.select_objects(kind, &sql, [key])?;
        debug!(%kind, key, matches = found.len(), "load by name");

        match found.len() {
            1 => Ok(found.remove(0)),
            0 => match key.parse::<i64>() {
                Ok(id) if kind != ObjectType::DatalistEntry => self.load_by_id(kind, id),
                _ => Err(Error::not_found(kind, key)),
            },
            count => Err(Error::AmbiguousName {
                kind,
                name: key.to_string(),
                count,
            }),
        }
    }

    fn load_by_id(&self, kind: ObjectType, id: i64) -> Result<ConfigObject> {
        if kind == ObjectType::DatalistEntry {
            return Err(Error::Unsupported(format!("{kind} has no id")));
        }
        let sql = format!("SELECT * FROM {} WHERE id = ?1", kind.table());
        self.select_objects(kind, &sql, [id])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(kind, id))
    }

    fn load_by_uuid(&self, kind: ObjectType, uuid: Uuid) -> Result<ConfigObject> {
        if !kind.is_icinga_object() {
            return Err(Error::Unsupported(format!("{kind} has no uuid")));
        }
        let sql = format!("SELECT * FROM {} WHERE lower(uuid) = ?1", kind.table());
        self.select_objects(kind, &sql, [uuid.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(kind, uuid))
    }

    fn load_all(&self, kind: ObjectType) -> Result<Vec<ConfigObject>> {
        let sql = format!("SELECT * FROM {} ORDER BY {}", kind.table(), order_clause(kind));
        self.select_objects(kind, &sql, [])
    }

    fn settings(&self, object: &ConfigObject) -> Result<Properties> {
        let stored = self.stored_settings(object)?;
        let hook = match object.kind() {
            ObjectType::Job => object.get_str("job_class").and_then(JobHook::for_class),
            _ => None,
        };
        match hook {
            Some(hook) => {
                debug!(job = %object.name(), ?hook, "computing job settings");
                hook.export_settings(&stored, |id| self.name_of(ObjectType::SyncRule, id))
            }
            None => Ok(stored),
        }
    }

    fn plain_object(
        &self,
        object: &ConfigObject,
        resolved: bool,
        skip_defaults: bool,
    ) -> Result<Properties> {
        let plain = if object.is_detached() {
            object.properties().clone()
        } else if resolved {
            self.plain_resolved(object)?
        } else {
            self.plain_unresolved(object)?
        };

        Ok(if skip_defaults {
            strip_defaults(plain)
        } else {
            plain
        })
    }

    fn datalist_entries(&self, list: &ConfigObject) -> Result<Vec<ConfigObject>> {
        let Some(id) = list.id() else {
            return Ok(Vec::new());
        };
        self.select_objects(
            ObjectType::DatalistEntry,
            "SELECT * FROM director_datalist_entry WHERE list_id = ?1 ORDER BY entry_name",
            [id],
        )
    }

    fn datalist_name(&self, id: i64) -> Result<String> {
        self.name_of(ObjectType::Datalist, id)
    }

    fn datafield_category_name(&self, id: i64) -> Result<String> {
        self.name_of(ObjectType::DatafieldCategory, id)
    }

    fn row_modifiers(&self, source: &ConfigObject) -> Result<Vec<ConfigObject>> {
        let Some(id) = source.id() else {
            return Ok(Vec::new());
        };
        self.select_objects(
            ObjectType::ImportRowModifier,
            "SELECT * FROM import_row_modifier WHERE source_id = ?1 ORDER BY priority, id",
            [id],
        )
    }

    fn sync_properties(&self, rule: &ConfigObject) -> Result<Vec<Properties>> {
        let Some(id) = rule.id() else {
            return Ok(Vec::new());
        };
        self.select(
            "SELECT * FROM sync_property WHERE rule_id = ?1 ORDER BY priority, id",
            [id],
        )
    }

    fn import_source_names(&self) -> Result<BTreeMap<i64, String>> {
        let mut stmt = self.conn.prepare("SELECT id, source_name FROM import_source")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;
        let names = rows.collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
        Ok(names)
    }

    fn timeperiod_name(&self, id: i64) -> Result<String> {
        self.name_of(ObjectType::Timeperiod, id)
    }

    fn template_name(&self, kind: ObjectType, id: i64) -> Result<String> {
        let sql = format!(
            "SELECT object_name FROM {} WHERE id = ?1 AND object_type = 'template'",
            kind.table()
        );
        self.conn
            .query_row(&sql, [id], |row| row.get::<_, String>(0))
            .optional()?
            .ok_or_else(|| Error::not_found(kind, id))
    }

    fn template_choice_members(&self, choice: &ConfigObject) -> Result<Vec<String>> {
        let (Some(target), Some(id)) = (choice.kind().choice_target(), choice.id()) else {
            return Ok(Vec::new());
        };
        let sql = format!(
            "SELECT object_name FROM {} WHERE template_choice_id = ?1 AND object_type = 'template'
             ORDER BY object_name",
            target.table()
        );
        self.select_names(&sql, [id])
    }

    fn service_set_services(&self, set: &ConfigObject) -> Result<Vec<ConfigObject>> {
        let Some(id) = set.id() else {
            return Ok(Vec::new());
        };
        self.select_objects(
            ObjectType::Service,
            "SELECT * FROM icinga_service WHERE service_set_id = ?1 ORDER BY object_name, id",
            [id],
        )
    }

    fn host_service_sets(&self, host: &ConfigObject) -> Result<Vec<ConfigObject>> {
        let Some(id) = host.id() else {
            return Ok(Vec::new());
        };
        self.select_objects(
            ObjectType::ServiceSet,
            "SELECT p.* FROM icinga_service_set p
             JOIN icinga_service_set_inheritance i ON i.parent_id = p.id
             JOIN icinga_service_set s ON s.id = i.object_id
             WHERE s.host_id = ?1
             ORDER BY p.object_name, p.id",
            [id],
        )
    }

    fn applied_service_sets(&self, host: &ConfigObject) -> Result<Vec<ConfigObject>> {
        let context = self.host_context(host)?;
        let candidates = self.select_objects(
            ObjectType::ServiceSet,
            "SELECT * FROM icinga_service_set
             WHERE host_id IS NULL AND assign_filter IS NOT NULL
             ORDER BY object_name, id",
            [],
        )?;

        let mut applied = Vec::new();
        for set in candidates {
            if self.assigned(set.get("assign_filter"), &context)? {
                applied.push(set);
            }
        }
        Ok(applied)
    }

    fn service_rows(&self, query: &ServiceQuery) -> Result<Vec<ServiceRow>> {
        let (limit, offset) = sql_limit(query);
        let rows = match &query.source {
            ServiceSource::Host(host) => {
                let Some(id) = host.id() else {
                    return Ok(Vec::new());
                };
                self.select(
                    "SELECT uuid, object_name FROM icinga_service
                     WHERE host_id = ?1
                       AND (?2 IS NULL OR id NOT IN (
                           SELECT b.service_id FROM icinga_host_service_blacklist b
                           JOIN icinga_host h ON h.id = b.host_id
                           WHERE h.object_name = ?2))
                     ORDER BY object_name, id
                     LIMIT ?3 OFFSET ?4",
                    rusqlite::params![id, query.inherited_by, limit, offset],
                )?
            }
            ServiceSource::ServiceSet(set) => {
                let Some(id) = set.id() else {
                    return Ok(Vec::new());
                };
                self.select(
                    "SELECT uuid, object_name FROM icinga_service
                     WHERE service_set_id = ?1
                       AND (?2 IS NULL OR id NOT IN (
                           SELECT b.service_id FROM icinga_host_service_blacklist b
                           JOIN icinga_host h ON h.id = b.host_id
                           WHERE h.object_name = ?2))
                     ORDER BY object_name, id
                     LIMIT ?3 OFFSET ?4",
                    rusqlite::params![id, query.affected_host, limit, offset],
                )?
            }
            ServiceSource::AppliedToHost(host) => {
                let context = self.host_context(host)?;
                let candidates = self.select(
                    "SELECT uuid, object_name, assign_filter FROM icinga_service
                     WHERE object_type = 'apply' AND service_set_id IS NULL
                       AND assign_filter IS NOT NULL
                     ORDER BY object_name, id",
                    [],
                )?;
                let mut matching = Vec::new();
                for row in candidates {
                    if self.assigned(row.get("assign_filter"), &context)? {
                        matching.push(row);
                    }
                }
                let skip = usize::try_from(offset).unwrap_or(0);
                let take = usize::try_from(limit).unwrap_or(usize::MAX);
                matching.into_iter().skip(skip).take(take).collect()
            }
        };

        rows.iter().map(service_row).collect()
    }
}
