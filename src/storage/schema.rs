//! Database schema definitions.
//!
//! A Director-shaped configuration schema: one table per Icinga object kind
//! with companion tables for imports, custom variables and data fields, plus
//! the Director automation tables (jobs, import sources, sync rules, data
//! lists and data fields).

use rusqlite::{Connection, Result};

/// Current schema version for migration tracking.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Kinds with an `<table>_inheritance` companion table.
pub const INHERITANCE_TABLES: &[&str] = &[
    "icinga_host",
    "icinga_service",
    "icinga_service_set",
    "icinga_command",
    "icinga_timeperiod",
    "icinga_zone",
    "icinga_endpoint",
    "icinga_user",
    "icinga_notification",
    "icinga_hostgroup",
    "icinga_servicegroup",
];

/// Kinds with an `<table>_var` companion table.
pub const VAR_TABLES: &[&str] = &[
    "icinga_host",
    "icinga_service",
    "icinga_service_set",
    "icinga_command",
    "icinga_user",
    "icinga_notification",
];

/// Kinds with an `<table>_field` companion table.
pub const FIELD_TABLES: &[&str] = &[
    "icinga_host",
    "icinga_service",
    "icinga_command",
    "icinga_user",
    "icinga_notification",
];

/// The configuration schema.
///
/// Flags are stored as `'y'`/`'n'` text, custom variable values as text with
/// a `format` of `string` or `json`.
pub const SCHEMA_SQL: &str = r#"
-- ====================
-- Schema Version Tracking
-- ====================

CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at INTEGER NOT NULL
);

-- ====================
-- Icinga Objects
-- ====================

CREATE TABLE IF NOT EXISTS icinga_zone (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT UNIQUE,
    object_name TEXT NOT NULL,
    object_type TEXT NOT NULL DEFAULT 'object'
        CHECK (object_type IN ('object', 'template', 'external_object')),
    disabled TEXT NOT NULL DEFAULT 'n' CHECK (disabled IN ('y', 'n')),
    parent_id INTEGER REFERENCES icinga_zone(id),
    is_global TEXT DEFAULT 'n' CHECK (is_global IN ('y', 'n'))
);

CREATE TABLE IF NOT EXISTS icinga_timeperiod (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT UNIQUE,
    object_name TEXT NOT NULL,
    object_type TEXT NOT NULL DEFAULT 'object'
        CHECK (object_type IN ('object', 'template', 'external_object')),
    disabled TEXT NOT NULL DEFAULT 'n' CHECK (disabled IN ('y', 'n')),
    display_name TEXT,
    update_method TEXT,
    prefer_includes TEXT CHECK (prefer_includes IN ('y', 'n')),
    zone_id INTEGER REFERENCES icinga_zone(id)
);

CREATE TABLE IF NOT EXISTS icinga_endpoint (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT UNIQUE,
    object_name TEXT NOT NULL,
    object_type TEXT NOT NULL DEFAULT 'object'
        CHECK (object_type IN ('object', 'template', 'external_object')),
    disabled TEXT NOT NULL DEFAULT 'n' CHECK (disabled IN ('y', 'n')),
    zone_id INTEGER REFERENCES icinga_zone(id),
    host TEXT,
    port INTEGER,
    log_duration TEXT
);

CREATE TABLE IF NOT EXISTS icinga_command (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT UNIQUE,
    object_name TEXT NOT NULL,
    object_type TEXT NOT NULL DEFAULT 'object'
        CHECK (object_type IN ('object', 'template', 'external_object')),
    disabled TEXT NOT NULL DEFAULT 'n' CHECK (disabled IN ('y', 'n')),
    methods_execute TEXT,
    command TEXT,
    timeout INTEGER,
    zone_id INTEGER REFERENCES icinga_zone(id)
);

CREATE TABLE IF NOT EXISTS icinga_command_argument (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    command_id INTEGER NOT NULL REFERENCES icinga_command(id) ON DELETE CASCADE,
    argument_name TEXT NOT NULL,
    argument_value TEXT,
    argument_format TEXT,
    key_string TEXT,
    description TEXT,
    skip_key TEXT CHECK (skip_key IN ('y', 'n')),
    set_if TEXT,
    sort_order INTEGER,
    repeat_key TEXT CHECK (repeat_key IN ('y', 'n')),
    required TEXT CHECK (required IN ('y', 'n')),
    UNIQUE (command_id, argument_name)
);

CREATE TABLE IF NOT EXISTS icinga_host_template_choice (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT UNIQUE,
    object_name TEXT NOT NULL UNIQUE,
    description TEXT,
    min_required INTEGER NOT NULL DEFAULT 0,
    max_allowed INTEGER NOT NULL DEFAULT 1,
    required_template_id INTEGER
);

CREATE TABLE IF NOT EXISTS icinga_service_template_choice (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT UNIQUE,
    object_name TEXT NOT NULL UNIQUE,
    description TEXT,
    min_required INTEGER NOT NULL DEFAULT 0,
    max_allowed INTEGER NOT NULL DEFAULT 1,
    required_template_id INTEGER
);

CREATE TABLE IF NOT EXISTS icinga_host (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT UNIQUE,
    object_name TEXT NOT NULL,
    object_type TEXT NOT NULL DEFAULT 'object'
        CHECK (object_type IN ('object', 'template', 'external_object')),
    disabled TEXT NOT NULL DEFAULT 'n' CHECK (disabled IN ('y', 'n')),
    display_name TEXT,
    address TEXT,
    address6 TEXT,
    check_command_id INTEGER REFERENCES icinga_command(id),
    max_check_attempts INTEGER,
    check_interval TEXT,
    retry_interval TEXT,
    enable_notifications TEXT CHECK (enable_notifications IN ('y', 'n')),
    enable_active_checks TEXT CHECK (enable_active_checks IN ('y', 'n')),
    zone_id INTEGER REFERENCES icinga_zone(id),
    template_choice_id INTEGER REFERENCES icinga_host_template_choice(id),
    notes TEXT
);

CREATE TABLE IF NOT EXISTS icinga_service_set (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT UNIQUE,
    object_name TEXT NOT NULL,
    object_type TEXT NOT NULL DEFAULT 'template'
        CHECK (object_type IN ('object', 'template', 'external_object')),
    disabled TEXT NOT NULL DEFAULT 'n' CHECK (disabled IN ('y', 'n')),
    host_id INTEGER REFERENCES icinga_host(id) ON DELETE CASCADE,
    description TEXT,
    assign_filter TEXT
);

CREATE TABLE IF NOT EXISTS icinga_service (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT UNIQUE,
    object_name TEXT NOT NULL,
    object_type TEXT NOT NULL DEFAULT 'object'
        CHECK (object_type IN ('object', 'template', 'apply', 'external_object')),
    disabled TEXT NOT NULL DEFAULT 'n' CHECK (disabled IN ('y', 'n')),
    display_name TEXT,
    host_id INTEGER REFERENCES icinga_host(id) ON DELETE CASCADE,
    service_set_id INTEGER REFERENCES icinga_service_set(id) ON DELETE CASCADE,
    check_command_id INTEGER REFERENCES icinga_command(id),
    max_check_attempts INTEGER,
    check_interval TEXT,
    retry_interval TEXT,
    enable_notifications TEXT CHECK (enable_notifications IN ('y', 'n')),
    enable_active_checks TEXT CHECK (enable_active_checks IN ('y', 'n')),
    use_agent TEXT CHECK (use_agent IN ('y', 'n')),
    zone_id INTEGER REFERENCES icinga_zone(id),
    template_choice_id INTEGER REFERENCES icinga_service_template_choice(id),
    assign_filter TEXT,
    apply_for TEXT,
    notes TEXT
);

CREATE INDEX IF NOT EXISTS idx_service_host ON icinga_service(host_id);
CREATE INDEX IF NOT EXISTS idx_service_set ON icinga_service(service_set_id);

CREATE TABLE IF NOT EXISTS icinga_host_service_blacklist (
    host_id INTEGER NOT NULL REFERENCES icinga_host(id) ON DELETE CASCADE,
    service_id INTEGER NOT NULL REFERENCES icinga_service(id) ON DELETE CASCADE,
    PRIMARY KEY (host_id, service_id)
);

CREATE TABLE IF NOT EXISTS icinga_hostgroup (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT UNIQUE,
    object_name TEXT NOT NULL,
    object_type TEXT NOT NULL DEFAULT 'object'
        CHECK (object_type IN ('object', 'template', 'external_object')),
    disabled TEXT NOT NULL DEFAULT 'n' CHECK (disabled IN ('y', 'n')),
    display_name TEXT,
    assign_filter TEXT
);

CREATE TABLE IF NOT EXISTS icinga_servicegroup (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT UNIQUE,
    object_name TEXT NOT NULL,
    object_type TEXT NOT NULL DEFAULT 'object'
        CHECK (object_type IN ('object', 'template', 'external_object')),
    disabled TEXT NOT NULL DEFAULT 'n' CHECK (disabled IN ('y', 'n')),
    display_name TEXT,
    assign_filter TEXT
);

CREATE TABLE IF NOT EXISTS icinga_user (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT UNIQUE,
    object_name TEXT NOT NULL,
    object_type TEXT NOT NULL DEFAULT 'object'
        CHECK (object_type IN ('object', 'template', 'external_object')),
    disabled TEXT NOT NULL DEFAULT 'n' CHECK (disabled IN ('y', 'n')),
    display_name TEXT,
    email TEXT,
    pager TEXT,
    enable_notifications TEXT CHECK (enable_notifications IN ('y', 'n')),
    period_id INTEGER REFERENCES icinga_timeperiod(id),
    zone_id INTEGER REFERENCES icinga_zone(id)
);

CREATE TABLE IF NOT EXISTS icinga_notification (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT UNIQUE,
    object_name TEXT NOT NULL,
    object_type TEXT NOT NULL DEFAULT 'object'
        CHECK (object_type IN ('object', 'template', 'apply', 'external_object')),
    disabled TEXT NOT NULL DEFAULT 'n' CHECK (disabled IN ('y', 'n')),
    apply_to TEXT CHECK (apply_to IN ('host', 'service')),
    host_id INTEGER REFERENCES icinga_host(id) ON DELETE CASCADE,
    service_id INTEGER REFERENCES icinga_service(id) ON DELETE CASCADE,
    command_id INTEGER REFERENCES icinga_command(id),
    period_id INTEGER REFERENCES icinga_timeperiod(id),
    zone_id INTEGER REFERENCES icinga_zone(id),
    notification_interval TEXT,
    times_begin TEXT,
    times_end TEXT,
    assign_filter TEXT
);

-- ====================
-- Director Automation
-- ====================

CREATE TABLE IF NOT EXISTS director_job (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_name TEXT NOT NULL UNIQUE,
    job_class TEXT NOT NULL,
    disabled TEXT NOT NULL DEFAULT 'n' CHECK (disabled IN ('y', 'n')),
    run_interval INTEGER NOT NULL DEFAULT 86400,
    timeperiod_id INTEGER REFERENCES icinga_timeperiod(id),
    last_attempt_succeeded TEXT CHECK (last_attempt_succeeded IN ('y', 'n')),
    last_error_message TEXT,
    ts_last_attempt INTEGER,
    ts_last_error INTEGER
);

CREATE TABLE IF NOT EXISTS director_job_setting (
    job_id INTEGER NOT NULL REFERENCES director_job(id) ON DELETE CASCADE,
    setting_name TEXT NOT NULL,
    setting_value TEXT,
    PRIMARY KEY (job_id, setting_name)
);

CREATE TABLE IF NOT EXISTS import_source (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_name TEXT NOT NULL UNIQUE,
    key_column TEXT NOT NULL,
    provider_class TEXT NOT NULL,
    import_state TEXT NOT NULL DEFAULT 'unknown',
    last_error_message TEXT,
    last_attempt TEXT,
    description TEXT
);

CREATE TABLE IF NOT EXISTS import_source_setting (
    source_id INTEGER NOT NULL REFERENCES import_source(id) ON DELETE CASCADE,
    setting_name TEXT NOT NULL,
    setting_value TEXT,
    PRIMARY KEY (source_id, setting_name)
);

CREATE TABLE IF NOT EXISTS import_row_modifier (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id INTEGER NOT NULL REFERENCES import_source(id) ON DELETE CASCADE,
    property_name TEXT NOT NULL,
    target_property TEXT,
    provider_class TEXT NOT NULL,
    priority INTEGER NOT NULL,
    filter_expression TEXT,
    description TEXT
);

CREATE TABLE IF NOT EXISTS import_row_modifier_setting (
    row_modifier_id INTEGER NOT NULL REFERENCES import_row_modifier(id) ON DELETE CASCADE,
    setting_name TEXT NOT NULL,
    setting_value TEXT,
    PRIMARY KEY (row_modifier_id, setting_name)
);

CREATE TABLE IF NOT EXISTS sync_rule (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    rule_name TEXT NOT NULL UNIQUE,
    object_type TEXT NOT NULL,
    update_policy TEXT NOT NULL,
    purge_existing TEXT NOT NULL DEFAULT 'n' CHECK (purge_existing IN ('y', 'n')),
    purge_action TEXT,
    filter_expression TEXT,
    sync_state TEXT NOT NULL DEFAULT 'unknown',
    last_error_message TEXT,
    last_attempt TEXT,
    description TEXT
);

CREATE TABLE IF NOT EXISTS sync_property (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    rule_id INTEGER NOT NULL REFERENCES sync_rule(id) ON DELETE CASCADE,
    source_id INTEGER,
    source_expression TEXT NOT NULL,
    destination_field TEXT NOT NULL,
    priority INTEGER NOT NULL,
    filter_expression TEXT,
    merge_policy TEXT
);

CREATE TABLE IF NOT EXISTS director_datalist (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    list_name TEXT NOT NULL UNIQUE,
    owner TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS director_datalist_entry (
    list_id INTEGER NOT NULL REFERENCES director_datalist(id) ON DELETE CASCADE,
    entry_name TEXT NOT NULL,
    entry_value TEXT,
    format TEXT,
    allowed_roles TEXT,
    pending_removal TEXT NOT NULL DEFAULT 'n' CHECK (pending_removal IN ('y', 'n')),
    PRIMARY KEY (list_id, entry_name)
);

CREATE TABLE IF NOT EXISTS director_datafield_category (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    category_name TEXT NOT NULL UNIQUE,
    description TEXT
);

CREATE TABLE IF NOT EXISTS director_datafield (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    varname TEXT NOT NULL,
    caption TEXT NOT NULL,
    description TEXT,
    datatype TEXT NOT NULL,
    format TEXT,
    category_id INTEGER
);

CREATE TABLE IF NOT EXISTS director_datafield_setting (
    datafield_id INTEGER NOT NULL REFERENCES director_datafield(id) ON DELETE CASCADE,
    setting_name TEXT NOT NULL,
    setting_value TEXT,
    PRIMARY KEY (datafield_id, setting_name)
);
"#;

/// Companion tables shared by every Icinga object table.
fn companion_sql() -> String {
    let mut sql = String::new();

    for table in INHERITANCE_TABLES {
        sql.push_str(&format!(
            "CREATE TABLE IF NOT EXISTS {table}_inheritance (
                object_id INTEGER NOT NULL REFERENCES {table}(id) ON DELETE CASCADE,
                parent_id INTEGER NOT NULL REFERENCES {table}(id) ON DELETE CASCADE,
                weight INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (object_id, parent_id)
            );\n"
        ));
    }

    for table in VAR_TABLES {
        sql.push_str(&format!(
            "CREATE TABLE IF NOT EXISTS {table}_var (
                object_id INTEGER NOT NULL REFERENCES {table}(id) ON DELETE CASCADE,
                varname TEXT NOT NULL,
                varvalue TEXT,
                format TEXT NOT NULL DEFAULT 'string' CHECK (format IN ('string', 'json')),
                PRIMARY KEY (object_id, varname)
            );\n"
        ));
    }

    for table in FIELD_TABLES {
        sql.push_str(&format!(
            "CREATE TABLE IF NOT EXISTS {table}_field (
                object_id INTEGER NOT NULL REFERENCES {table}(id) ON DELETE CASCADE,
                datafield_id INTEGER NOT NULL REFERENCES director_datafield(id) ON DELETE CASCADE,
                is_required TEXT NOT NULL DEFAULT 'n' CHECK (is_required IN ('y', 'n')),
                var_filter TEXT,
                PRIMARY KEY (object_id, datafield_id)
            );\n"
        ));
    }

    sql
}

/// Apply the schema to a database connection.
///
/// # Errors
///
/// Returns an error if the schema cannot be applied.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute_batch(&companion_sql())?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![
            format!("v{CURRENT_SCHEMA_VERSION}"),
            chrono::Utc::now().timestamp_millis()
        ],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_schema_creates_tables() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        let tables = tables(&conn);
        for expected in [
            "icinga_host",
            "icinga_host_inheritance",
            "icinga_host_var",
            "icinga_host_field",
            "icinga_service_set_var",
            "icinga_command_argument",
            "director_job_setting",
            "director_datalist_entry",
            "sync_property",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing {expected}");
        }
        assert!(!tables.contains(&"icinga_zone_var".to_string()));
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        apply_schema(&conn).expect("First apply failed");
        apply_schema(&conn).expect("Second apply failed");
    }

    #[test]
    fn test_flag_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        let ok = conn.execute(
            "INSERT INTO icinga_zone (object_name, disabled) VALUES ('master', 'n')",
            [],
        );
        assert!(ok.is_ok());

        let bad = conn.execute(
            "INSERT INTO icinga_zone (object_name, disabled) VALUES ('satellite', 'no')",
            [],
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        let fk_enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk_enabled, 1);
    }
}
