//! Seed data shared by repository and exporter tests.

use crate::storage::SqliteRepository;

pub const SERVICE_PING: &str = "6f1c2a1e-0d3b-4c1e-9b7a-000000000001";

/// A small but complete configuration:
///
/// - host templates `generic-host` <- `linux-host`, objects `web1` (imports
///   `linux-host`) and `db1`
/// - direct, template, set, applied-set and apply-rule services around `web1`
/// - automation: an import source with modifiers, a sync rule with
///   properties, a sync job and a housekeeping job
/// - a datalist with one entry pending removal, two datafields
pub const SEED_SQL: &str = r#"
INSERT INTO icinga_zone (id, uuid, object_name, is_global) VALUES
    (1, 'a1b2c3d4-0000-4000-8000-000000000001', 'master', 'n'),
    (2, 'a1b2c3d4-0000-4000-8000-000000000002', 'satellite', 'n');
UPDATE icinga_zone SET parent_id = 1 WHERE id = 2;

INSERT INTO icinga_timeperiod (id, uuid, object_name, display_name, zone_id) VALUES
    (1, 'a1b2c3d4-0000-4000-8000-000000000101', '24x7', 'Always', 1);

INSERT INTO icinga_command (id, uuid, object_name, methods_execute, command, timeout) VALUES
    (1, 'a1b2c3d4-0000-4000-8000-000000000201', 'check-host-alive', 'PluginCheck', 'check_ping', 30),
    (2, 'a1b2c3d4-0000-4000-8000-000000000202', 'check-http', 'PluginCheck', 'check_http', NULL);

INSERT INTO icinga_command_argument
    (command_id, argument_name, argument_value, sort_order, skip_key, required) VALUES
    (2, '-u', '$http_uri$', 2, NULL, 'y'),
    (2, '-H', '$address$', 1, 'n', NULL);

INSERT INTO icinga_host_template_choice
    (id, uuid, object_name, min_required, max_allowed, required_template_id) VALUES
    (1, 'a1b2c3d4-0000-4000-8000-000000000301', 'os-choice', 0, 1, 1);

INSERT INTO icinga_host
    (id, uuid, object_name, object_type, address, check_command_id, max_check_attempts,
     check_interval, zone_id, template_choice_id, enable_notifications) VALUES
    (1, 'a1b2c3d4-0000-4000-8000-000000000401', 'generic-host', 'template', NULL, 1, 3, '1m', 1, NULL, NULL),
    (2, 'a1b2c3d4-0000-4000-8000-000000000402', 'linux-host', 'template', NULL, NULL, NULL, NULL, NULL, 1, NULL),
    (3, 'a1b2c3d4-0000-4000-8000-000000000403', 'web1', 'object', '10.0.0.1', NULL, NULL, NULL, 1, NULL, 'y'),
    (4, 'a1b2c3d4-0000-4000-8000-000000000404', 'db1', 'object', '10.0.0.2', NULL, NULL, NULL, 1, NULL, NULL);

INSERT INTO icinga_host_inheritance (object_id, parent_id, weight) VALUES
    (2, 1, 1),
    (3, 2, 1);

INSERT INTO icinga_host_var (object_id, varname, varvalue, format) VALUES
    (1, 'os', 'Linux', 'string'),
    (3, 'env', 'prod', 'string'),
    (3, 'roles', '["web"]', 'json');

INSERT INTO director_datafield_category (id, category_name, description) VALUES
    (1, 'Web', NULL);

INSERT INTO director_datalist (id, list_name, owner) VALUES
    (1, 'os-list', 'admin'),
    (2, 'empty-list', 'admin');

INSERT INTO director_datalist_entry (list_id, entry_name, entry_value, format, pending_removal) VALUES
    (1, 'c', 'Charlie', 'string', 'n'),
    (1, 'b', 'Bravo', 'string', 'y'),
    (1, 'a', 'Alpha', 'string', 'n');

INSERT INTO director_datafield (id, varname, caption, description, datatype, format, category_id) VALUES
    (1, 'os', 'Operating system', NULL, 'Icinga\Module\Director\DataType\DataTypeDatalist', NULL, 1),
    (2, 'http_uri', 'URI', NULL, 'Icinga\Module\Director\DataType\DataTypeString', NULL, NULL);

INSERT INTO director_datafield_setting (datafield_id, setting_name, setting_value) VALUES
    (1, 'datalist_id', '1'),
    (1, 'behavior', 'strict');

INSERT INTO icinga_host_field (object_id, datafield_id, is_required, var_filter) VALUES
    (3, 1, 'y', NULL),
    (1, 2, 'n', NULL);

INSERT INTO icinga_service_set (id, uuid, object_name, object_type, host_id, assign_filter) VALUES
    (1, 'a1b2c3d4-0000-4000-8000-000000000501', 'linux-basics', 'template', NULL, NULL),
    (2, 'a1b2c3d4-0000-4000-8000-000000000502', 'web1-basics', 'object', 3, NULL),
    (3, 'a1b2c3d4-0000-4000-8000-000000000503', 'web-checks', 'template', NULL, 'host.vars.env=%22prod%22');

INSERT INTO icinga_service_set_inheritance (object_id, parent_id, weight) VALUES
    (2, 1, 1);

INSERT INTO icinga_service
    (id, uuid, object_name, object_type, host_id, service_set_id, check_command_id,
     max_check_attempts, check_interval, assign_filter) VALUES
    (1, '6f1c2a1e-0d3b-4c1e-9b7a-000000000001', 'ping', 'object', 3, NULL, 1, NULL, NULL, NULL),
    (2, '6f1c2a1e-0d3b-4c1e-9b7a-000000000002', 'generic-service', 'template', NULL, NULL, NULL, 5, '5m', NULL),
    (3, '6f1c2a1e-0d3b-4c1e-9b7a-000000000003', 'ssh', 'object', 1, NULL, NULL, NULL, NULL, NULL),
    (4, '6f1c2a1e-0d3b-4c1e-9b7a-000000000004', 'load', 'object', NULL, 1, NULL, NULL, NULL, NULL),
    (5, '6f1c2a1e-0d3b-4c1e-9b7a-000000000005', 'users', 'object', NULL, 1, NULL, NULL, NULL, NULL),
    (6, '6f1c2a1e-0d3b-4c1e-9b7a-000000000006', 'http', 'object', NULL, 3, 2, NULL, NULL, NULL),
    (7, '6f1c2a1e-0d3b-4c1e-9b7a-000000000007', 'ntp', 'apply', NULL, NULL, NULL, NULL, NULL, 'host.templates=linux-host'),
    (8, '6f1c2a1e-0d3b-4c1e-9b7a-000000000008', 'mysql', 'apply', NULL, NULL, NULL, NULL, NULL, 'host.name=db*'),
    (9, '6f1c2a1e-0d3b-4c1e-9b7a-000000000009', 'swap', 'object', 2, NULL, NULL, NULL, NULL, NULL);

INSERT INTO icinga_service_inheritance (object_id, parent_id, weight) VALUES
    (3, 2, 1),
    (4, 2, 1);

INSERT INTO icinga_service_var (object_id, varname, varvalue, format) VALUES
    (4, 'load_warning', '5', 'string');

INSERT INTO icinga_host_service_blacklist (host_id, service_id) VALUES
    (3, 5);

INSERT INTO icinga_hostgroup (id, uuid, object_name, display_name, assign_filter) VALUES
    (1, 'a1b2c3d4-0000-4000-8000-000000000601', 'linux-servers', 'Linux servers', 'host.vars.os=Linux');

INSERT INTO icinga_user (id, uuid, object_name, email, period_id) VALUES
    (1, 'a1b2c3d4-0000-4000-8000-000000000701', 'ops', 'ops@example.com', 1);

INSERT INTO import_source
    (id, source_name, key_column, provider_class, import_state, last_error_message, last_attempt) VALUES
    (1, 'cmdb', 'host', 'Icinga\Module\Director\Import\ImportSourceSql', 'in-sync', NULL, '2026-01-01 00:00:00'),
    (5, 'ldap-import', 'cn', 'Icinga\Module\Director\Import\ImportSourceLdap', 'unknown', 'timeout', NULL);

INSERT INTO import_source_setting (source_id, setting_name, setting_value) VALUES
    (1, 'resource', 'cmdb-db'),
    (1, 'query', 'SELECT * FROM hosts');

INSERT INTO import_row_modifier
    (id, source_id, property_name, target_property, provider_class, priority) VALUES
    (1, 1, 'host', NULL, 'Icinga\Module\Director\PropertyModifier\PropertyModifierLowercase', 2),
    (2, 1, 'os', 'os_list', 'Icinga\Module\Director\PropertyModifier\PropertyModifierSplit', 1);

INSERT INTO import_row_modifier_setting (row_modifier_id, setting_name, setting_value) VALUES
    (2, 'delimiter', ','),
    (2, 'when_empty', NULL);

INSERT INTO sync_rule
    (id, rule_name, object_type, update_policy, sync_state, last_error_message, last_attempt) VALUES
    (1, 'hosts from cmdb', 'host', 'merge', 'in-sync', NULL, '2026-01-01 00:00:00');

INSERT INTO sync_property
    (id, rule_id, source_id, source_expression, destination_field, priority, merge_policy) VALUES
    (1, 1, 5, '${cn}', 'object_name', 1, NULL),
    (2, 1, 1, '${address}', 'address', 2, 'override');

INSERT INTO director_job
    (id, job_name, job_class, run_interval, timeperiod_id, last_attempt_succeeded, ts_last_attempt) VALUES
    (1, 'sync hosts', 'Icinga\Module\Director\Job\SyncJob', 900, 1, 'y', 1767225600000),
    (2, 'housekeeping', 'Icinga\Module\Director\Job\HousekeepingJob', 3600, NULL, NULL, NULL);

INSERT INTO director_job_setting (job_id, setting_name, setting_value) VALUES
    (1, 'apply_changes', 'y'),
    (1, 'deploy', 'n'),
    (1, 'rule_id', '1'),
    (2, 'mode', 'full');
"#;

/// In-memory repository loaded with [`SEED_SQL`].
pub fn seeded() -> SqliteRepository {
    let repo = SqliteRepository::open_memory().unwrap();
    repo.conn().execute_batch(SEED_SQL).unwrap();
    repo
}
