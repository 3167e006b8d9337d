//! End-to-end tests driving the `dsnap` binary against a seeded database.

use std::path::{Path, PathBuf};

use anyhow::Result;
use assert_cmd::Command;
use dsnap::storage::SqliteRepository;
use serde_json::{json, Value};
use tempfile::TempDir;

const SEED_SQL: &str = r"
INSERT INTO icinga_zone (id, uuid, object_name, is_global) VALUES
    (1, 'a1b2c3d4-0000-4000-8000-000000000001', 'master', 'n');

INSERT INTO icinga_command (id, uuid, object_name, methods_execute, command) VALUES
    (1, 'a1b2c3d4-0000-4000-8000-000000000201', 'check-host-alive', 'PluginCheck', 'check_ping');

INSERT INTO icinga_host
    (id, uuid, object_name, object_type, address, check_command_id, max_check_attempts, zone_id) VALUES
    (1, 'a1b2c3d4-0000-4000-8000-000000000401', 'generic-host', 'template', NULL, 1, 3, 1),
    (2, 'a1b2c3d4-0000-4000-8000-000000000402', 'web1', 'object', '10.0.0.1', NULL, NULL, 1);

INSERT INTO icinga_host_inheritance (object_id, parent_id, weight) VALUES (2, 1, 1);

INSERT INTO icinga_host_var (object_id, varname, varvalue, format) VALUES
    (2, 'env', 'prod', 'string');

INSERT INTO icinga_service (id, uuid, object_name, object_type, host_id, check_command_id) VALUES
    (1, '6f1c2a1e-0d3b-4c1e-9b7a-000000000001', 'ping', 'object', 2, 1);
";

struct Fixture {
    dir: TempDir,
    db: PathBuf,
}

impl Fixture {
    fn seeded() -> Result<Self> {
        let dir = TempDir::new()?;
        let db = dir.path().join("director.db");
        let repo = SqliteRepository::open(&db)?;
        repo.conn().execute_batch(SEED_SQL)?;
        Ok(Self { dir, db })
    }

    fn snapshot_dir(&self) -> PathBuf {
        self.dir.path().join("snapshot")
    }

    fn dsnap(&self) -> Result<Command> {
        dsnap_with_db(&self.db)
    }
}

fn dsnap_with_db(db: &Path) -> Result<Command> {
    let mut cmd = Command::cargo_bin("dsnap")?;
    cmd.env_remove("DSNAP_DB")
        .env_remove("DIRECTOR_SNAPSHOT_DB")
        .env_remove("RUST_LOG")
        .arg("--db")
        .arg(db);
    Ok(cmd)
}

fn stdout_json(output: &std::process::Output) -> Result<Value> {
    Ok(serde_json::from_slice(&output.stdout)?)
}

fn stderr_json(output: &std::process::Output) -> Result<Value> {
    Ok(serde_json::from_slice(&output.stderr)?)
}

#[test]
fn export_host_prints_canonical_tree() -> Result<()> {
    let fixture = Fixture::seeded()?;

    let output = fixture
        .dsnap()?
        .args(["--json", "export", "host", "web1"])
        .output()?;

    assert!(output.status.success());
    let tree = stdout_json(&output)?;
    assert_eq!(
        tree,
        json!({
            "address": "10.0.0.1",
            "fields": [],
            "imports": ["generic-host"],
            "object_name": "web1",
            "object_type": "object",
            "vars": {"env": "prod"},
            "zone": "master",
        })
    );
    Ok(())
}

#[test]
fn export_flags_reach_the_exporter() -> Result<()> {
    let fixture = Fixture::seeded()?;

    let output = fixture
        .dsnap()?
        .args([
            "--json",
            "export",
            "host",
            "web1",
            "--resolve",
            "--host-services",
            "--properties",
            "object_name,check_command,services",
        ])
        .output()?;

    assert!(output.status.success());
    let tree = stdout_json(&output)?;
    assert_eq!(tree["check_command"], "check-host-alive");
    assert_eq!(tree["services"][0]["object_name"], "ping");
    assert!(tree.get("zone").is_none());
    Ok(())
}

#[test]
fn missing_object_exits_with_not_found() -> Result<()> {
    let fixture = Fixture::seeded()?;

    let output = fixture
        .dsnap()?
        .args(["--json", "export", "host", "nope"])
        .output()?;

    assert_eq!(output.status.code(), Some(3));
    let error = stderr_json(&output)?;
    assert_eq!(error["error"]["code"], "OBJECT_NOT_FOUND");
    Ok(())
}

#[test]
fn missing_database_exits_with_not_initialized() -> Result<()> {
    let dir = TempDir::new()?;

    let output = dsnap_with_db(&dir.path().join("absent.db"))?
        .args(["--json", "export", "host", "web1"])
        .output()?;

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stderr_json(&output)?["error"]["code"], "NOT_INITIALIZED");
    Ok(())
}

#[test]
fn init_refuses_to_overwrite() -> Result<()> {
    let dir = TempDir::new()?;
    let db = dir.path().join("director.db");

    let first = dsnap_with_db(&db)?.args(["--json", "init"]).output()?;
    assert!(first.status.success());
    assert!(db.exists());

    let second = dsnap_with_db(&db)?.args(["--json", "init"]).output()?;
    assert_eq!(second.status.code(), Some(2));
    assert_eq!(stderr_json(&second)?["error"]["code"], "ALREADY_INITIALIZED");
    Ok(())
}

#[test]
fn snapshot_write_then_status_is_clean() -> Result<()> {
    let fixture = Fixture::seeded()?;
    let snapshot_dir = fixture.snapshot_dir();

    let write = fixture
        .dsnap()?
        .args(["--json", "snapshot", "write", "--output-dir"])
        .arg(&snapshot_dir)
        .output()?;
    assert!(write.status.success());
    let result = stdout_json(&write)?;
    assert_eq!(result["stats"]["counts"]["host"], 2);
    assert!(snapshot_dir.join("host.jsonl").exists());
    assert!(snapshot_dir.join("manifest.json").exists());

    let status = fixture
        .dsnap()?
        .args(["--json", "snapshot", "status", "--output-dir"])
        .arg(&snapshot_dir)
        .output()?;
    assert!(status.status.success());
    let report = stdout_json(&status)?;
    for type_status in report["types"].as_array().into_iter().flatten() {
        assert_eq!(type_status["new"], json!([]));
        assert_eq!(type_status["changed"], json!([]));
        assert_eq!(type_status["removed"], json!([]));
    }
    Ok(())
}

#[test]
fn snapshot_uses_directory_defaults() -> Result<()> {
    let fixture = Fixture::seeded()?;
    let snapshot_dir = fixture.snapshot_dir();
    std::fs::create_dir_all(&snapshot_dir)?;
    std::fs::write(snapshot_dir.join("export.json"), r#"{"show_ids": true}"#)?;

    let write = fixture
        .dsnap()?
        .args(["--json", "snapshot", "write", "--output-dir"])
        .arg(&snapshot_dir)
        .output()?;
    assert!(write.status.success());

    let zones = std::fs::read_to_string(snapshot_dir.join("zone.jsonl"))?;
    let record: Value = serde_json::from_str(zones.lines().next().unwrap_or_default())?;
    assert_eq!(record["object"]["id"], 1);
    Ok(())
}

#[test]
fn version_reports_package_version() -> Result<()> {
    let output = Command::cargo_bin("dsnap")?
        .args(["--json", "version"])
        .output()?;

    assert!(output.status.success());
    let version = stdout_json(&output)?;
    assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));
    Ok(())
}
