//! Create the database.
//!
//! `dsnap init` creates the database file at the resolved path and applies
//! the schema. Data is expected to be loaded by other tools afterwards.

use std::fs;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::resolve_db_path;
use crate::error::{Error, Result};
use crate::storage::SqliteRepository;

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    recreated: bool,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns `AlreadyInitialized` if the database exists and `force` is not
/// set, or an error if the file or schema cannot be created.
pub fn execute(db_path: Option<&PathBuf>, force: bool, json: bool) -> Result<()> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path)).ok_or_else(|| {
        Error::Config("Could not determine the database location".to_string())
    })?;

    let recreated = db_path.exists();
    if recreated && !force {
        return Err(Error::AlreadyInitialized { path: db_path });
    }
    if recreated {
        fs::remove_file(&db_path)?;
    }

    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    SqliteRepository::open(&db_path)?;

    if json {
        let output = InitOutput {
            database: db_path,
            recreated,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Initialized database");
        println!("  Database: {}", db_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_schema() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("director.db");

        execute(Some(&path), false, true).unwrap();

        let repo = SqliteRepository::open(&path).unwrap();
        let count: i64 = repo
            .conn()
            .query_row("SELECT COUNT(*) FROM icinga_host", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_init_refuses_existing_database() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("director.db");

        execute(Some(&path), false, true).unwrap();
        let result = execute(Some(&path), false, true);
        assert!(matches!(result, Err(Error::AlreadyInitialized { .. })));
    }

    #[test]
    fn test_init_force_recreates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("director.db");

        execute(Some(&path), false, true).unwrap();
        SqliteRepository::open(&path)
            .unwrap()
            .conn()
            .execute(
                "INSERT INTO icinga_zone (uuid, object_name) VALUES ('a1b2c3d4-0000-4000-8000-000000000001', 'master')",
                [],
            )
            .unwrap();

        execute(Some(&path), true, true).unwrap();

        let repo = SqliteRepository::open(&path).unwrap();
        let count: i64 = repo
            .conn()
            .query_row("SELECT COUNT(*) FROM icinga_zone", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
