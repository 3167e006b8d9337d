//! Configuration management.
//!
//! Resolves the database path and the snapshot directory, and loads the
//! default export options a snapshot directory may carry.
//!
//! # Layout
//!
//! - **Database**: `~/.director-snapshot/director.db` unless overridden
//! - **Snapshots**: `./director-snapshot/`, one JSONL file per object type,
//!   plus an optional `export.json` with default [`ExportOptions`]

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::export::ExportOptions;

/// Environment variable naming the database file.
pub const DB_ENV: &str = "DIRECTOR_SNAPSHOT_DB";

/// Default snapshot directory, relative to the working directory.
pub const DEFAULT_SNAPSHOT_DIR: &str = "director-snapshot";

/// File in the snapshot directory holding default export options.
pub const EXPORT_OPTIONS_FILE: &str = "export.json";

/// Get the global director-snapshot directory location (`~/.director-snapshot/`).
#[must_use]
pub fn global_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".director-snapshot"))
}

/// Resolve the database path.
///
/// Priority:
/// 1. If `explicit_path` is provided (`--db` or `DSNAP_DB`), use it directly
/// 2. `DIRECTOR_SNAPSHOT_DB` environment variable
/// 3. Global location: `~/.director-snapshot/director.db`
///
/// # Returns
///
/// Returns the path to the database file, or `None` if no location found.
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if let Ok(db_path) = std::env::var(DB_ENV) {
        if !db_path.trim().is_empty() {
            return Some(PathBuf::from(db_path));
        }
    }

    global_dir().map(|dir| dir.join("director.db"))
}

/// Resolve the snapshot directory: the explicit one, or the default below
/// the working directory.
#[must_use]
pub fn resolve_snapshot_dir(explicit_dir: Option<&Path>) -> PathBuf {
    explicit_dir.map_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_DIR), Path::to_path_buf)
}

/// Load the default export options of a snapshot directory.
///
/// A missing `export.json` yields the defaults; keys it leaves out keep
/// their defaults too.
///
/// # Errors
///
/// Returns `Config` if the file exists but cannot be read or parsed.
pub fn load_export_options(snapshot_dir: &Path) -> Result<ExportOptions> {
    let path = snapshot_dir.join(EXPORT_OPTIONS_FILE);
    if !path.exists() {
        return Ok(ExportOptions::default());
    }

    debug!(path = %path.display(), "loading export options");
    let content = fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid {}: {e}", path.display())))
}
