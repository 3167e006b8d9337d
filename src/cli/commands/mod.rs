//! Command implementations.

use std::path::PathBuf;

use crate::config::resolve_db_path;
use crate::error::{Error, Result};
use crate::storage::SqliteRepository;

pub mod completions;
pub mod export;
pub mod init;
pub mod snapshot;
pub mod version;

/// Open the configured database, which must already exist.
///
/// # Errors
///
/// `NotInitialized` when no database file is found.
pub fn open_repository(db_path: Option<&PathBuf>) -> Result<SqliteRepository> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path)).ok_or(Error::NotInitialized)?;

    if !db_path.exists() {
        return Err(Error::NotInitialized);
    }

    SqliteRepository::open(&db_path)
}
