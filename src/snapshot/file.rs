//! Atomic file operations for snapshots.
//!
//! Writes go to a temporary file that is synced to disk and then renamed
//! over the target, so a crash never leaves a half-written snapshot file.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::model::ObjectType;
use crate::snapshot::types::{SnapshotError, SnapshotRecord, SnapshotResult};

/// Name of the per-run manifest file.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Snapshot file of an object type.
#[must_use]
pub fn snapshot_path(dir: &Path, kind: ObjectType) -> PathBuf {
    dir.join(format!("{}.jsonl", kind.as_str()))
}

/// Write content to a file atomically.
///
/// This function:
/// 1. Writes content to a temporary file (the target path plus `.tmp`)
/// 2. Calls `fsync` to ensure data is on disk
/// 3. Atomically renames the temp file to the target path
///
/// If any step fails, the original file (if any) remains untouched.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &str) -> SnapshotResult<()> {
    let mut temp_name = OsString::from(path.as_os_str());
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Write records to a JSONL file atomically, one record per line.
///
/// # Errors
///
/// Returns an error if a record cannot be serialized or the file written.
pub fn write_jsonl(path: &Path, records: &[SnapshotRecord]) -> SnapshotResult<()> {
    let mut content = String::new();
    for record in records {
        let line = serde_json::to_string(record)?;
        content.push_str(&line);
        content.push('\n');
    }
    atomic_write(path, &content)
}

/// Read all records from a JSONL file.
///
/// Blank lines are skipped. Invalid lines cause an error with the line
/// number for debugging.
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist or cannot be opened
/// - Any line cannot be parsed as a `SnapshotRecord`
pub fn read_jsonl(path: &Path) -> SnapshotResult<Vec<SnapshotRecord>> {
    if !path.exists() {
        return Err(SnapshotError::FileNotFound(path.display().to_string()));
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        let record: SnapshotRecord =
            serde_json::from_str(&line).map_err(|e| SnapshotError::InvalidRecord {
                line: line_num + 1,
                message: e.to_string(),
            })?;
        records.push(record);
    }

    Ok(records)
}

/// Generate .gitignore content for a snapshot directory.
///
/// Uses a whitelist pattern: ignore everything by default, then explicitly
/// include the snapshot files and the manifest.
#[must_use]
pub fn gitignore_content() -> &'static str {
    r"# director-snapshot directory
# Whitelist pattern: ignore everything except snapshot files

# Ignore everything by default
*

# Allow .gitignore itself
!.gitignore

# Allow snapshot files and the run manifest
!*.jsonl
!manifest.json
!export.json
"
}

/// Ensure .gitignore exists in the snapshot directory.
///
/// An existing file is left alone.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn ensure_gitignore(dir: &Path) -> SnapshotResult<()> {
    let gitignore_path = dir.join(".gitignore");

    if gitignore_path.exists() {
        return Ok(());
    }

    fs::create_dir_all(dir)?;

    let mut file = File::create(&gitignore_path)?;
    file.write_all(gitignore_content().as_bytes())?;
    file.sync_all()?;

    Ok(())
}
