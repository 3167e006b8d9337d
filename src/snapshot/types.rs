//! Snapshot types.
//!
//! Defines the record written per object, the manifest written per run and
//! the error type of file-level snapshot operations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::export::ExportOptions;
use crate::model::ObjectType;

/// One line of a snapshot file.
///
/// Serialized as `{"type":"host","key":"web1","content_hash":"…","object":{…}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Object type, matching the file the record lives in.
    #[serde(rename = "type")]
    pub kind: ObjectType,
    /// Unique key within the type: the object name.
    pub key: String,
    /// SHA256 of the canonical export (for change detection).
    pub content_hash: String,
    /// The canonical export tree.
    pub object: Value,
}

/// Contents of `manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// RFC 3339 timestamp of the run.
    pub exported_at: String,
    /// Options every record was exported with.
    pub options: ExportOptions,
    /// Records written per type.
    #[serde(default)]
    pub counts: BTreeMap<ObjectType, usize>,
}

/// Statistics from a snapshot run.
#[derive(Debug, Default, Serialize)]
pub struct SnapshotStats {
    /// Records written per type.
    pub counts: BTreeMap<ObjectType, usize>,
    /// Objects skipped because their export failed.
    pub failed: usize,
    /// One message per failed object.
    pub errors: Vec<String>,
}

impl SnapshotStats {
    /// Total number of records written.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Check if nothing was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub(crate) fn record_failure(&mut self, kind: ObjectType, name: &str, error: &Error) {
        self.failed += 1;
        self.errors.push(format!("{kind} '{name}': {error}"));
    }
}

/// Errors that can occur during snapshot operations.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Loading or exporting objects failed as a whole.
    #[error(transparent)]
    Export(#[from] Error),

    /// Overwriting would drop records that are no longer exported.
    #[error(
        "Snapshot would lose {count} record(s) from {file}: {preview}\n\
         Hint: use --force to overwrite anyway."
    )]
    RecordsWouldBeLost {
        file: String,
        count: usize,
        preview: String,
    },

    /// File not found.
    #[error("Snapshot file not found: {0}")]
    FileNotFound(String),

    /// Invalid record format in a snapshot file.
    #[error("Invalid record at line {line}: {message}")]
    InvalidRecord { line: usize, message: String },
}

impl From<SnapshotError> for Error {
    fn from(err: SnapshotError) -> Self {
        match err {
            SnapshotError::Io(e) => Self::Io(e),
            SnapshotError::Json(e) => Self::Json(e),
            SnapshotError::Export(e) => e,
            other => Self::Snapshot(other.to_string()),
        }
    }
}

/// Result type for snapshot operations.
pub type SnapshotResult<T> = std::result::Result<T, SnapshotError>;
