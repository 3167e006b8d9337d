//! Error types for director-snapshot.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 3=not_found, 4=validation, etc.)
//! - Retryability flags for scripted callers
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

use crate::model::ObjectType;

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string or on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,

    // Not Found (exit 3)
    ObjectNotFound,
    AmbiguousName,

    // Validation (exit 4)
    InvalidArgument,
    InvalidFilter,

    // Inheritance (exit 5)
    CyclicInheritance,

    // Snapshot (exit 6)
    SnapshotError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Unsupported (exit 9)
    Unsupported,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::ObjectNotFound => "OBJECT_NOT_FOUND",
            Self::AmbiguousName => "AMBIGUOUS_NAME",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::InvalidFilter => "INVALID_FILTER",
            Self::CyclicInheritance => "CYCLIC_INHERITANCE",
            Self::SnapshotError => "SNAPSHOT_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::Unsupported => "UNSUPPORTED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-9).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::AlreadyInitialized | Self::DatabaseError => 2,
            Self::ObjectNotFound | Self::AmbiguousName => 3,
            Self::InvalidArgument | Self::InvalidFilter => 4,
            Self::CyclicInheritance => 5,
            Self::SnapshotError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
            Self::Unsupported => 9,
        }
    }

    /// Whether a caller may succeed by retrying with corrected input.
    ///
    /// Export is read-only, so only input errors qualify; a dangling
    /// reference or a cycle stays broken until the data is fixed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument | Self::AmbiguousName | Self::DatabaseError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur while exporting configuration.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `dsnap init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("{kind} not found: {key}")]
    NotFound { kind: ObjectType, key: String },

    #[error("{kind} name '{name}' is ambiguous ({count} matches)")]
    AmbiguousName {
        kind: ObjectType,
        name: String,
        count: usize,
    },

    #[error("Export not supported: {0}")]
    Unsupported(String),

    #[error("Cyclic inheritance: {kind} '{name}' imports itself")]
    CyclicInheritance { kind: ObjectType, name: String },

    #[error("Invalid assign filter '{filter}': {message}")]
    InvalidFilter { filter: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a dangling or unknown reference.
    pub fn not_found(kind: ObjectType, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::NotFound { .. } => ErrorCode::ObjectNotFound,
            Self::AmbiguousName { .. } => ErrorCode::AmbiguousName,
            Self::Unsupported(_) => ErrorCode::Unsupported,
            Self::CyclicInheritance { .. } => ErrorCode::CyclicInheritance,
            Self::InvalidFilter { .. } => ErrorCode::InvalidFilter,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Snapshot(_) => ErrorCode::SnapshotError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => Some("Run `dsnap init` to create the database".to_string()),

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),

            Self::NotFound { kind, key } => Some(format!(
                "No {kind} '{key}'. A stored reference pointing here is a data integrity problem \
                 and has to be fixed in the database."
            )),

            Self::AmbiguousName { kind, .. } => Some(format!(
                "Several {kind} objects share this name. Pass the numeric id instead."
            )),

            Self::Unsupported(_) => Some(
                "Service sets assigned to a single host are exported as part of that host \
                 (`dsnap export host <name> --all-host-services`)."
                    .to_string(),
            ),

            Self::CyclicInheritance { kind, name } => Some(format!(
                "Remove one of the imports along the template chain of {kind} '{name}'."
            )),

            Self::InvalidFilter { .. } => Some(
                "Assign filters look like host.vars.os=%22Linux%22&host.name=web* \
                 (operators: = != & | ! and parentheses)"
                    .to_string(),
            ),

            Self::InvalidArgument(msg) => {
                if msg.contains("type") {
                    Some(format!(
                        "Valid types: {}",
                        ObjectType::ALL
                            .iter()
                            .map(ObjectType::as_str)
                            .collect::<Vec<_>>()
                            .join(", ")
                    ))
                } else {
                    None
                }
            }

            Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Config(_)
            | Self::Snapshot(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
