//! JSONL snapshots of a configuration database.
//!
//! A snapshot directory holds one `<type>.jsonl` file per object type and a
//! `manifest.json` describing the run, meant to be committed to git.
//!
//! # Snapshot Mode
//!
//! Each file represents the current state of every top-level object of its
//! type, not a log of changes. Git tracks the history. Record files carry no
//! timestamps, so exporting an unchanged database twice produces
//! byte-identical files.
//!
//! # Safety Checks
//!
//! Before overwriting, the writer checks for records that would be lost
//! (present in a file but no longer exported). Use `--force` to override.
//!
//! # Submodules
//!
//! - [`types`] - Record, stats and error types
//! - [`file`] - Atomic file operations
//! - [`hash`] - Content hashing for change detection
//! - [`writer`] - Snapshot writing
//! - [`status`] - Comparison of the database against existing files

pub mod file;
pub mod hash;
pub mod status;
pub mod types;
pub mod writer;

pub use hash::{content_hash, has_changed};
pub use status::{print_status, snapshot_status, SnapshotStatus, TypeStatus};
pub use types::{Manifest, SnapshotError, SnapshotRecord, SnapshotResult, SnapshotStats};
pub use writer::SnapshotWriter;
