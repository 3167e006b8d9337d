//! Snapshot status.
//!
//! Compares what a snapshot run would write now against the files already
//! in the snapshot directory, without touching them.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use colored::Colorize;
use serde::Serialize;

use crate::model::ObjectType;
use crate::repository::{ConfigRepository, FieldReferenceLoader};
use crate::snapshot::file::{read_jsonl, snapshot_path, MANIFEST_FILE};
use crate::snapshot::hash::has_changed;
use crate::snapshot::types::{Manifest, SnapshotResult, SnapshotStats};
use crate::snapshot::writer::SnapshotWriter;

/// Differences for one object type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeStatus {
    #[serde(rename = "type")]
    pub kind: ObjectType,
    /// Keys exported now but absent from the file.
    pub new: Vec<String>,
    /// Keys whose content hash differs.
    pub changed: Vec<String>,
    pub unchanged: usize,
    /// Keys in the file that would no longer be exported.
    pub removed: Vec<String>,
}

impl TypeStatus {
    /// Whether writing would change this type's file.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !(self.new.is_empty() && self.changed.is_empty() && self.removed.is_empty())
    }
}

/// Result of comparing the database against a snapshot directory.
#[derive(Debug, Serialize)]
pub struct SnapshotStatus {
    pub output_dir: PathBuf,
    /// Time of the last snapshot run, from the manifest.
    pub exported_at: Option<String>,
    /// Types with objects or an existing file, in snapshot order.
    pub types: Vec<TypeStatus>,
    /// Objects that currently fail to export.
    pub failed: usize,
    pub errors: Vec<String>,
}

impl SnapshotStatus {
    /// Whether a snapshot run would change any file.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.types.iter().any(TypeStatus::is_dirty)
    }
}

/// Compare the current export against the files written by `writer`.
///
/// # Errors
///
/// Returns an error if objects cannot be loaded or an existing snapshot file
/// cannot be read.
pub fn snapshot_status<R>(writer: &SnapshotWriter<'_, R>) -> SnapshotResult<SnapshotStatus>
where
    R: ConfigRepository + FieldReferenceLoader + ?Sized,
{
    let dir = writer.output_dir();
    let mut stats = SnapshotStats::default();
    let mut types = Vec::new();

    for kind in ObjectType::SNAPSHOT {
        let records = writer.collect(kind, &mut stats)?;
        let path = snapshot_path(dir, kind);

        let mut stored: HashMap<String, String> = if path.exists() {
            read_jsonl(&path)?
                .into_iter()
                .map(|r| (r.key, r.content_hash))
                .collect()
        } else if records.is_empty() {
            continue;
        } else {
            HashMap::new()
        };

        let mut status = TypeStatus {
            kind,
            new: Vec::new(),
            changed: Vec::new(),
            unchanged: 0,
            removed: Vec::new(),
        };

        for record in records {
            let previous = stored.remove(&record.key);
            if previous.is_none() {
                status.new.push(record.key);
            } else if has_changed(&record.content_hash, previous.as_deref()) {
                status.changed.push(record.key);
            } else {
                status.unchanged += 1;
            }
        }

        status.removed = stored.into_keys().collect();
        status.removed.sort();
        types.push(status);
    }

    let exported_at = fs::read_to_string(dir.join(MANIFEST_FILE))
        .ok()
        .and_then(|content| serde_json::from_str::<Manifest>(&content).ok())
        .map(|manifest| manifest.exported_at);

    Ok(SnapshotStatus {
        output_dir: dir.to_path_buf(),
        exported_at,
        types,
        failed: stats.failed,
        errors: stats.errors,
    })
}

/// Print snapshot status to stdout in a human-readable format.
pub fn print_status(status: &SnapshotStatus) {
    println!("{}", "Snapshot Status".bold().underline());
    println!();
    println!("Directory: {}", status.output_dir.display());
    match &status.exported_at {
        Some(at) => println!("Last run:  {at}"),
        None => println!("Last run:  {}", "never".dimmed()),
    }
    println!();

    for type_status in &status.types {
        let label = format!("{:<24}", type_status.kind.as_str());
        if !type_status.is_dirty() {
            println!(
                "  {} {}",
                label,
                format!("{} unchanged", type_status.unchanged).dimmed()
            );
            continue;
        }

        let mut parts = Vec::new();
        if !type_status.new.is_empty() {
            parts.push(format!("+{} new", type_status.new.len()).green().to_string());
        }
        if !type_status.changed.is_empty() {
            parts.push(
                format!("~{} changed", type_status.changed.len())
                    .yellow()
                    .to_string(),
            );
        }
        if !type_status.removed.is_empty() {
            parts.push(
                format!("-{} removed", type_status.removed.len())
                    .red()
                    .to_string(),
            );
        }
        parts.push(format!("{} unchanged", type_status.unchanged));
        println!("  {} {}", label.bold(), parts.join(", "));
    }

    if status.failed > 0 {
        println!();
        println!("{}", format!("Failing exports ({}):", status.failed).red().bold());
        for error in &status.errors {
            println!("  {error}");
        }
    }

    println!();
    if status.is_dirty() {
        println!(
            "{}",
            "Run `dsnap snapshot write` to update the snapshot.".yellow()
        );
        if status.types.iter().any(|t| !t.removed.is_empty()) {
            println!(
                "{}",
                "Removed records require `--force`.".dimmed()
            );
        }
    } else {
        println!("{}", "Snapshot is up to date.".green());
    }
}
