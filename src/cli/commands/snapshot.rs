//! Snapshot command implementations.
//!
//! Both commands combine the `export.json` defaults of the snapshot
//! directory with the flags given on the command line.

use std::path::{Path, PathBuf};

use crate::cli::{ExportFlags, SnapshotCommands};
use crate::config::{load_export_options, resolve_snapshot_dir};
use crate::error::Result;
use crate::export::ExportOptions;
use crate::snapshot::{print_status, snapshot_status, SnapshotWriter};

use super::open_repository;

/// Execute snapshot commands.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the snapshot fails.
pub fn execute(command: &SnapshotCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    match command {
        SnapshotCommands::Write {
            output_dir,
            force,
            flags,
        } => write(output_dir.as_deref(), *force, flags, db_path, json),
        SnapshotCommands::Status { output_dir, flags } => {
            status(output_dir.as_deref(), flags, db_path, json)
        }
    }
}

fn options_for(dir: &Path, flags: &ExportFlags) -> Result<ExportOptions> {
    Ok(load_export_options(dir)?.merged(&flags.to_options()))
}

fn write(
    output_dir: Option<&Path>,
    force: bool,
    flags: &ExportFlags,
    db_path: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let repo = open_repository(db_path)?;
    let dir = resolve_snapshot_dir(output_dir);
    let options = options_for(&dir, flags)?;

    let stats = SnapshotWriter::new(&repo, &dir, options).write(force)?;

    if json {
        let output = serde_json::json!({
            "success": true,
            "output_dir": dir.display().to_string(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if stats.is_empty() {
        println!("No records exported.");
    } else {
        println!("Snapshot written to {}", dir.display());
        println!();
        for (kind, count) in &stats.counts {
            println!("  {:<24} {count}", kind.as_str());
        }
        println!();
        println!("  Total: {} records", stats.total());
    }

    if stats.failed > 0 {
        println!();
        println!("  Skipped {} object(s) that failed to export:", stats.failed);
        for error in &stats.errors {
            println!("    {error}");
        }
    }

    Ok(())
}

fn status(
    output_dir: Option<&Path>,
    flags: &ExportFlags,
    db_path: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let repo = open_repository(db_path)?;
    let dir = resolve_snapshot_dir(output_dir);
    let options = options_for(&dir, flags)?;

    let writer = SnapshotWriter::new(&repo, &dir, options);
    let status = snapshot_status(&writer)?;

    if json {
        println!("{}", serde_json::to_string(&status)?);
    } else {
        print_status(&status);
    }

    Ok(())
}
