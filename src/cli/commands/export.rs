//! Single object export.

use std::path::PathBuf;

use tracing::debug;

use crate::cli::ExportArgs;
use crate::error::Result;
use crate::export::Exporter;
use crate::repository::ConfigRepository;

use super::open_repository;

/// Print the canonical export tree of one object.
///
/// The tree is pretty-printed on a terminal and written on a single line in
/// JSON mode.
///
/// # Errors
///
/// Returns an error if the object cannot be loaded or exported.
pub fn execute(args: &ExportArgs, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let repo = open_repository(db_path)?;
    let object = repo.load(args.kind, &args.key)?;
    debug!(kind = %args.kind, key = %args.key, "loaded object");

    let tree = Exporter::with_options(&repo, args.flags.to_options()).export(&object)?;

    let output = if json {
        serde_json::to_string(&tree)?
    } else {
        serde_json::to_string_pretty(&tree)?
    };
    println!("{output}");

    Ok(())
}
