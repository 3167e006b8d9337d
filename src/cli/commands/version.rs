//! Version command implementation.

use serde::Serialize;

use crate::error::Result;
use crate::storage::schema::CURRENT_SCHEMA_VERSION;

#[derive(Serialize)]
struct VersionOutput<'a> {
    version: &'a str,
    schema_version: i32,
    build: &'a str,
}

/// Print the crate version, the database schema version and the build kind.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(json: bool) -> Result<()> {
    let output = VersionOutput {
        version: env!("CARGO_PKG_VERSION"),
        schema_version: CURRENT_SCHEMA_VERSION,
        build: if cfg!(debug_assertions) { "dev" } else { "release" },
    };

    if json {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!(
            "dsnap {} (schema {}, {})",
            output.version, output.schema_version, output.build
        );
    }
    Ok(())
}
