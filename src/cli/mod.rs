//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::export::ExportOptions;
use crate::model::ObjectType;

pub mod commands;

/// director-snapshot - deterministic exports of Icinga Director configuration
#[derive(Parser, Debug)]
#[command(name = "dsnap", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.director-snapshot/director.db)
    #[arg(long, global = true, env = "DSNAP_DB")]
    pub db: Option<PathBuf>,

    /// Output as JSON (one line, for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database file and schema
    Init {
        /// Recreate an existing database
        #[arg(long)]
        force: bool,
    },

    /// Export one object as a canonical JSON tree
    Export(ExportArgs),

    /// Write or inspect a JSONL snapshot directory
    Snapshot {
        #[command(subcommand)]
        command: SnapshotCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print version information
    Version,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Object type (host, service, service_set, command, job, ...)
    #[arg(value_name = "TYPE")]
    pub kind: ObjectType,

    /// Object name, or numeric id
    pub key: String,

    #[command(flatten)]
    pub flags: ExportFlags,
}

/// Switches shared by every exporting command.
#[derive(Args, Debug, Clone, Default)]
pub struct ExportFlags {
    /// Attach services assigned directly to hosts
    #[arg(long)]
    pub host_services: bool,

    /// Attach every service visible on hosts (templates, sets, apply rules)
    #[arg(long)]
    pub all_host_services: bool,

    /// Keep null-valued properties
    #[arg(long)]
    pub show_defaults: bool,

    /// Keep internal ids
    #[arg(long)]
    pub show_ids: bool,

    /// Flatten inherited properties into objects
    #[arg(long)]
    pub resolve: bool,

    /// Only export these top-level properties (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub properties: Option<Vec<String>>,
}

impl ExportFlags {
    #[must_use]
    pub fn to_options(&self) -> ExportOptions {
        ExportOptions {
            include_host_services: self.host_services,
            resolve_all_host_services: self.all_host_services,
            show_defaults: self.show_defaults,
            show_ids: self.show_ids,
            resolve_objects: self.resolve,
            properties: self.properties.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum SnapshotCommands {
    /// Export every object into the snapshot directory
    Write {
        /// Snapshot directory (default: ./director-snapshot)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Overwrite even if records would be lost
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        flags: ExportFlags,
    },

    /// Compare the database against the snapshot directory
    Status {
        /// Snapshot directory (default: ./director-snapshot)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        flags: ExportFlags,
    },
}
