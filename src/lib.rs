//! director-snapshot - deterministic exports of Icinga Director configuration
//!
//! Turns configuration objects stored in a Director-shaped database into
//! canonical JSON trees that are stable across runs, suitable for diffing
//! and for committing to git.
//!
//! # Architecture
//!
//! - [`model`] - Object kinds and configuration objects
//! - [`repository`] - Storage traits the export engine reads through
//! - [`export`] - The export engine (enrichment, filtering, relations)
//! - [`storage`] - SQLite implementation of the repository traits
//! - [`snapshot`] - JSONL snapshot directories
//! - [`config`] - Path resolution and default options
//! - [`cli`] - Command-line interface using clap
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod repository;
pub mod snapshot;
pub mod storage;

pub use error::{Error, Result};
