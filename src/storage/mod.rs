//! SQLite storage layer.
//!
//! # Submodules
//!
//! - [`schema`] - Database schema definitions
//! - [`sqlite`] - The repository implementation
//! - [`assign`] - Assign filter parsing and evaluation
//! - [`hooks`] - Computed job settings

pub mod assign;
pub mod hooks;
pub mod schema;
pub mod sqlite;

#[cfg(test)]
pub(crate) mod fixtures;

pub use sqlite::SqliteRepository;
