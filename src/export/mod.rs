//! The export engine.
//!
//! [`Exporter::export`] turns a [`ConfigObject`](crate::model::ConfigObject)
//! into a canonical [`ExportTree`](crate::model::ExportTree). The remaining
//! modules are the pure passes it chains:
//!
//! - [`filter`] - null stripping, denial and allowlist projection
//! - [`canonical`] - recursive key ordering
//! - [`templates`] - import chain traversal
//! - [`relations`] - services visible on a host

pub mod canonical;
pub mod exporter;
pub mod filter;
pub mod options;
pub mod relations;
pub mod templates;

pub use canonical::canonicalize;
pub use exporter::Exporter;
pub use options::ExportOptions;
pub use relations::{RelationResolver, ResolvedService, ServiceOrigin, ServiceResolution};
