//! Data model for configuration export.
//!
//! - [`ObjectType`] - the closed set of configuration object kinds
//! - [`ConfigObject`] - a typed record with a flat property bag
//! - [`FieldReference`] - a custom data field attached to an object
//! - [`ExportTree`] - the ordered value tree produced by export

pub mod object;
pub mod object_type;

pub use object::{value_as_i64, ConfigObject, Properties};
pub use object_type::ObjectType;

use serde::{Deserialize, Serialize};

/// Output of an export: scalar, null, ordered map or sequence.
///
/// Map order is insertion order (`serde_json` is built with
/// `preserve_order`); the canonicalizer establishes the final order.
pub type ExportTree = serde_json::Value;

/// A custom data field attached to an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldReference {
    /// Id of the referenced datafield.
    pub datafield_id: i64,
    /// Variable name the field fills.
    pub varname: String,
    /// Whether the field must be filled.
    pub is_required: bool,
    /// Optional filter restricting where the field applies.
    pub var_filter: Option<String>,
}
