//! Export options.

use serde::{Deserialize, Serialize};

/// Switches controlling what an export contains.
///
/// All switches default to off. Options can be read from a JSON file
/// (missing keys take their defaults) and combined with command-line flags
/// through [`ExportOptions::merged`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Attach the services directly assigned to exported hosts.
    pub include_host_services: bool,

    /// Attach every service visible on a host (templates, sets, apply
    /// rules). Implies `include_host_services`.
    pub resolve_all_host_services: bool,

    /// Keep null-valued properties instead of dropping them.
    pub show_defaults: bool,

    /// Keep the internal `id` property.
    pub show_ids: bool,

    /// Flatten inherited properties into Icinga objects and their services.
    pub resolve_objects: bool,

    /// Project the top level of each export to these keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<String>>,
}

impl ExportOptions {
    /// Whether hosts get a `services` list.
    #[must_use]
    pub const fn exports_host_services(&self) -> bool {
        self.include_host_services || self.resolve_all_host_services
    }

    /// Combine two option sets: switches are OR-ed, an allowlist in `other`
    /// replaces ours.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        Self {
            include_host_services: self.include_host_services || other.include_host_services,
            resolve_all_host_services: self.resolve_all_host_services
                || other.resolve_all_host_services,
            show_defaults: self.show_defaults || other.show_defaults,
            show_ids: self.show_ids || other.show_ids,
            resolve_objects: self.resolve_objects || other.resolve_objects,
            properties: other.properties.clone().or_else(|| self.properties.clone()),
        }
    }
}
