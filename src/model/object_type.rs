//! The closed set of configuration object kinds.
//!
//! Every kind knows where it lives in the database, which column names it,
//! which family it belongs to and which of its stored properties are state
//! rather than configuration.

use serde::{Deserialize, Serialize};

/// Kind tag of a configuration object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Host,
    Service,
    ServiceSet,
    Command,
    Timeperiod,
    Zone,
    Endpoint,
    User,
    Notification,
    HostGroup,
    ServiceGroup,
    HostTemplateChoice,
    ServiceTemplateChoice,
    Job,
    ImportSource,
    ImportRowModifier,
    SyncRule,
    SyncProperty,
    Datalist,
    DatalistEntry,
    Datafield,
    DatafieldCategory,
}

/// Properties of a director job that only describe its last run.
const JOB_DENIED: &[&str] = &[
    "last_attempt_succeeded",
    "last_error_message",
    "ts_last_attempt",
    "ts_last_error",
];

/// Import state is runtime information.
const IMPORT_SOURCE_DENIED: &[&str] = &["import_state", "last_error_message", "last_attempt"];

/// The owning source is implied by nesting below the import source.
const ROW_MODIFIER_DENIED: &[&str] = &["source_id"];

const SYNC_RULE_DENIED: &[&str] = &["sync_state", "last_error_message", "last_attempt"];

impl ObjectType {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 22] = [
        Self::Host,
        Self::Service,
        Self::ServiceSet,
        Self::Command,
        Self::Timeperiod,
        Self::Zone,
        Self::Endpoint,
        Self::User,
        Self::Notification,
        Self::HostGroup,
        Self::ServiceGroup,
        Self::HostTemplateChoice,
        Self::ServiceTemplateChoice,
        Self::Job,
        Self::ImportSource,
        Self::ImportRowModifier,
        Self::SyncRule,
        Self::SyncProperty,
        Self::Datalist,
        Self::DatalistEntry,
        Self::Datafield,
        Self::DatafieldCategory,
    ];

    /// Kinds written by a full snapshot, in dependency order.
    ///
    /// Row modifiers, sync properties and datalist entries are nested below
    /// their parents and never exported on their own.
    pub const SNAPSHOT: [Self; 19] = [
        Self::DatafieldCategory,
        Self::Datafield,
        Self::Datalist,
        Self::Command,
        Self::Timeperiod,
        Self::Zone,
        Self::Endpoint,
        Self::HostGroup,
        Self::ServiceGroup,
        Self::User,
        Self::HostTemplateChoice,
        Self::ServiceTemplateChoice,
        Self::Host,
        Self::Service,
        Self::ServiceSet,
        Self::Notification,
        Self::ImportSource,
        Self::SyncRule,
        Self::Job,
    ];

    /// Machine-readable name, also used for snapshot file names.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Service => "service",
            Self::ServiceSet => "service_set",
            Self::Command => "command",
            Self::Timeperiod => "timeperiod",
            Self::Zone => "zone",
            Self::Endpoint => "endpoint",
            Self::User => "user",
            Self::Notification => "notification",
            Self::HostGroup => "host_group",
            Self::ServiceGroup => "service_group",
            Self::HostTemplateChoice => "host_template_choice",
            Self::ServiceTemplateChoice => "service_template_choice",
            Self::Job => "job",
            Self::ImportSource => "import_source",
            Self::ImportRowModifier => "import_row_modifier",
            Self::SyncRule => "sync_rule",
            Self::SyncProperty => "sync_property",
            Self::Datalist => "datalist",
            Self::DatalistEntry => "datalist_entry",
            Self::Datafield => "datafield",
            Self::DatafieldCategory => "datafield_category",
        }
    }

    /// Database table holding objects of this kind.
    #[must_use]
    pub const fn table(&self) -> &'static str {
        match self {
            Self::Host => "icinga_host",
            Self::Service => "icinga_service",
            Self::ServiceSet => "icinga_service_set",
            Self::Command => "icinga_command",
            Self::Timeperiod => "icinga_timeperiod",
            Self::Zone => "icinga_zone",
            Self::Endpoint => "icinga_endpoint",
            Self::User => "icinga_user",
            Self::Notification => "icinga_notification",
            Self::HostGroup => "icinga_hostgroup",
            Self::ServiceGroup => "icinga_servicegroup",
            Self::HostTemplateChoice => "icinga_host_template_choice",
            Self::ServiceTemplateChoice => "icinga_service_template_choice",
            Self::Job => "director_job",
            Self::ImportSource => "import_source",
            Self::ImportRowModifier => "import_row_modifier",
            Self::SyncRule => "sync_rule",
            Self::SyncProperty => "sync_property",
            Self::Datalist => "director_datalist",
            Self::DatalistEntry => "director_datalist_entry",
            Self::Datafield => "director_datafield",
            Self::DatafieldCategory => "director_datafield_category",
        }
    }

    /// Column carrying the human-facing name, if the kind has one.
    #[must_use]
    pub const fn name_column(&self) -> Option<&'static str> {
        match self {
            Self::ImportRowModifier | Self::SyncProperty => None,
            Self::Job => Some("job_name"),
            Self::ImportSource => Some("source_name"),
            Self::SyncRule => Some("rule_name"),
            Self::Datalist => Some("list_name"),
            Self::DatalistEntry => Some("entry_name"),
            Self::Datafield => Some("varname"),
            Self::DatafieldCategory => Some("category_name"),
            _ => Some("object_name"),
        }
    }

    /// Whether this kind is a self-describing Icinga object whose export is
    /// built from its plain representation instead of the raw row.
    #[must_use]
    pub const fn is_icinga_object(&self) -> bool {
        matches!(
            self,
            Self::Host
                | Self::Service
                | Self::ServiceSet
                | Self::Command
                | Self::Timeperiod
                | Self::Zone
                | Self::Endpoint
                | Self::User
                | Self::Notification
                | Self::HostGroup
                | Self::ServiceGroup
                | Self::HostTemplateChoice
                | Self::ServiceTemplateChoice
        )
    }

    /// Whether custom data fields can be attached.
    #[must_use]
    pub const fn supports_fields(&self) -> bool {
        matches!(
            self,
            Self::Host | Self::Service | Self::Command | Self::User | Self::Notification
        )
    }

    /// Whether objects of this kind import templates of the same kind.
    #[must_use]
    pub const fn supports_inheritance(&self) -> bool {
        self.is_icinga_object() && !self.is_template_choice()
    }

    /// Whether custom variables are stored for this kind.
    #[must_use]
    pub const fn supports_vars(&self) -> bool {
        matches!(
            self,
            Self::Host
                | Self::Service
                | Self::ServiceSet
                | Self::Command
                | Self::User
                | Self::Notification
        )
    }

    /// Settings table and its owning foreign key, for kinds carrying a
    /// free-form settings bag.
    #[must_use]
    pub const fn settings_table(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Job => Some(("director_job_setting", "job_id")),
            Self::ImportSource => Some(("import_source_setting", "source_id")),
            Self::ImportRowModifier => Some(("import_row_modifier_setting", "row_modifier_id")),
            Self::Datafield => Some(("director_datafield_setting", "datafield_id")),
            _ => None,
        }
    }

    #[must_use]
    pub const fn supports_settings(&self) -> bool {
        self.settings_table().is_some()
    }

    #[must_use]
    pub const fn is_template_choice(&self) -> bool {
        matches!(self, Self::HostTemplateChoice | Self::ServiceTemplateChoice)
    }

    /// The template kind a template choice picks from.
    #[must_use]
    pub const fn choice_target(&self) -> Option<Self> {
        match self {
            Self::HostTemplateChoice => Some(Self::Host),
            Self::ServiceTemplateChoice => Some(Self::Service),
            _ => None,
        }
    }

    /// The template choice kind for a templated kind.
    #[must_use]
    pub const fn template_choice(&self) -> Option<Self> {
        match self {
            Self::Host => Some(Self::HostTemplateChoice),
            Self::Service => Some(Self::ServiceTemplateChoice),
            _ => None,
        }
    }

    /// Stored properties that never belong in an export.
    #[must_use]
    pub const fn denied_properties(&self) -> &'static [&'static str] {
        match self {
            Self::Job => JOB_DENIED,
            Self::ImportSource => IMPORT_SOURCE_DENIED,
            Self::ImportRowModifier => ROW_MODIFIER_DENIED,
            Self::SyncRule => SYNC_RULE_DENIED,
            _ => &[],
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ObjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("Unknown object type: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for kind in ObjectType::ALL {
            assert_eq!(kind.as_str().parse::<ObjectType>().unwrap(), kind);
        }
        assert_eq!("service-set".parse::<ObjectType>().unwrap(), ObjectType::ServiceSet);
        assert!("hostgroup_member".parse::<ObjectType>().is_err());
    }

    #[test]
    fn test_serde_matches_display() {
        let json = serde_json::to_string(&ObjectType::ImportRowModifier).unwrap();
        assert_eq!(json, "\"import_row_modifier\"");
    }

    #[test]
    fn test_denylists() {
        assert!(ObjectType::Job.denied_properties().contains(&"ts_last_error"));
        assert!(ObjectType::ImportSource.denied_properties().contains(&"import_state"));
        assert_eq!(ObjectType::ImportRowModifier.denied_properties(), &["source_id"]);
        assert!(ObjectType::SyncRule.denied_properties().contains(&"sync_state"));
        assert!(ObjectType::Host.denied_properties().is_empty());
    }

    #[test]
    fn test_families() {
        assert!(ObjectType::Host.is_icinga_object());
        assert!(ObjectType::HostTemplateChoice.is_icinga_object());
        assert!(!ObjectType::HostTemplateChoice.supports_inheritance());
        assert!(!ObjectType::Datalist.is_icinga_object());
        assert!(ObjectType::Datafield.supports_settings());
        assert!(!ObjectType::SyncRule.supports_settings());
        assert_eq!(ObjectType::ServiceTemplateChoice.choice_target(), Some(ObjectType::Service));
    }

    #[test]
    fn test_snapshot_kinds_have_names() {
        for kind in ObjectType::SNAPSHOT {
            assert!(kind.name_column().is_some(), "{kind} has no name column");
        }
    }
}
