//! Job settings hooks.
//!
//! Most jobs export the settings they store. Some job implementations
//! compute their exported settings instead; this module maps a job class to
//! such a hook.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{ObjectType, Properties};

/// `rule_id` value meaning "every sync rule".
pub const ALL_RULES: &str = "__ALL__";

/// Job implementations whose exported settings are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobHook {
    Sync,
}

impl JobHook {
    /// Hook for a job class, if it has one.
    ///
    /// Classes are matched by their short name so namespaced and bare class
    /// names both resolve.
    #[must_use]
    pub fn for_class(job_class: &str) -> Option<Self> {
        let short = job_class.rsplit('\\').next().unwrap_or(job_class);
        (short == "SyncJob").then_some(Self::Sync)
    }

    /// Compute exported settings from the stored ones.
    ///
    /// `rule_name` resolves a sync rule id to its name.
    ///
    /// # Errors
    ///
    /// `NotFound` when the configured rule does not exist.
    pub fn export_settings<F>(self, stored: &Properties, rule_name: F) -> Result<Properties>
    where
        F: Fn(i64) -> Result<String>,
    {
        match self {
            Self::Sync => sync_job_settings(stored, rule_name),
        }
    }
}

fn sync_job_settings<F>(stored: &Properties, rule_name: F) -> Result<Properties>
where
    F: Fn(i64) -> Result<String>,
{
    let setting = |name: &str| stored.get(name).and_then(Value::as_str);

    let mut settings = Properties::new();
    settings.insert(
        "apply_changes".to_string(),
        Value::Bool(setting("apply_changes") == Some("y")),
    );
    settings.insert(
        "deploy".to_string(),
        Value::Bool(matches!(setting("deploy"), Some("y" | "f"))),
    );

    let rule_id = setting("rule_id");
    if rule_id != Some(ALL_RULES) {
        let id = rule_id
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .ok_or_else(|| Error::not_found(ObjectType::SyncRule, rule_id.unwrap_or("null")))?;
        settings.insert("rule".to_string(), Value::String(rule_name(id)?));
    }

    Ok(settings)
}
