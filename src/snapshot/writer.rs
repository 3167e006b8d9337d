//! Snapshot writing.
//!
//! The writer exports every top-level object of every snapshot type and
//! writes one JSONL file per type. Objects covered by another export are
//! left out. Members of a template service set appear below their set.
//! Services bound to a host appear below that host only when host services
//! are exported, and are written as records of their own otherwise.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::export::{ExportOptions, Exporter};
use crate::model::{ConfigObject, ObjectType};
use crate::repository::{ConfigRepository, FieldReferenceLoader};
use crate::snapshot::file::{
    atomic_write, ensure_gitignore, read_jsonl, snapshot_path, write_jsonl, MANIFEST_FILE,
};
use crate::snapshot::hash::content_hash;
use crate::snapshot::types::{
    Manifest, SnapshotError, SnapshotRecord, SnapshotResult, SnapshotStats,
};

/// Writer for a snapshot directory.
pub struct SnapshotWriter<'a, R: ?Sized> {
    repo: &'a R,
    output_dir: PathBuf,
    options: ExportOptions,
}

impl<'a, R> SnapshotWriter<'a, R>
where
    R: ConfigRepository + FieldReferenceLoader + ?Sized,
{
    #[must_use]
    pub fn new(repo: &'a R, output_dir: impl Into<PathBuf>, options: ExportOptions) -> Self {
        Self {
            repo,
            output_dir: output_dir.into(),
            options,
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub const fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export all records and overwrite the snapshot files.
    ///
    /// Every safety check runs before the first file is touched, so a
    /// refused snapshot leaves the directory as it was. Objects whose export
    /// fails are logged and counted in the returned stats.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Loading the objects of a type fails
    /// - File writes fail
    /// - Records would be lost and `force` is false
    pub fn write(&self, force: bool) -> SnapshotResult<SnapshotStats> {
        fs::create_dir_all(&self.output_dir)?;
        ensure_gitignore(&self.output_dir)?;

        let mut stats = SnapshotStats::default();
        let mut batches = Vec::new();

        for kind in ObjectType::SNAPSHOT {
            let records = self.collect(kind, &mut stats)?;
            let path = snapshot_path(&self.output_dir, kind);

            if records.is_empty() && !path.exists() {
                continue;
            }
            if !force {
                check_for_lost_records(&path, &records)?;
            }
            batches.push((kind, path, records));
        }

        for (kind, path, records) in batches {
            write_jsonl(&path, &records)?;
            debug!(%kind, records = records.len(), "wrote snapshot file");
            stats.counts.insert(kind, records.len());
        }

        let manifest = Manifest {
            exported_at: Utc::now().to_rfc3339(),
            options: self.options.clone(),
            counts: stats.counts.clone(),
        };
        let mut content = serde_json::to_string_pretty(&manifest)?;
        content.push('\n');
        atomic_write(&self.output_dir.join(MANIFEST_FILE), &content)?;

        info!(
            records = stats.total(),
            failed = stats.failed,
            dir = %self.output_dir.display(),
            "snapshot written"
        );

        Ok(stats)
    }

    /// Export the top-level objects of one type as records sorted by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the objects cannot be loaded or a tree cannot be
    /// hashed. Failing exports are recorded in `stats` instead.
    pub fn collect(
        &self,
        kind: ObjectType,
        stats: &mut SnapshotStats,
    ) -> SnapshotResult<Vec<SnapshotRecord>> {
        let exporter = Exporter::with_options(self.repo, self.options.clone());
        let host_owned_sets = if kind == ObjectType::Service {
            self.host_owned_sets()?
        } else {
            HashSet::new()
        };
        let objects: Vec<ConfigObject> = self
            .repo
            .load_all(kind)?
            .into_iter()
            .filter(|object| self.is_top_level(object, &host_owned_sets))
            .collect();

        let mut name_counts: HashMap<String, usize> = HashMap::new();
        for object in &objects {
            *name_counts.entry(object.name()).or_default() += 1;
        }

        let mut records = Vec::with_capacity(objects.len());
        for object in &objects {
            let name = object.name();
            let tree = match exporter.export(object) {
                Ok(tree) => tree,
                Err(err) => {
                    warn!(%kind, %name, error = %err, "skipping object that failed to export");
                    stats.record_failure(kind, &name, &err);
                    continue;
                }
            };

            let key = match object.id() {
                Some(id) if name_counts.get(&name).copied().unwrap_or(0) > 1 => {
                    format!("{name}#{id}")
                }
                _ => name,
            };

            records.push(SnapshotRecord {
                kind,
                key,
                content_hash: content_hash(&tree)?,
                object: tree,
            });
        }

        records.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(records)
    }

    /// Ids of the service sets assigned to a single host.
    fn host_owned_sets(&self) -> SnapshotResult<HashSet<i64>> {
        Ok(self
            .repo
            .load_all(ObjectType::ServiceSet)?
            .iter()
            .filter(|set| set.get_i64("host_id").is_some())
            .filter_map(ConfigObject::id)
            .collect())
    }

    /// Whether an object is exported on its own rather than below its owner.
    ///
    /// Host-owned service sets cannot be exported on their own. Their own
    /// members become records of their own, and the sets they import are
    /// template sets with records of their own.
    fn is_top_level(&self, object: &ConfigObject, host_owned_sets: &HashSet<i64>) -> bool {
        match object.kind() {
            ObjectType::Service => {
                if object.get_i64("host_id").is_some() {
                    return !self.options.exports_host_services();
                }
                object
                    .get_i64("service_set_id")
                    .map_or(true, |set| host_owned_sets.contains(&set))
            }
            ObjectType::ServiceSet if object.get_i64("host_id").is_some() => {
                if !self.options.resolve_all_host_services {
                    warn!(
                        name = %object.name(),
                        "host-owned service set left out; its host only lists it with all host services resolved"
                    );
                }
                false
            }
            _ => true,
        }
    }
}

/// Refuse to overwrite `path` if it holds keys missing from `records`.
fn check_for_lost_records(path: &Path, records: &[SnapshotRecord]) -> SnapshotResult<()> {
    if !path.exists() {
        return Ok(());
    }

    let current: HashSet<&str> = records.iter().map(|r| r.key.as_str()).collect();
    let mut missing: Vec<String> = read_jsonl(path)?
        .into_iter()
        .map(|r| r.key)
        .filter(|key| !current.contains(key.as_str()))
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    missing.sort();
    let shown = missing.iter().take(5).cloned().collect::<Vec<_>>().join(", ");
    let preview = if missing.len() > 5 {
        format!("{shown} ... and {} more", missing.len() - 5)
    } else {
        shown
    };

    Err(SnapshotError::RecordsWouldBeLost {
        file: path.display().to_string(),
        count: missing.len(),
        preview,
    })
}
