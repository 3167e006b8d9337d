//! Host service resolution.
//!
//! A host sees services from several places: its own assignments, the
//! templates it imports, the service sets it or its templates own, and
//! apply rules (for single services and for whole sets). The resolver
//! lists them in a fixed order without de-duplication: apply and override
//! rules can legitimately place the same service twice.

use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::export::templates::ancestors;
use crate::model::ConfigObject;
use crate::repository::{ConfigRepository, ServiceQuery, ServiceRow};

/// How much of a host's service graph to resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ServiceResolution {
    /// Services assigned directly to the host.
    #[default]
    Direct,
    /// Direct services plus everything inherited or applied.
    Full,
}

/// Where a resolved service comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceOrigin {
    Direct,
    /// Assigned to an imported host template.
    Template { template: String },
    /// Member of a set owned by the host.
    HostSet { set: String },
    /// Member of a set owned by an imported host template.
    TemplateSet { template: String, set: String },
    /// Member of a set applied by assign filter.
    AppliedSet { set: String },
    /// Service apply rule matching the host.
    Applied,
}

/// A service visible on a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedService {
    pub uuid: Uuid,
    pub object_name: String,
    pub origin: ServiceOrigin,
}

impl ResolvedService {
    fn from_rows(rows: Vec<ServiceRow>, origin: &ServiceOrigin) -> impl Iterator<Item = Self> {
        let origin = origin.clone();
        rows.into_iter().map(move |row| Self {
            uuid: row.uuid,
            object_name: row.object_name,
            origin: origin.clone(),
        })
    }
}

/// Computes the services visible on a host.
pub struct RelationResolver<'a, R: ?Sized> {
    repo: &'a R,
}

impl<'a, R> RelationResolver<'a, R>
where
    R: ConfigRepository + ?Sized,
{
    #[must_use]
    pub const fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Services of `host` according to `mode`.
    ///
    /// # Errors
    ///
    /// Propagates repository errors and `CyclicInheritance` from the template
    /// walk.
    pub fn host_services(
        &self,
        host: &ConfigObject,
        mode: ServiceResolution,
    ) -> Result<Vec<ResolvedService>> {
        let mut services = self.fetch(ServiceQuery::for_host(host), &ServiceOrigin::Direct)?;
        if mode == ServiceResolution::Full {
            services.extend(self.inherited_and_applied(host)?);
        }
        debug!(host = %host.name(), ?mode, count = services.len(), "resolved host services");
        Ok(services)
    }

    /// Everything a host sees beyond its direct assignments, in this order:
    /// template services, own sets, template sets, applied sets, applied
    /// services.
    fn inherited_and_applied(&self, host: &ConfigObject) -> Result<Vec<ResolvedService>> {
        let mut services = Vec::new();
        let templates = ancestors(self.repo, host)?;

        for template in &templates {
            let origin = ServiceOrigin::Template {
                template: template.name(),
            };
            let query = ServiceQuery::for_host(template).inherited_by(host);
            services.extend(self.fetch(query, &origin)?);
        }

        for set in self.repo.host_service_sets(host)? {
            let origin = ServiceOrigin::HostSet { set: set.name() };
            let query = ServiceQuery::for_set(&set).affecting(host);
            services.extend(self.fetch(query, &origin)?);
        }

        for template in &templates {
            for set in self.repo.host_service_sets(template)? {
                let origin = ServiceOrigin::TemplateSet {
                    template: template.name(),
                    set: set.name(),
                };
                let query = ServiceQuery::for_set(&set).affecting(host);
                services.extend(self.fetch(query, &origin)?);
            }
        }

        for set in self.repo.applied_service_sets(host)? {
            let origin = ServiceOrigin::AppliedSet { set: set.name() };
            let query = ServiceQuery::for_set(&set).affecting(host);
            services.extend(self.fetch(query, &origin)?);
        }

        services.extend(self.fetch(ServiceQuery::applied_to(host), &ServiceOrigin::Applied)?);

        Ok(services)
    }

    fn fetch(&self, query: ServiceQuery, origin: &ServiceOrigin) -> Result<Vec<ResolvedService>> {
        let rows = self.repo.service_rows(&query.unlimited())?;
        Ok(ResolvedService::from_rows(rows, origin).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObjectType;
    use crate::storage::fixtures::seeded;

    fn listing(services: &[ResolvedService]) -> Vec<(&str, &ServiceOrigin)> {
        services
            .iter()
            .map(|s| (s.object_name.as_str(), &s.origin))
            .collect()
    }

    #[test]
    fn test_direct_mode_lists_own_services() {
        let repo = seeded();
        let web1 = repo.load(ObjectType::Host, "web1").unwrap();

        let services = RelationResolver::new(&repo)
            .host_services(&web1, ServiceResolution::Direct)
            .unwrap();
        assert_eq!(listing(&services), vec![("ping", &ServiceOrigin::Direct)]);
    }

    #[test]
    fn test_full_mode_order() {
        let repo = seeded();
        let web1 = repo.load(ObjectType::Host, "web1").unwrap();

        let services = RelationResolver::new(&repo)
            .host_services(&web1, ServiceResolution::Full)
            .unwrap();

        assert_eq!(
            listing(&services),
            vec![
                ("ping", &ServiceOrigin::Direct),
                (
                    "ssh",
                    &ServiceOrigin::Template {
                        template: "generic-host".into()
                    }
                ),
                (
                    "swap",
                    &ServiceOrigin::Template {
                        template: "linux-host".into()
                    }
                ),
                (
                    "load",
                    &ServiceOrigin::HostSet {
                        set: "linux-basics".into()
                    }
                ),
                (
                    "http",
                    &ServiceOrigin::AppliedSet {
                        set: "web-checks".into()
                    }
                ),
                ("ntp", &ServiceOrigin::Applied),
            ]
        );
    }

    #[test]
    fn test_template_sets_are_inherited() {
        let repo = seeded();
        repo.conn()
            .execute_batch(
                "INSERT INTO icinga_service_set (id, object_name, object_type, host_id)
                 VALUES (10, 'generic-basics', 'object', 1);
                 INSERT INTO icinga_service_set_inheritance (object_id, parent_id, weight)
                 VALUES (10, 1, 1);",
            )
            .unwrap();
        let db1 = repo.load(ObjectType::Host, "db1").unwrap();
        repo.conn()
            .execute("INSERT INTO icinga_host_inheritance VALUES (4, 1, 1)", [])
            .unwrap();

        let services = RelationResolver::new(&repo)
            .host_services(&db1, ServiceResolution::Full)
            .unwrap();
        let from_template_sets: Vec<&str> = services
            .iter()
            .filter(|s| matches!(s.origin, ServiceOrigin::TemplateSet { .. }))
            .map(|s| s.object_name.as_str())
            .collect();
        assert_eq!(from_template_sets, vec!["load", "users"]);
    }

    #[test]
    fn test_no_deduplication() {
        let repo = seeded();
        repo.conn()
            .execute(
                "INSERT INTO icinga_service (uuid, object_name, object_type, assign_filter)
                 VALUES ('6f1c2a1e-0d3b-4c1e-9b7a-0000000000aa', 'ping', 'apply', 'host.name=web1')",
                [],
            )
            .unwrap();
        let web1 = repo.load(ObjectType::Host, "web1").unwrap();

        let services = RelationResolver::new(&repo)
            .host_services(&web1, ServiceResolution::Full)
            .unwrap();
        let pings = services.iter().filter(|s| s.object_name == "ping").count();
        assert_eq!(pings, 2);
    }
}
