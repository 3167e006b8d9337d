//! Service listings as executed by a repository.

use uuid::Uuid;

use crate::model::ConfigObject;

/// Where a service listing draws its rows from.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceSource {
    /// Services assigned directly to a host (or host template).
    Host(ConfigObject),
    /// Member services of a service set.
    ServiceSet(ConfigObject),
    /// Apply rules whose assign filter matches the host.
    AppliedToHost(ConfigObject),
}

/// A service listing, as a UI table would issue it.
///
/// Listings may carry a row limit and offset (pagination). Export always
/// needs every row and clears them with [`ServiceQuery::unlimited`].
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceQuery {
    pub source: ServiceSource,
    /// Host inheriting the listed services from a template.
    pub inherited_by: Option<String>,
    /// Host the listed set services end up on.
    pub affected_host: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ServiceQuery {
    #[must_use]
    pub fn new(source: ServiceSource) -> Self {
        Self {
            source,
            inherited_by: None,
            affected_host: None,
            limit: None,
            offset: None,
        }
    }

    /// Services directly assigned to `host`.
    #[must_use]
    pub fn for_host(host: &ConfigObject) -> Self {
        Self::new(ServiceSource::Host(host.clone()))
    }

    /// Services contained in `set`.
    #[must_use]
    pub fn for_set(set: &ConfigObject) -> Self {
        Self::new(ServiceSource::ServiceSet(set.clone()))
    }

    /// Service apply rules matching `host`.
    #[must_use]
    pub fn applied_to(host: &ConfigObject) -> Self {
        Self::new(ServiceSource::AppliedToHost(host.clone()))
    }

    #[must_use]
    pub fn inherited_by(mut self, host: &ConfigObject) -> Self {
        self.inherited_by = Some(host.name());
        self
    }

    #[must_use]
    pub fn affecting(mut self, host: &ConfigObject) -> Self {
        self.affected_host = Some(host.name());
        self
    }

    #[must_use]
    pub fn paginate(mut self, limit: usize, offset: usize) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Drop row count and offset limits.
    #[must_use]
    pub fn unlimited(mut self) -> Self {
        self.limit = None;
        self.offset = None;
        self
    }
}

/// One row of a service listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRow {
    pub uuid: Uuid,
    pub object_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ObjectType, Properties};

    #[test]
    fn test_unlimited_clears_pagination() {
        let host = ConfigObject::new(ObjectType::Host, Properties::new());
        let query = ServiceQuery::for_host(&host).paginate(25, 50);
        assert_eq!(query.limit, Some(25));

        let query = query.unlimited();
        assert_eq!(query.limit, None);
        assert_eq!(query.offset, None);
        assert_eq!(query.source, ServiceSource::Host(host));
    }
}
