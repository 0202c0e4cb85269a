//! Collaborator interfaces the quota service runs against.
//!
//! Site context is passed explicitly: [`TenantContext::with_tenant`] hands a
//! [`TenantScope`] to its body, and every scoped read or write takes that
//! scope as an argument instead of consulting an ambient "current site".

use serde::{Deserialize, Serialize};
use site_quota_engine::TenantId;

use crate::storage::StorageError;

/// Raw directory row for a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRow {
    pub blog_id: TenantId,
    pub network_id: i64,
    pub domain: String,
    pub path: String,
    pub public: bool,
    pub archived: bool,
    pub mature: bool,
    pub spam: bool,
    pub deleted: bool,
}

impl TenantRow {
    /// Canonical home URL, e.g. `https://example.org/blog/`.
    pub fn url(&self, scheme: &str) -> String {
        format!("{scheme}://{}{}", self.domain, self.path)
    }
}

/// Column equality filter for directory listings. Every set column must match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TenantListFilter {
    pub network_id: Option<i64>,
    pub public: Option<bool>,
    pub archived: Option<bool>,
    pub mature: Option<bool>,
    pub spam: Option<bool>,
    pub deleted: Option<bool>,
}

impl TenantListFilter {
    /// Set columns with their integer column values, in a stable order.
    pub fn columns(&self) -> Vec<(&'static str, i64)> {
        let flags = [
            ("public", self.public),
            ("archived", self.archived),
            ("mature", self.mature),
            ("spam", self.spam),
            ("deleted", self.deleted),
        ];

        self.network_id
            .map(|id| ("network_id", id))
            .into_iter()
            .chain(
                flags
                    .into_iter()
                    .filter_map(|(column, value)| value.map(|flag| (column, i64::from(flag)))),
            )
            .collect()
    }
}

/// Explicit site execution context, valid for the duration of a
/// [`TenantContext::with_tenant`] body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantScope {
    tenant_id: TenantId,
    url: String,
}

impl TenantScope {
    pub fn new(tenant_id: TenantId, url: impl Into<String>) -> Self {
        Self {
            tenant_id,
            url: url.into(),
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

pub trait TenantDirectory {
    fn list(&self, filter: &TenantListFilter) -> Result<Vec<TenantRow>, StorageError>;

    fn get(&self, tenant_id: TenantId) -> Result<Option<TenantRow>, StorageError>;
}

pub trait TenantContext {
    /// Resolves `tenant_id`, runs `body` inside its scope and releases the
    /// scope afterwards whether or not `body` fails. Unknown sites yield
    /// [`StorageError::TenantNotFound`] without running `body`.
    fn with_tenant<T, E, F>(&self, tenant_id: TenantId, body: F) -> Result<T, E>
    where
        F: FnOnce(&TenantScope) -> Result<T, E>,
        E: From<StorageError>;
}

pub trait StorageAccounting {
    /// Effective allocation in megabytes: the site override, else the network
    /// default, else the configured fallback.
    fn allocation_for(&self, scope: &TenantScope) -> Result<i64, StorageError>;

    /// Storage consumed by the site, in megabytes.
    fn used_for(&self, scope: &TenantScope) -> Result<f64, StorageError>;
}

pub trait NetworkConfig {
    fn is_multi_tenant(&self) -> Result<bool, StorageError>;

    fn default_allocation_mb(&self) -> Result<i64, StorageError>;

    /// Stores `Some(mb)` as the site override, or removes it on `None`.
    fn set_tenant_override(
        &self,
        scope: &TenantScope,
        allocation_mb: Option<i64>,
    ) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_scheme_domain_and_path() {
        let row = TenantRow {
            blog_id: 2,
            network_id: 1,
            domain: "example.org".into(),
            path: "/docs/".into(),
            public: true,
            archived: false,
            mature: false,
            spam: false,
            deleted: false,
        };
        assert_eq!(row.url("https"), "https://example.org/docs/");
    }

    #[test]
    fn columns_only_include_set_filters() {
        let filter = TenantListFilter {
            network_id: Some(3),
            spam: Some(false),
            deleted: Some(true),
            ..Default::default()
        };
        assert_eq!(
            filter.columns(),
            vec![("network_id", 3), ("spam", 0), ("deleted", 1)]
        );
        assert!(TenantListFilter::default().columns().is_empty());
    }
}
