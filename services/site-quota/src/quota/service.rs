use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use site_quota_engine::{
    resolve_add, resolve_set, resolve_subtract, should_write, TenantId, TenantQuotaRecord,
    ThresholdFilter, UsageFilter,
};
use tracing::{debug, info};

use crate::tenant::{
    NetworkConfig, StorageAccounting, TenantContext, TenantDirectory, TenantListFilter,
    TenantScope,
};

use super::error::{Result, SiteQuotaError};
use super::NOT_MULTISITE_MESSAGE;

/// Selection for [`QuotaService::list`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ListQuery {
    pub columns: TenantListFilter,
    pub thresholds: ThresholdFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaOperation {
    Set,
    Add,
    Subtract,
}

impl fmt::Display for QuotaOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuotaOperation::Set => "set",
            QuotaOperation::Add => "add",
            QuotaOperation::Subtract => "subtract",
        };
        f.write_str(name)
    }
}

/// Outcome of a quota mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaChange {
    pub tenant_id: TenantId,
    pub url: String,
    pub operation: QuotaOperation,
    pub previous_mb: i64,
    pub allocation_mb: i64,
    /// The new allocation equals the network default, so the site override
    /// was removed instead of stored.
    pub override_cleared: bool,
}

impl QuotaChange {
    pub fn message(&self) -> String {
        format!("Quota is now {} MB for {}.", self.allocation_mb, self.url)
    }
}

/// Reads and mutates site quotas through the network collaborators.
pub struct QuotaService<B> {
    backend: Arc<B>,
}

impl<B> Clone for QuotaService<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B> QuotaService<B>
where
    B: TenantDirectory + TenantContext + StorageAccounting + NetworkConfig,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn get(&self, tenant_id: TenantId) -> Result<TenantQuotaRecord> {
        self.ensure_multi_tenant()?;
        self.backend
            .with_tenant(tenant_id, |scope| self.annotate(scope))
    }

    /// Lazily lists site quotas matching `query`, in directory order.
    ///
    /// Each site is resolved and measured only when the iterator reaches it.
    /// Per-site failures are yielded in position.
    pub fn list<'a>(
        &'a self,
        query: &ListQuery,
    ) -> Result<impl Iterator<Item = Result<TenantQuotaRecord>> + 'a> {
        self.ensure_multi_tenant()?;

        let rows = self.backend.list(&query.columns)?;
        debug!(sites = rows.len(), "resolved site directory");

        let records = rows.into_iter().map(move |row| {
            self.backend
                .with_tenant(row.blog_id, |scope| self.annotate(scope))
        });

        Ok(UsageFilter::new(query.thresholds).apply_fallible(records))
    }

    pub fn set(&self, tenant_id: TenantId, requested: &str) -> Result<QuotaChange> {
        self.apply(tenant_id, QuotaOperation::Set, requested)
    }

    pub fn add(&self, tenant_id: TenantId, delta: &str) -> Result<QuotaChange> {
        self.apply(tenant_id, QuotaOperation::Add, delta)
    }

    pub fn subtract(&self, tenant_id: TenantId, delta: &str) -> Result<QuotaChange> {
        self.apply(tenant_id, QuotaOperation::Subtract, delta)
    }

    fn apply(
        &self,
        tenant_id: TenantId,
        operation: QuotaOperation,
        token: &str,
    ) -> Result<QuotaChange> {
        self.ensure_multi_tenant()?;

        self.backend.with_tenant(tenant_id, |scope| {
            let previous_mb = self.backend.allocation_for(scope)?;
            let allocation_mb = match operation {
                QuotaOperation::Set => resolve_set(token)?.to_allocation_mb()?,
                QuotaOperation::Add => resolve_add(previous_mb, token)?,
                QuotaOperation::Subtract => resolve_subtract(previous_mb, token)?,
            };

            let network_default_mb = self.backend.default_allocation_mb()?;
            let write = should_write(allocation_mb, network_default_mb);
            self.backend
                .set_tenant_override(scope, write.then_some(allocation_mb))?;

            info!(
                tenant_id,
                %operation,
                previous_mb,
                allocation_mb,
                override_cleared = !write,
                "site quota updated"
            );

            Ok(QuotaChange {
                tenant_id,
                url: scope.url().to_string(),
                operation,
                previous_mb,
                allocation_mb,
                override_cleared: !write,
            })
        })
    }

    fn annotate(&self, scope: &TenantScope) -> Result<TenantQuotaRecord> {
        let allocation_mb = self.backend.allocation_for(scope)?;
        let used_mb = self.backend.used_for(scope)?;
        let record =
            TenantQuotaRecord::from_raw(scope.tenant_id(), scope.url(), allocation_mb, used_mb);

        debug!(
            tenant_id = record.tenant_id,
            allocation_mb,
            used_mb = record.used_mb,
            used_percent = record.used_percent,
            "annotated site quota"
        );
        Ok(record)
    }

    fn ensure_multi_tenant(&self) -> Result<()> {
        if self.backend.is_multi_tenant()? {
            Ok(())
        } else {
            Err(SiteQuotaError::Precondition(NOT_MULTISITE_MESSAGE.to_string()))
        }
    }
}
