use site_quota_engine::TenantId;
use tracing::{debug, info};

use crate::tenant::{
    NetworkConfig, StorageAccounting, TenantContext, TenantDirectory, TenantListFilter,
    TenantRow, TenantScope,
};

use super::database::NetworkDatabase;
use super::error::StorageError;
use super::{BYTES_PER_MEGABYTE, MULTISITE_KEY, UPLOAD_SPACE_KEY};

impl TenantDirectory for NetworkDatabase {
    fn list(&self, filter: &TenantListFilter) -> Result<Vec<TenantRow>, StorageError> {
        self.list_sites(filter)
    }

    fn get(&self, tenant_id: TenantId) -> Result<Option<TenantRow>, StorageError> {
        self.get_site(tenant_id)
    }
}

impl TenantContext for NetworkDatabase {
    fn with_tenant<T, E, F>(&self, tenant_id: TenantId, body: F) -> Result<T, E>
    where
        F: FnOnce(&TenantScope) -> Result<T, E>,
        E: From<StorageError>,
    {
        let site = self
            .get_site(tenant_id)?
            .ok_or(StorageError::TenantNotFound(tenant_id))?;
        let scope = TenantScope::new(tenant_id, site.url(self.url_scheme()));

        debug!(tenant_id, url = scope.url(), "switched to site context");
        let result = body(&scope);
        debug!(tenant_id, ok = result.is_ok(), "restored network context");

        result
    }
}

impl StorageAccounting for NetworkDatabase {
    fn allocation_for(&self, scope: &TenantScope) -> Result<i64, StorageError> {
        if let Some(allocation_mb) = self.get_tenant_override(scope.tenant_id())? {
            return Ok(allocation_mb);
        }
        self.default_allocation_mb()
    }

    fn used_for(&self, scope: &TenantScope) -> Result<f64, StorageError> {
        let used_bytes = self.load_usage_bytes(scope.tenant_id())?;
        Ok(used_bytes as f64 / BYTES_PER_MEGABYTE)
    }
}

impl NetworkConfig for NetworkDatabase {
    fn is_multi_tenant(&self) -> Result<bool, StorageError> {
        Ok(self.get_meta(MULTISITE_KEY)?.as_deref() == Some("1"))
    }

    fn default_allocation_mb(&self) -> Result<i64, StorageError> {
        Ok(self
            .get_network_default()?
            .unwrap_or_else(|| self.fallback_allocation_mb()))
    }

    fn set_tenant_override(
        &self,
        scope: &TenantScope,
        allocation_mb: Option<i64>,
    ) -> Result<(), StorageError> {
        let tenant_id = scope.tenant_id();
        match allocation_mb {
            Some(value) => {
                self.set_option(tenant_id, UPLOAD_SPACE_KEY, &value.to_string())?;
                info!(tenant_id, allocation_mb = value, "stored site quota override");
            }
            None => {
                self.delete_option(tenant_id, UPLOAD_SPACE_KEY)?;
                info!(tenant_id, "cleared site quota override");
            }
        }
        Ok(())
    }
}
