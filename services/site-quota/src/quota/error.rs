use site_quota_engine::{QuotaEngineError, TenantId};
use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum SiteQuotaError {
    /// Malformed quota token, allocation overflow or invalid threshold.
    #[error(transparent)]
    Input(#[from] QuotaEngineError),
    #[error("site {0} not found")]
    NotFound(TenantId),
    #[error("{0}")]
    Precondition(String),
    #[error("storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for SiteQuotaError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::TenantNotFound(tenant_id) => SiteQuotaError::NotFound(tenant_id),
            other => SiteQuotaError::Storage(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SiteQuotaError>;
