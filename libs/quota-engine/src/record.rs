use serde::{Deserialize, Serialize};

use crate::calculator::annotate;

/// Numeric site identifier, starting at 1.
pub type TenantId = u64;

/// Quota view of a single site, built per invocation and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantQuotaRecord {
    pub tenant_id: TenantId,
    pub url: String,
    pub allocation_mb: i64,
    pub used_mb: f64,
    pub used_percent: f64,
}

impl TenantQuotaRecord {
    /// Builds a record from raw accounting figures, applying the rounding and
    /// saturation rules of [`annotate`].
    pub fn from_raw(
        tenant_id: TenantId,
        url: impl Into<String>,
        allocation_mb: i64,
        raw_used_mb: f64,
    ) -> Self {
        let usage = annotate(allocation_mb, raw_used_mb);
        Self {
            tenant_id,
            url: url.into(),
            allocation_mb,
            used_mb: usage.used_mb,
            used_percent: usage.used_percent,
        }
    }
}
