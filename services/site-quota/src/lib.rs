pub mod config;
pub mod output;
pub mod quota;
pub mod storage;
pub mod tenant;

pub use config::SiteQuotaConfig;
pub use output::{OutputError, OutputFormat, QuotaColumn, RecordsWriter};
pub use quota::{ListQuery, QuotaChange, QuotaOperation, QuotaService, SiteQuotaError};
pub use storage::{NetworkDatabase, SiteFlag, StorageError};
pub use tenant::{
    NetworkConfig, StorageAccounting, TenantContext, TenantDirectory, TenantListFilter, TenantRow,
    TenantScope,
};
