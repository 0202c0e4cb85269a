use std::io;

use rusqlite;
use site_quota_engine::TenantId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("site {0} not found")]
    TenantNotFound(TenantId),
    #[error("invalid site: {0}")]
    InvalidSite(String),
    #[error("database connection poisoned")]
    ConnectionPoisoned,
    #[error("io error: {0}")]
    IoError(#[from] io::Error),
}
