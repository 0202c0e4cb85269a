//! Rendering of site quota records as table, CSV, JSON, count or id lists.

pub mod columns;
pub mod writer;

use std::io;

use thiserror::Error;

use crate::quota::SiteQuotaError;

pub use columns::{parse_fields, QuotaColumn, DEFAULT_COLUMNS};
pub use writer::{OutputFormat, RecordsWriter};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("invalid field: {0}")]
    UnknownField(String),
    #[error("invalid format: {0}")]
    UnknownFormat(String),
    #[error("csv error: {0}")]
    Csv(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Source(#[from] SiteQuotaError),
}
