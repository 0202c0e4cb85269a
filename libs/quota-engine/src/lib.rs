//! Site quota computation and filtering engine.
//!
//! This crate holds the pure part of per-site storage quota management on a
//! multi-site network: parsing human-friendly quota magnitudes (`500`, `500m`,
//! `3g`) into megabytes, annotating sites with their usage percentage, deriving
//! new allocations for set/add/subtract, and lazily filtering site streams by
//! usage thresholds. It performs no I/O.

use thiserror::Error;

// Module declarations
pub mod calculator;
pub mod filter;
pub mod record;
pub mod units;

// Re-export key types
pub use calculator::{
    annotate, resolve_add, resolve_set, resolve_subtract, round2, should_write, Usage,
    FULL_USAGE_PERCENT,
};
pub use filter::{filter, FilteredRecords, FilteredResults, ThresholdFilter, UsageFilter};
pub use record::{TenantId, TenantQuotaRecord};
pub use units::{parse_magnitude, QuotaMagnitude, MEGABYTES_PER_GIGABYTE};

/// Errors emitted by the quota engine.
///
/// All of them are deterministic input failures; retrying with the same input
/// yields the same error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuotaEngineError {
    /// The quota token does not match `^[0-9]+[gm]?$` or cannot be represented.
    #[error("Parse error: invalid quota {token:?}: {message}")]
    ParseError { token: String, message: String },

    /// The resulting allocation does not fit in a signed 64-bit megabyte count.
    #[error("allocation overflow: {0}")]
    AllocationOverflow(String),

    /// A usage threshold is negative, non-finite or out of range.
    #[error("invalid threshold: {0}")]
    InvalidThreshold(String),
}

pub type Result<T> = std::result::Result<T, QuotaEngineError>;
