pub mod error;
pub mod service;

pub use error::SiteQuotaError;
pub use service::{ListQuery, QuotaChange, QuotaOperation, QuotaService};

pub const NOT_MULTISITE_MESSAGE: &str = "This is not a multisite installation.";
