pub mod database;
pub mod error;
pub mod network;
pub mod schema;

pub use database::{NetworkDatabase, SiteFlag};
pub use error::StorageError;

pub const NETWORK_DB_FILENAME: &str = "network.db";

/// Option and meta key holding upload space in megabytes, both per site and
/// network-wide.
pub const UPLOAD_SPACE_KEY: &str = "blog_upload_space";
pub const MULTISITE_KEY: &str = "multisite";

/// Allocation used when neither a site override nor a network default exists.
pub const DEFAULT_FALLBACK_ALLOCATION_MB: i64 = 100;

pub const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;
