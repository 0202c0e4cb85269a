//! Shared fixtures for the workspace benches and end-to-end tests.

pub mod fixtures;

pub use fixtures::{init_test_tracing, NetworkFixture, BYTES_PER_MB};

// Re-export workspace crates needed by benches and tests
pub use site_quota;
pub use site_quota_engine;
