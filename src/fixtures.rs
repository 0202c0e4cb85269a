use std::sync::Arc;

use site_quota::{NetworkDatabase, QuotaService};
use site_quota_engine::TenantId;
use tempfile::TempDir;
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// A multi-site network in a temporary directory.
pub struct NetworkFixture {
    pub temp_dir: TempDir,
    pub database: Arc<NetworkDatabase>,
    pub service: QuotaService<NetworkDatabase>,
    pub site_ids: Vec<TenantId>,
}

impl NetworkFixture {
    pub fn new(default_allocation_mb: i64) -> Self {
        let temp_dir = TempDir::new().expect("tempdir");
        let database = NetworkDatabase::new(temp_dir.path().to_path_buf())
            .expect("open network database");
        database
            .install_network(default_allocation_mb)
            .expect("install network");

        let database = Arc::new(database);
        Self {
            service: QuotaService::new(Arc::clone(&database)),
            database,
            temp_dir,
            site_ids: Vec::new(),
        }
    }

    /// Seeds `count` sites under `/site-N/`, with usage given in megabytes by
    /// `used_mb(index)`.
    pub fn with_sites<F>(default_allocation_mb: i64, count: usize, used_mb: F) -> Self
    where
        F: Fn(usize) -> u64,
    {
        let mut fixture = Self::new(default_allocation_mb);
        for index in 0..count {
            fixture.add_site(&format!("/site-{index}/"), used_mb(index) * BYTES_PER_MB);
        }
        debug!(sites = count, "seeded network fixture");
        fixture
    }

    pub fn add_site(&mut self, path: &str, used_bytes: u64) -> TenantId {
        let id = self
            .database
            .create_site("network.test", path)
            .expect("create site");
        self.database
            .record_usage(id, used_bytes)
            .expect("record usage");
        self.site_ids.push(id);
        id
    }
}

/// Installs a test-friendly subscriber once; later calls are no-ops.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
