use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use site_quota_engine::TenantId;
use tracing::{info, warn};

use crate::config::SiteQuotaConfig;
use crate::tenant::{TenantListFilter, TenantRow};

use super::error::StorageError;
use super::schema::init_database;
use super::{DEFAULT_FALLBACK_ALLOCATION_MB, MULTISITE_KEY, NETWORK_DB_FILENAME, UPLOAD_SPACE_KEY};

const SITE_COLUMNS: &str =
    "blog_id, network_id, domain, path, public, archived, mature, spam, deleted";

/// Status flags a site can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteFlag {
    Public,
    Archived,
    Mature,
    Spam,
    Deleted,
}

impl SiteFlag {
    fn column(self) -> &'static str {
        match self {
            SiteFlag::Public => "public",
            SiteFlag::Archived => "archived",
            SiteFlag::Mature => "mature",
            SiteFlag::Spam => "spam",
            SiteFlag::Deleted => "deleted",
        }
    }
}

impl fmt::Display for SiteFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for SiteFlag {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "public" => Ok(SiteFlag::Public),
            "archived" => Ok(SiteFlag::Archived),
            "mature" => Ok(SiteFlag::Mature),
            "spam" => Ok(SiteFlag::Spam),
            "deleted" => Ok(SiteFlag::Deleted),
            other => Err(format!(
                "unknown site flag '{other}', expected public, archived, mature, spam or deleted"
            )),
        }
    }
}

/// SQLite-backed multi-site network: site directory, per-site options, usage
/// accounting and network-wide settings.
pub struct NetworkDatabase {
    conn: Mutex<Connection>,
    url_scheme: String,
    fallback_allocation_mb: i64,
}

impl NetworkDatabase {
    pub fn new(data_dir: PathBuf) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&data_dir)?;
        let db_path = data_dir.join(NETWORK_DB_FILENAME);
        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        init_database(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            url_scheme: "http".to_string(),
            fallback_allocation_mb: DEFAULT_FALLBACK_ALLOCATION_MB,
        })
    }

    pub fn from_config(config: &SiteQuotaConfig) -> Result<Self, StorageError> {
        Ok(Self::new(config.data_dir.clone())?
            .with_url_scheme(config.url_scheme.clone())
            .with_fallback_allocation_mb(config.fallback_allocation_mb))
    }

    pub fn with_url_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.url_scheme = scheme.into();
        self
    }

    pub fn with_fallback_allocation_mb(mut self, allocation_mb: i64) -> Self {
        self.fallback_allocation_mb = allocation_mb;
        self
    }

    pub fn url_scheme(&self) -> &str {
        &self.url_scheme
    }

    pub fn fallback_allocation_mb(&self) -> i64 {
        self.fallback_allocation_mb
    }

    /// Marks the database as a multi-site network with the given default
    /// per-site allocation.
    pub fn install_network(&self, default_allocation_mb: i64) -> Result<(), StorageError> {
        self.set_meta(MULTISITE_KEY, "1")?;
        self.set_meta(UPLOAD_SPACE_KEY, &default_allocation_mb.to_string())?;
        info!(default_allocation_mb, "installed multi-site network");
        Ok(())
    }

    pub fn set_network_default(&self, default_allocation_mb: i64) -> Result<(), StorageError> {
        self.set_meta(UPLOAD_SPACE_KEY, &default_allocation_mb.to_string())?;
        info!(default_allocation_mb, "updated network default allocation");
        Ok(())
    }

    pub fn create_site(&self, domain: &str, path: &str) -> Result<TenantId, StorageError> {
        let domain = domain.trim().to_ascii_lowercase();
        if domain.is_empty() || domain.contains(|ch: char| ch.is_whitespace() || ch == '/') {
            return Err(StorageError::InvalidSite(format!(
                "invalid domain {domain:?}"
            )));
        }
        let path = normalize_path(path);

        let conn = self.connection()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            r#"
            INSERT INTO sites (domain, path, registered, last_updated)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![domain, path, now, now],
        )?;

        let blog_id = conn.last_insert_rowid() as TenantId;
        info!(blog_id, domain = %domain, path = %path, "created site");
        Ok(blog_id)
    }

    pub fn set_site_flag(
        &self,
        blog_id: TenantId,
        flag: SiteFlag,
        value: bool,
    ) -> Result<(), StorageError> {
        let conn = self.connection()?;
        let now = Utc::now().to_rfc3339();
        let sql = format!(
            "UPDATE sites SET {} = ?1, last_updated = ?2 WHERE blog_id = ?3",
            flag.column()
        );

        let changed = conn.execute(&sql, params![value, now, blog_id as i64])?;
        if changed == 0 {
            return Err(StorageError::TenantNotFound(blog_id));
        }
        Ok(())
    }

    pub fn get_site(&self, blog_id: TenantId) -> Result<Option<TenantRow>, StorageError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SITE_COLUMNS} FROM sites WHERE blog_id = ?1"
        ))?;

        let site = stmt
            .query_row(params![blog_id as i64], row_to_site)
            .optional()?;
        Ok(site)
    }

    pub fn list_sites(&self, filter: &TenantListFilter) -> Result<Vec<TenantRow>, StorageError> {
        let columns = filter.columns();
        let mut sql = format!("SELECT {SITE_COLUMNS} FROM sites");
        if !columns.is_empty() {
            let clauses: Vec<String> = columns
                .iter()
                .enumerate()
                .map(|(idx, (column, _))| format!("{column} = ?{}", idx + 1))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY blog_id");

        let conn = self.connection()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params_from_iter(columns.iter().map(|(_, value)| *value)),
            row_to_site,
        )?;

        let mut sites = Vec::new();
        for row in rows {
            sites.push(row?);
        }
        Ok(sites)
    }

    pub fn record_usage(&self, blog_id: TenantId, used_bytes: u64) -> Result<(), StorageError> {
        if self.get_site(blog_id)?.is_none() {
            return Err(StorageError::TenantNotFound(blog_id));
        }
        let used = i64::try_from(used_bytes).map_err(|_| {
            StorageError::InvalidSite(format!("usage of {used_bytes} bytes is out of range"))
        })?;

        let conn = self.connection()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            r#"
            INSERT INTO site_usage (blog_id, used_bytes, last_updated)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(blog_id) DO UPDATE SET
                used_bytes = excluded.used_bytes,
                last_updated = excluded.last_updated
            "#,
            params![blog_id as i64, used, now],
        )?;
        Ok(())
    }

    pub fn load_usage_bytes(&self, blog_id: TenantId) -> Result<u64, StorageError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare("SELECT used_bytes FROM site_usage WHERE blog_id = ?1")?;

        let used = stmt
            .query_row(params![blog_id as i64], |row| row.get::<_, i64>(0))
            .optional()?;
        Ok(used.unwrap_or(0).max(0) as u64)
    }

    /// Site-specific allocation override, if one is stored and numeric.
    pub fn get_tenant_override(&self, blog_id: TenantId) -> Result<Option<i64>, StorageError> {
        let raw = self.get_option(blog_id, UPLOAD_SPACE_KEY)?;
        Ok(raw.and_then(|value| parse_allocation(&value, "site override")))
    }

    /// Network-wide default allocation, if one is stored and numeric.
    pub fn get_network_default(&self) -> Result<Option<i64>, StorageError> {
        let raw = self.get_meta(UPLOAD_SPACE_KEY)?;
        Ok(raw.and_then(|value| parse_allocation(&value, "network default")))
    }

    pub(crate) fn get_meta(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare("SELECT meta_value FROM network_meta WHERE meta_key = ?1")?;
        let value = stmt
            .query_row(params![key], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(value)
    }

    fn set_meta(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self.connection()?;
        conn.execute(
            r#"
            INSERT INTO network_meta (meta_key, meta_value)
            VALUES (?1, ?2)
            ON CONFLICT(meta_key) DO UPDATE SET meta_value = excluded.meta_value
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    pub(crate) fn get_option(
        &self,
        blog_id: TenantId,
        name: &str,
    ) -> Result<Option<String>, StorageError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT option_value FROM site_options WHERE blog_id = ?1 AND option_name = ?2",
        )?;
        let value = stmt
            .query_row(params![blog_id as i64, name], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(value)
    }

    pub(crate) fn set_option(
        &self,
        blog_id: TenantId,
        name: &str,
        value: &str,
    ) -> Result<(), StorageError> {
        let conn = self.connection()?;
        conn.execute(
            r#"
            INSERT INTO site_options (blog_id, option_name, option_value)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(blog_id, option_name) DO UPDATE SET
                option_value = excluded.option_value
            "#,
            params![blog_id as i64, name, value],
        )?;
        Ok(())
    }

    pub(crate) fn delete_option(&self, blog_id: TenantId, name: &str) -> Result<(), StorageError> {
        let conn = self.connection()?;
        conn.execute(
            "DELETE FROM site_options WHERE blog_id = ?1 AND option_name = ?2",
            params![blog_id as i64, name],
        )?;
        Ok(())
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::ConnectionPoisoned)
    }
}

fn row_to_site(row: &Row<'_>) -> rusqlite::Result<TenantRow> {
    Ok(TenantRow {
        blog_id: row.get::<_, i64>(0)? as TenantId,
        network_id: row.get(1)?,
        domain: row.get(2)?,
        path: row.get(3)?,
        public: row.get(4)?,
        archived: row.get(5)?,
        mature: row.get(6)?,
        spam: row.get(7)?,
        deleted: row.get(8)?,
    })
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

fn parse_allocation(raw: &str, source: &str) -> Option<i64> {
    match raw.trim().parse::<i64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(source, value = raw, "ignoring non-numeric allocation");
            None
        }
    }
}
