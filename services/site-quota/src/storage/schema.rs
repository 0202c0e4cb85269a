use rusqlite::Connection;

use super::StorageError;

pub const NETWORK_META_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS network_meta (
    meta_key TEXT PRIMARY KEY,
    meta_value TEXT NOT NULL
);
"#;

pub const SITES_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sites (
    blog_id INTEGER PRIMARY KEY AUTOINCREMENT,
    network_id INTEGER NOT NULL DEFAULT 1,
    domain TEXT NOT NULL,
    path TEXT NOT NULL DEFAULT '/',
    public INTEGER NOT NULL DEFAULT 1,
    archived INTEGER NOT NULL DEFAULT 0,
    mature INTEGER NOT NULL DEFAULT 0,
    spam INTEGER NOT NULL DEFAULT 0,
    deleted INTEGER NOT NULL DEFAULT 0,
    registered TEXT NOT NULL,
    last_updated TEXT NOT NULL,
    UNIQUE(domain, path)
);
"#;

pub const SITE_OPTIONS_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS site_options (
    blog_id INTEGER NOT NULL REFERENCES sites(blog_id) ON DELETE CASCADE,
    option_name TEXT NOT NULL,
    option_value TEXT NOT NULL,
    PRIMARY KEY (blog_id, option_name)
);
"#;

pub const SITE_USAGE_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS site_usage (
    blog_id INTEGER PRIMARY KEY REFERENCES sites(blog_id) ON DELETE CASCADE,
    used_bytes INTEGER NOT NULL,
    last_updated TEXT NOT NULL
);
"#;

pub const SITES_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_sites_network ON sites(network_id);
"#;

pub fn init_database(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(NETWORK_META_TABLE_SCHEMA)?;
    conn.execute_batch(SITES_TABLE_SCHEMA)?;
    conn.execute_batch(SITE_OPTIONS_TABLE_SCHEMA)?;
    conn.execute_batch(SITE_USAGE_TABLE_SCHEMA)?;
    conn.execute_batch(SITES_INDEXES)?;
    Ok(())
}
