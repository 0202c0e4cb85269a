use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::output::OutputFormat;
use crate::storage::DEFAULT_FALLBACK_ALLOCATION_MB;

#[derive(Debug, Clone)]
pub struct SiteQuotaConfig {
    pub data_dir: PathBuf,
    pub url_scheme: String,
    pub fallback_allocation_mb: i64,
    pub default_format: OutputFormat,
    pub log_level: String,
}

impl Default for SiteQuotaConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/network"),
            url_scheme: "http".to_string(),
            fallback_allocation_mb: DEFAULT_FALLBACK_ALLOCATION_MB,
            default_format: OutputFormat::Table,
            log_level: "warn".to_string(),
        }
    }
}

impl SiteQuotaConfig {
    pub fn from_env() -> Result<Self> {
        let cfg = Self::from_lookup(|key| env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Builds a config from an arbitrary variable source without validating
    /// the data directory.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(dir) = lookup("SITE_QUOTA_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }
        if let Some(scheme) = lookup("SITE_QUOTA_URL_SCHEME") {
            cfg.url_scheme = scheme.trim().to_ascii_lowercase();
        }
        if let Some(fallback) = lookup("SITE_QUOTA_FALLBACK_MB") {
            cfg.fallback_allocation_mb = fallback
                .trim()
                .parse()
                .context("SITE_QUOTA_FALLBACK_MB must be an integer number of megabytes")?;
        }
        if let Some(format) = lookup("SITE_QUOTA_FORMAT") {
            cfg.default_format = format
                .parse()
                .map_err(anyhow::Error::msg)
                .context("SITE_QUOTA_FORMAT is invalid")?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            cfg.log_level = level;
        }

        if !matches!(cfg.url_scheme.as_str(), "http" | "https") {
            anyhow::bail!(
                "SITE_QUOTA_URL_SCHEME must be http or https, got {}",
                cfg.url_scheme
            );
        }
        if cfg.fallback_allocation_mb < 0 {
            anyhow::bail!("SITE_QUOTA_FALLBACK_MB must not be negative");
        }

        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_directory(&self.data_dir)
    }
}

fn ensure_directory(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            anyhow::bail!("{} exists but is not a directory", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("unable to create data directory {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<SiteQuotaConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        SiteQuotaConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_variables() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("data/network"));
        assert_eq!(cfg.url_scheme, "http");
        assert_eq!(cfg.fallback_allocation_mb, 100);
        assert_eq!(cfg.default_format, OutputFormat::Table);
        assert_eq!(cfg.log_level, "warn");
    }

    #[test]
    fn variables_override_defaults() {
        let cfg = config_from(&[
            ("SITE_QUOTA_DATA_DIR", "/srv/network"),
            ("SITE_QUOTA_URL_SCHEME", "HTTPS"),
            ("SITE_QUOTA_FALLBACK_MB", "250"),
            ("SITE_QUOTA_FORMAT", "json"),
            ("LOG_LEVEL", "debug"),
        ])
        .unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/srv/network"));
        assert_eq!(cfg.url_scheme, "https");
        assert_eq!(cfg.fallback_allocation_mb, 250);
        assert_eq!(cfg.default_format, OutputFormat::Json);
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(config_from(&[("SITE_QUOTA_URL_SCHEME", "ftp")]).is_err());
        assert!(config_from(&[("SITE_QUOTA_FALLBACK_MB", "1g")]).is_err());
        assert!(config_from(&[("SITE_QUOTA_FALLBACK_MB", "-1")]).is_err());
        assert!(config_from(&[("SITE_QUOTA_FORMAT", "yaml")]).is_err());
    }

    #[test]
    fn validate_creates_missing_data_dir() {
        let temp = tempfile::tempdir().unwrap();
        let cfg = SiteQuotaConfig {
            data_dir: temp.path().join("nested/network"),
            ..Default::default()
        };
        cfg.validate().unwrap();
        assert!(cfg.data_dir.is_dir());
    }
}
