mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use cli::Cli;
use site_quota::SiteQuotaConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SiteQuotaConfig::from_env()?;
    init_tracing(&config.log_level)?;

    cli::run(cli, &config)
}

fn init_tracing(default_level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}
