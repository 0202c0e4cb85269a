//! Command line definition and dispatch.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};
use site_quota::output::parse_fields;
use site_quota::{
    ListQuery, NetworkDatabase, OutputError, OutputFormat, QuotaChange, QuotaColumn,
    QuotaService, RecordsWriter, SiteFlag, SiteQuotaConfig, SiteQuotaError, TenantListFilter,
};
use site_quota_engine::{QuotaMagnitude, TenantId, ThresholdFilter};
use tracing::info;

/// Inspect and change per-site storage quotas on a multi-site network.
#[derive(Debug, Parser)]
#[command(name = "site-quota", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the quota and usage of a single site.
    Get {
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        id: TenantId,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List sites with their quota usage.
    List {
        #[command(flatten)]
        thresholds: ThresholdArgs,
        #[command(flatten)]
        columns: ColumnArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Set a site's quota, e.g. `500`, `500m` or `3g`.
    Set {
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        id: TenantId,
        quota: String,
    },
    /// Increase a site's quota by the given amount.
    Add {
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        id: TenantId,
        delta: String,
    },
    /// Decrease a site's quota by the given amount.
    Subtract {
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        id: TenantId,
        delta: String,
    },
    /// Network administration.
    #[command(subcommand)]
    Network(NetworkCommand),
}

#[derive(Debug, Subcommand)]
pub enum NetworkCommand {
    /// Turn the database into a multi-site network.
    Install {
        #[arg(long, default_value = "100")]
        default_quota: QuotaMagnitude,
    },
    /// Change the quota inherited by sites without an override.
    SetDefault { quota: QuotaMagnitude },
    /// Register a site.
    CreateSite {
        domain: String,
        #[arg(default_value = "/")]
        path: String,
    },
    /// Record the storage currently used by a site, in bytes.
    RecordUsage {
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        id: TenantId,
        bytes: u64,
    },
    /// Set a status flag (public, archived, mature, spam or deleted) on a site.
    SetFlag {
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        id: TenantId,
        flag: SiteFlag,
        #[arg(action = clap::ArgAction::Set, value_parser = BoolishValueParser::new())]
        value: bool,
    },
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Output format: table, csv, json, count or ids.
    #[arg(long)]
    format: Option<OutputFormat>,
    /// Comma separated fields to show, e.g. `blog_id,quota_used_percent`.
    #[arg(long, conflicts_with = "field")]
    fields: Option<String>,
    /// Print the value of a single field.
    #[arg(long)]
    field: Option<String>,
}

impl OutputArgs {
    fn writer<W: Write>(&self, out: W, config: &SiteQuotaConfig) -> Result<RecordsWriter<W>> {
        let mut writer = RecordsWriter::new(out, self.format.unwrap_or(config.default_format));
        if let Some(fields) = &self.fields {
            writer = writer.with_columns(parse_fields(fields)?);
        }
        if let Some(field) = &self.field {
            let column = QuotaColumn::from_name(field)
                .ok_or_else(|| OutputError::UnknownField(field.clone()))?;
            writer = writer.with_field(column);
        }
        Ok(writer)
    }
}

#[derive(Debug, Args)]
pub struct ThresholdArgs {
    /// Only sites using at least this many megabytes.
    #[arg(long, value_name = "MB")]
    min_used_mb: Option<f64>,
    /// Only sites using at least this percentage of their quota.
    #[arg(long, value_name = "PERCENT")]
    min_used_percent: Option<f64>,
}

#[derive(Debug, Args)]
pub struct ColumnArgs {
    #[arg(long)]
    network_id: Option<i64>,
    #[arg(long, value_parser = BoolishValueParser::new())]
    public: Option<bool>,
    #[arg(long, value_parser = BoolishValueParser::new())]
    archived: Option<bool>,
    #[arg(long, value_parser = BoolishValueParser::new())]
    mature: Option<bool>,
    #[arg(long, value_parser = BoolishValueParser::new())]
    spam: Option<bool>,
    #[arg(long, value_parser = BoolishValueParser::new())]
    deleted: Option<bool>,
}

impl From<ColumnArgs> for TenantListFilter {
    fn from(args: ColumnArgs) -> Self {
        Self {
            network_id: args.network_id,
            public: args.public,
            archived: args.archived,
            mature: args.mature,
            spam: args.spam,
            deleted: args.deleted,
        }
    }
}

pub fn run(cli: Cli, config: &SiteQuotaConfig) -> Result<()> {
    let database = NetworkDatabase::from_config(config).with_context(|| {
        format!(
            "unable to open network database in {}",
            config.data_dir.display()
        )
    })?;
    let database = Arc::new(database);
    let service = QuotaService::new(Arc::clone(&database));

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Get { id, output } => {
            let record = service.get(id)?;
            output
                .writer(&mut out, config)?
                .write_records([Ok::<_, SiteQuotaError>(record)])?;
        }
        Command::List {
            thresholds,
            columns,
            output,
        } => {
            let query = ListQuery {
                columns: columns.into(),
                thresholds: ThresholdFilter::new(
                    thresholds.min_used_mb,
                    thresholds.min_used_percent,
                )?,
            };
            let written = output
                .writer(&mut out, config)?
                .write_records(service.list(&query)?)?;
            info!(written, "listed site quotas");
        }
        Command::Set { id, quota } => report(&mut out, &service.set(id, &quota)?)?,
        Command::Add { id, delta } => report(&mut out, &service.add(id, &delta)?)?,
        Command::Subtract { id, delta } => report(&mut out, &service.subtract(id, &delta)?)?,
        Command::Network(command) => run_network(command, &database, &mut out)?,
    }

    Ok(())
}

fn run_network<W: Write>(
    command: NetworkCommand,
    database: &NetworkDatabase,
    out: &mut W,
) -> Result<()> {
    match command {
        NetworkCommand::Install { default_quota } => {
            let default_mb = default_quota.to_allocation_mb()?;
            database.install_network(default_mb)?;
            writeln!(
                out,
                "Success: Network installed with a default quota of {default_mb} MB."
            )?;
        }
        NetworkCommand::SetDefault { quota } => {
            let default_mb = quota.to_allocation_mb()?;
            database.set_network_default(default_mb)?;
            writeln!(out, "Success: Network default quota is now {default_mb} MB.")?;
        }
        NetworkCommand::CreateSite { domain, path } => {
            let blog_id = database.create_site(&domain, &path)?;
            writeln!(out, "Success: Site {blog_id} created.")?;
        }
        NetworkCommand::RecordUsage { id, bytes } => {
            database.record_usage(id, bytes)?;
            writeln!(out, "Success: Recorded {bytes} bytes for site {id}.")?;
        }
        NetworkCommand::SetFlag { id, flag, value } => {
            database.set_site_flag(id, flag, value)?;
            writeln!(out, "Success: Site {id} {flag} is now {}.", u8::from(value))?;
        }
    }
    Ok(())
}

fn report<W: Write>(out: &mut W, change: &QuotaChange) -> Result<()> {
    writeln!(out, "Success: {}", change.message())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use site_quota::{QuotaOperation, TenantDirectory};
    use tempfile::tempdir;

    use super::*;

    fn network(args: &[&str], database: &NetworkDatabase) -> String {
        let cli = Cli::try_parse_from(
            ["site-quota", "network"].iter().chain(args.iter()).copied(),
        )
        .unwrap();
        let Command::Network(command) = cli.command else {
            panic!("expected network command");
        };

        let mut out = Vec::new();
        run_network(command, database, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_list_thresholds_and_columns() {
        let cli = Cli::try_parse_from([
            "site-quota",
            "list",
            "--min-used-mb",
            "100",
            "--min-used-percent",
            "80",
            "--archived",
            "0",
            "--format",
            "json",
        ])
        .unwrap();

        let Command::List {
            thresholds,
            columns,
            output,
        } = cli.command
        else {
            panic!("expected list command");
        };
        assert_eq!(thresholds.min_used_mb, Some(100.0));
        assert_eq!(thresholds.min_used_percent, Some(80.0));
        assert_eq!(TenantListFilter::from(columns).archived, Some(false));
        assert_eq!(output.format, Some(OutputFormat::Json));
    }

    #[test]
    fn rejects_site_id_zero() {
        assert!(Cli::try_parse_from(["site-quota", "get", "0"]).is_err());
    }

    #[test]
    fn fields_and_field_conflict() {
        assert!(Cli::try_parse_from([
            "site-quota",
            "get",
            "1",
            "--fields",
            "url",
            "--field",
            "quota"
        ])
        .is_err());
    }

    #[test]
    fn report_prints_success_line() {
        let change = QuotaChange {
            tenant_id: 2,
            url: "http://example.test/blog/".to_string(),
            operation: QuotaOperation::Add,
            previous_mb: 100,
            allocation_mb: 150,
            override_cleared: false,
        };

        let mut out = Vec::new();
        report(&mut out, &change).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Success: Quota is now 150 MB for http://example.test/blog/.\n"
        );
    }

    #[test]
    fn network_commands_report_and_mutate() {
        let temp = tempdir().unwrap();
        let database = NetworkDatabase::new(temp.path().to_path_buf()).unwrap();

        assert_eq!(
            network(&["install", "--default-quota", "1g"], &database),
            "Success: Network installed with a default quota of 1024 MB.\n"
        );
        assert_eq!(
            network(&["create-site", "example.test"], &database),
            "Success: Site 1 created.\n"
        );
        assert_eq!(
            network(&["set-flag", "1", "archived", "true"], &database),
            "Success: Site 1 archived is now 1.\n"
        );

        let archived = database
            .list(&TenantListFilter {
                archived: Some(true),
                ..TenantListFilter::default()
            })
            .unwrap();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].blog_id, 1);

        let service = QuotaService::new(Arc::new(database));
        let change = service.set(1, "300").unwrap();
        let mut out = Vec::new();
        report(&mut out, &change).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Success: Quota is now 300 MB for http://example.test/.\n"
        );
    }

    #[test]
    fn rejects_unknown_site_flag() {
        let parsed = Cli::try_parse_from(["site-quota", "network", "set-flag", "1", "hidden", "1"]);
        assert!(parsed.is_err());
    }
}
