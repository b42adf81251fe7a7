//! Top-level CLI definition and dispatch.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::json;

use syslog_query_helper::core::config::Config;
use syslog_query_helper::core::errors::{Result, SqhError};
use syslog_query_helper::daemon::loop_main::RetentionDaemon;
use syslog_query_helper::query::filter::{FilterSet, TextFilterColumn};
use syslog_query_helper::query::validate::{
    validate_date_range, validate_facilities, validate_message_terms, validate_pagination,
    validate_severities,
};
use syslog_query_helper::store::columns;
use syslog_query_helper::store::db::{DistinctValues, EventStore};
use syslog_query_helper::store::detect::detect_priority_mode;
use syslog_query_helper::store::entry::LogEntry;

/// syslog_query_helper — reconciled queries over rsyslog SystemEvents.
#[derive(Debug, Parser)]
#[command(
    name = "sqh",
    author,
    version,
    about = "Syslog Query Helper - reconciled SystemEvents queries and retention",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity (full error details).
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (rows only, no headers).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// Whether full error details were requested.
    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Run the retention daemon.
    Daemon,
    /// Query log entries with filters and pagination.
    Query(QueryArgs),
    /// Count entries matching the filters.
    Count(CountArgs),
    /// Distinct values for a column under the same filters.
    Meta(MetaArgs),
    /// List columns the meta command accepts.
    Columns,
    /// Detect the dataset's priority-column format.
    Detect,
    /// Create the SystemEvents table and indexes if missing.
    Init,
    /// View configuration state.
    Config(ConfigArgs),
    /// Show version information.
    Version,
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Filter dimensions shared by query, count, and meta.
#[derive(Debug, Clone, Args, Default)]
struct FilterParams {
    /// Window start, RFC 3339 (default: 24h ago).
    #[arg(long, value_name = "RFC3339")]
    start_date: Option<String>,
    /// Window end, RFC 3339 (default: now).
    #[arg(long, value_name = "RFC3339")]
    end_date: Option<String>,
    /// Severity 0-7 (repeatable).
    #[arg(long = "severity", value_name = "0-7")]
    severity: Vec<String>,
    /// Deprecated alias for --severity; ignored when --severity is present.
    #[arg(long = "priority", value_name = "0-7")]
    priority: Vec<String>,
    /// Facility 0-23 (repeatable).
    #[arg(long = "facility", value_name = "0-23")]
    facility: Vec<String>,
    /// Origin host (repeatable).
    #[arg(long = "host", value_name = "HOST")]
    host: Vec<String>,
    /// Message substring, min 2 chars (repeatable, OR-combined).
    #[arg(long = "message", value_name = "TERM")]
    message: Vec<String>,
    /// Syslog tag (repeatable).
    #[arg(long = "tag", value_name = "TAG")]
    tag: Vec<String>,
}

impl FilterParams {
    /// Validate every dimension and compile the filter set.
    fn compile(&self) -> Result<FilterSet> {
        let range = validate_date_range(self.start_date.as_deref(), self.end_date.as_deref())?;
        let severities = validate_severities(&self.severity, &self.priority)?;
        let facilities = validate_facilities(&self.facility)?;
        let terms = validate_message_terms(&self.message)?;

        let mut filter = FilterSet::new();
        filter
            .date_range(range)
            .text_values(TextFilterColumn::FromHost, &self.host)
            .severities(&severities)
            .facilities(&facilities)
            .message_terms(&terms)
            .text_values(TextFilterColumn::SysLogTag, &self.tag);
        Ok(filter)
    }
}

#[derive(Debug, Clone, Args, Default)]
struct QueryArgs {
    #[command(flatten)]
    filters: FilterParams,
    /// Page size, 1-1000 (default 10).
    #[arg(long, value_name = "N")]
    limit: Option<String>,
    /// Rows to skip (default 0).
    #[arg(long, value_name = "N")]
    offset: Option<String>,
}

#[derive(Debug, Clone, Args, Default)]
struct CountArgs {
    #[command(flatten)]
    filters: FilterParams,
}

#[derive(Debug, Clone, Args)]
struct MetaArgs {
    /// Column to list distinct values for (see `sqh columns`).
    #[arg(value_name = "COLUMN")]
    column: String,
    #[command(flatten)]
    filters: FilterParams,
}

#[derive(Debug, Clone, Args, Default)]
struct ConfigArgs {
    /// Config operation to run.
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print resolved config file path.
    Path,
    /// Print effective merged configuration.
    Show,
    /// Validate configuration and exit.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, value_name = "SHELL")]
    shell: CompletionShell,
}

/// Dispatch the parsed CLI.
pub fn run(cli: &Cli) -> Result<()> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Daemon => run_daemon(cli),
        Command::Query(args) => run_query(cli, args),
        Command::Count(args) => run_count(cli, args),
        Command::Meta(args) => run_meta(cli, args),
        Command::Columns => run_columns(cli),
        Command::Detect => run_detect(cli),
        Command::Init => run_init(cli),
        Command::Config(args) => run_config(cli, args),
        Command::Version => run_version(cli),
        Command::Completions(args) => {
            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "sqh", &mut io::stdout());
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    Config::load(cli.config.as_deref())
}

fn open_store(config: &Config) -> Result<EventStore> {
    EventStore::open(
        &config.database.path,
        Duration::from_millis(config.database.busy_timeout_ms),
    )
}

// ──────────────────── daemon ────────────────────

fn run_daemon(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let mut daemon = RetentionDaemon::init(config)?;
    daemon.run()
}

// ──────────────────── query / count ────────────────────

fn run_query(cli: &Cli, args: &QueryArgs) -> Result<()> {
    let config = load_config(cli)?;
    let page = validate_pagination(args.limit.as_deref(), args.offset.as_deref())?;
    let filter = args.filters.compile()?;

    let store = open_store(&config)?;
    let result = store.logs_page(&filter, page.limit, page.offset)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if !cli.quiet {
        println!(
            "{}",
            format!(
                "total {} (showing {}, offset {})",
                result.total,
                result.rows.len(),
                result.offset
            )
            .bold()
        );
    }
    for row in &result.rows {
        println!("{}", render_row(row));
    }
    Ok(())
}

fn render_row(row: &LogEntry) -> String {
    let origin = format!("{}.{}", row.facility_label, row.severity_label);
    let origin = match row.severity {
        0..=3 => origin.red(),
        4 => origin.yellow(),
        _ => origin.normal(),
    };
    format!(
        "{}  {}  {}  {}{}",
        row.received_at,
        row.from_host,
        origin,
        row.syslog_tag.as_deref().unwrap_or(""),
        row.message,
    )
}

fn run_count(cli: &Cli, args: &CountArgs) -> Result<()> {
    let config = load_config(cli)?;
    let filter = args.filters.compile()?;
    let store = open_store(&config)?;
    let total = store.count_logs(&filter)?;

    if cli.json {
        println!("{}", json!({ "total": total }));
    } else {
        println!("{total}");
    }
    Ok(())
}

// ──────────────────── meta ────────────────────

fn run_meta(cli: &Cli, args: &MetaArgs) -> Result<()> {
    let config = load_config(cli)?;
    let filter = args.filters.compile()?;
    let store = open_store(&config)?;
    let values = store.distinct_values(&args.column, &filter)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&values)?);
        return Ok(());
    }

    match values {
        DistinctValues::Labeled(values) => {
            for value in values {
                println!("{:>4}  {}", value.val, value.label);
            }
        }
        DistinctValues::Integers(values) => {
            for value in values {
                println!("{value}");
            }
        }
        DistinctValues::Texts(values) => {
            for value in values {
                println!("{value}");
            }
        }
    }
    Ok(())
}

fn run_columns(cli: &Cli) -> Result<()> {
    let names = columns::available_columns();
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "available_columns": names,
                "usage": "sqh meta <COLUMN> to get distinct values for a column",
            }))?
        );
        return Ok(());
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

// ──────────────────── detect / init ────────────────────

fn run_detect(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let store = open_store(&config)?;
    let detection = detect_priority_mode(&store);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&detection)?);
        return Ok(());
    }

    println!("mode: {}", detection.mode.to_string().bold());
    println!(
        "samples: oldest={} newest={}",
        detection
            .oldest
            .map_or_else(|| "none".to_string(), |v| v.to_string()),
        detection
            .newest
            .map_or_else(|| "none".to_string(), |v| v.to_string()),
    );
    if detection.degraded {
        println!(
            "{}",
            "no non-kernel rows to sample; legacy assumed".yellow()
        );
    }
    Ok(())
}

fn run_init(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let store = open_store(&config)?;
    store.ensure_schema()?;

    if cli.json {
        println!(
            "{}",
            json!({ "database": store.path(), "schema": "ready" })
        );
    } else if !cli.quiet {
        println!("schema ready at {}", store.path().display());
    }
    Ok(())
}

// ──────────────────── config / version ────────────────────

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<()> {
    match args.command.as_ref().unwrap_or(&ConfigCommand::Show) {
        ConfigCommand::Path => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(Config::default_path);
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommand::Show => {
            let config = load_config(cli)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                let rendered =
                    toml::to_string_pretty(&config).map_err(|e| SqhError::Serialization {
                        context: "toml",
                        details: e.to_string(),
                    })?;
                print!("{rendered}");
            }
            Ok(())
        }
        ConfigCommand::Validate => {
            let config = load_config(cli)?;
            if cli.json {
                println!(
                    "{}",
                    json!({ "valid": true, "hash": config.stable_hash()? })
                );
            } else {
                println!("{} (hash {})", "config valid".green(), config.stable_hash()?);
            }
            Ok(())
        }
    }
}

fn run_version(cli: &Cli) -> Result<()> {
    if cli.json {
        println!(
            "{}",
            json!({
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            })
        );
    } else {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_query_with_repeatable_filters() {
        let cli = Cli::parse_from([
            "sqh",
            "query",
            "--severity",
            "3",
            "--severity",
            "4",
            "--facility",
            "0",
            "--message",
            "disk",
            "--limit",
            "50",
        ]);
        let Command::Query(args) = &cli.command else {
            panic!("expected query command");
        };
        assert_eq!(args.filters.severity, vec!["3", "4"]);
        assert_eq!(args.filters.facility, vec!["0"]);
        assert_eq!(args.limit.as_deref(), Some("50"));
    }

    #[test]
    fn filter_params_compile_to_predicates() {
        let params = FilterParams {
            start_date: Some("2025-02-15T10:00:00Z".to_string()),
            end_date: Some("2025-02-16T10:00:00Z".to_string()),
            severity: vec!["3".to_string()],
            priority: vec![],
            facility: vec!["4".to_string()],
            host: vec!["web01".to_string()],
            message: vec!["disk".to_string()],
            tag: vec![],
        };
        let filter = params.compile().unwrap();
        let (expr, args) = filter.build();
        assert!(expr.starts_with("ReceivedAt BETWEEN"));
        assert!(expr.contains("Priority % 8 IN (?)"));
        assert!(expr.contains("FromHost IN (?)"));
        assert_eq!(expr.matches('?').count(), args.len());
    }

    #[test]
    fn invalid_filter_value_fails_compile() {
        let params = FilterParams {
            severity: vec!["12".to_string()],
            ..FilterParams::default()
        };
        let err = params.compile().unwrap_err();
        assert_eq!(err.code(), "SQH-2002");
    }

    #[test]
    fn priority_alias_reaches_validator() {
        let cli = Cli::parse_from(["sqh", "count", "--priority", "5"]);
        let Command::Count(args) = &cli.command else {
            panic!("expected count command");
        };
        let filter = args.filters.compile().unwrap();
        let (expr, _) = filter.build();
        assert!(expr.contains("Priority % 8 IN (?)"));
    }

    #[test]
    fn verify_cli_structure() {
        Cli::command().debug_assert();
    }
}
