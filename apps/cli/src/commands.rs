//! CLI flag definitions, mode routing, and tracing setup.

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{ArgGroup, CommandFactory, Parser};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use regfetch_core::{
    AuditPipeline, BatchKind, BatchRequest, BatchScheduler, BatchSummary, Enumeration,
    ProgressReporter, enumerate,
};
use regfetch_shared::{
    AppConfig, FetchConfig, SessionCredential, StudentId, init_config, load_config,
    load_config_from,
};
use regfetch_storage::CacheTree;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// regfetch: fetch degree audits, catalogues, prerequisites and schedules.
#[derive(Parser, Debug)]
#[command(
    name = "regfetch",
    version,
    about = "Fetch degree audits and registrar pages into a local cache tree.",
    long_about = None,
    group(ArgGroup::new("mode").args([
        "cookie", "catalogue", "prereqs", "schedules", "init_config", "show_config",
    ])),
)]
pub(crate) struct Cli {
    /// Student id for the audit (resolved from the session when omitted).
    #[arg(long = "studentID", value_name = "ID", requires = "cookie")]
    pub student_id: Option<String>,

    /// Session cookie for the audit service.
    #[arg(long, value_name = "SESSION")]
    pub cookie: Option<String>,

    /// With --cookie: write the audit to the cache root instead of printing it.
    #[arg(long)]
    pub cache: bool,

    /// Fetch department catalogue pages.
    #[arg(long)]
    pub catalogue: bool,

    /// Fetch department prerequisite pages.
    #[arg(long)]
    pub prereqs: bool,

    /// Fetch the current term's schedule of classes.
    #[arg(long)]
    pub schedules: bool,

    /// With --schedules: also fetch past terms, skipping ones already cached.
    #[arg(long, requires = "schedules")]
    pub archive: bool,

    /// Restrict a batch to these departments (comma-separated).
    #[arg(short = 'd', value_name = "DEPTS", value_delimiter = ',', conflicts_with = "cookie")]
    pub departments: Vec<String>,

    /// Cache root (overrides `defaults.root_dir`).
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Config file (defaults to ~/.regfetch/regfetch.toml).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Pause before each batch fetch, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Academic years covered by --archive.
    #[arg(long, value_name = "N")]
    pub archive_years: Option<u32>,

    /// Write a default config file and exit.
    #[arg(long)]
    pub init_config: bool,

    /// Print the resolved configuration and exit.
    #[arg(long)]
    pub show_config: bool,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parse the process arguments, exiting with a usage error on bad combinations.
    pub(crate) fn parse_checked() -> Self {
        let cli = Self::parse();
        if let Err(err) = cli.check() {
            err.exit();
        }
        cli
    }

    /// Flag dependencies clap cannot express for boolean switches.
    pub(crate) fn check(&self) -> std::result::Result<(), clap::Error> {
        if self.cache && self.cookie.is_none() {
            return Err(Self::command().error(
                ErrorKind::MissingRequiredArgument,
                "--cache writes a degree audit and requires --cookie <SESSION>",
            ));
        }
        Ok(())
    }
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "regfetch=info",
        1 => "regfetch=debug",
        _ => "regfetch=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr; stdout carries the audit document.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Mode dispatch
// ---------------------------------------------------------------------------

/// Run the mode selected by the flags.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    if cli.init_config {
        return cmd_config_init();
    }

    let app_config = resolve_app_config(&cli)?;
    if cli.show_config {
        return cmd_config_show(&app_config);
    }

    let config = FetchConfig::from(&app_config);
    config.validate()?;

    if let Some(cookie) = cli.cookie.as_deref() {
        return cmd_audit(&config, cookie, cli.student_id.as_deref(), cli.cache).await;
    }

    let kind = if cli.catalogue {
        BatchKind::Catalogue
    } else if cli.prereqs {
        BatchKind::Prerequisites
    } else if cli.schedules {
        BatchKind::Schedules
    } else {
        println!("regfetch: nothing to do.");
        println!("Use --cookie <SESSION> [--studentID <ID>] [--cache] for a degree audit,");
        println!("or --catalogue, --prereqs, --schedules [--archive] with optional -d <DEPTS>.");
        println!("Run `regfetch --help` for all options.");
        return Ok(());
    };

    let request = BatchRequest {
        kind,
        departments: cli
            .departments
            .iter()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect(),
        archive: cli.archive,
        archive_years: config.archive_years,
    };
    cmd_batch(&config, &request).await
}

/// Config file (explicit or default) with flag overrides applied.
fn resolve_app_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    if let Some(root) = &cli.root {
        config.defaults.root_dir = root.to_string_lossy().into_owned();
    }
    if let Some(delay) = cli.delay_ms {
        config.defaults.request_delay_ms = delay;
    }
    if let Some(years) = cli.archive_years {
        config.defaults.archive_years = years;
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_audit(
    config: &FetchConfig,
    cookie: &str,
    student_id: Option<&str>,
    cache: bool,
) -> Result<()> {
    let credential = SessionCredential::new(cookie)?;
    let student_id = student_id.map(StudentId::parse).transpose()?;

    info!(cache, supplied_id = student_id.is_some(), "retrieving degree audit");

    let pipeline = AuditPipeline::from_config(config, credential)?;
    let document = pipeline
        .retrieve(student_id)
        .await
        .wrap_err("unable to fetch the degree audit")?;

    if cache {
        let path = CacheTree::new(&config.root_dir)
            .write_audit_report(&document.record.student_id, &document.body)?;
        println!("Audit written to: {}", path.display());
    } else {
        println!("{}", document.body);
    }
    Ok(())
}

async fn cmd_batch(config: &FetchConfig, request: &BatchRequest) -> Result<()> {
    let scheduler = BatchScheduler::from_config(config)?;

    info!(
        kind = ?request.kind,
        departments = request.departments.len(),
        archive = request.archive,
        root = %config.root_dir.display(),
        "starting batch"
    );

    let plan = match enumerate(scheduler.registrar(), request)
        .await
        .wrap_err("unable to list departments")?
    {
        Enumeration::Ready(plan) => plan,
        Enumeration::NotInSession(term) => {
            println!("Schedules are not currently available: term {term} is not in session.");
            return Ok(());
        }
    };

    let reporter = CliProgress::new();
    let summary = scheduler
        .run(&plan, &reporter)
        .await
        .wrap_err("batch fetch aborted")?;

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    println!();
    println!("  Fetched: {}", summary.fetched);
    println!("  Skipped: {}", summary.skipped);
    println!("  Time:    {:.1}s", summary.duration.as_secs_f64());
    println!();
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Batch progress bar; the prefix shows the task being fetched.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{prefix:<13} [{bar:40.cyan/blue}] {pos}/{len} {elapsed}")
                .expect("progress template")
                .progress_chars("=> "),
        );
        bar.set_prefix("LOADING");
        Self { bar }
    }
}

impl ProgressReporter for CliProgress {
    fn start(&self, total: u64) {
        self.bar.set_length(total);
    }

    fn advance(&self, label: &str) {
        self.bar.set_prefix(label.to_string());
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.set_prefix("DONE");
        self.bar.inc(1);
        self.bar.finish();
    }
}
