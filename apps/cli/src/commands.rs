//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use rosterlink_core::{ProgressEvent, ProgressReporter, RunOptions, run_roster};
use rosterlink_directory::{SlackDirectory, SlackOptions};
use rosterlink_search::HtmlSearchClient;
use rosterlink_shared::{
    AppConfig, RunSummary, SearchOptions, init_config, load_config, load_config_from,
    resolve_credentials, validate_store_target,
};
use rosterlink_storage::{AirtableStore, CsvExporter, RosterSink};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// RosterLink: find your workspace members on LinkedIn.
#[derive(Parser)]
#[command(
    name = "rosterlink",
    version,
    about = "Match Slack workspace members to LinkedIn profiles and store them in Airtable.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.rosterlink/rosterlink.toml.
    #[arg(long, env = "ROSTERLINK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Resolve every workspace member and persist the results.
    Run(RunArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `rosterlink run`. Each overrides the config file.
#[derive(clap::Args, Debug, Default)]
pub(crate) struct RunArgs {
    /// Airtable base to write to.
    #[arg(long, env = "AIRTABLE_BASE_ID")]
    pub base_id: Option<String>,

    /// Airtable table name.
    #[arg(long)]
    pub table: Option<String>,

    /// CSV export destination.
    #[arg(long)]
    pub csv_out: Option<PathBuf>,

    /// Write a member snapshot (parsed fields only) as JSON before resolving.
    #[arg(long)]
    pub dump_members: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "rosterlink=info",
        1 => "rosterlink=debug",
        _ => "rosterlink=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

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
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match cli.command {
        Command::Run(args) => cmd_run(config, &args).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&config).await,
        },
    }
}

/// Fold `rosterlink run` flags into the loaded config.
fn apply_overrides(mut config: AppConfig, args: &RunArgs) -> AppConfig {
    if let Some(base_id) = &args.base_id {
        config.airtable.base_id = base_id.clone();
    }
    if let Some(table) = &args.table {
        config.airtable.table_name = table.clone();
    }
    if let Some(csv_out) = &args.csv_out {
        config.output.csv_path = csv_out.to_string_lossy().into_owned();
    }
    if let Some(dump) = &args.dump_members {
        config.output.members_snapshot = Some(dump.to_string_lossy().into_owned());
    }
    config
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(config: AppConfig, args: &RunArgs) -> Result<()> {
    let config = apply_overrides(config, args);
    validate_store_target(&config)?;
    let credentials = resolve_credentials(&config)?;

    let directory = SlackDirectory::new(
        credentials.slack_token,
        SlackOptions::from(&config.slack),
    )?;
    let search = HtmlSearchClient::new(SearchOptions::from(&config))?;
    let store = AirtableStore::new(credentials.airtable_api_key, &config.airtable)?;
    let sink = RosterSink::new(store, CsvExporter::new(&config.output.csv_path));

    let options = RunOptions {
        members_snapshot: config.output.members_snapshot.as_ref().map(PathBuf::from),
    };

    info!(
        base_id = %config.airtable.base_id,
        table = %config.airtable.table_name,
        csv = %config.output.csv_path,
        "starting roster run"
    );

    let reporter = CliProgress::new();
    let summary = run_roster(&directory, &search, &sink, &reporter, &options)
        .await
        .map_err(|e| eyre!("Process failed: {e}"))?;

    print_summary(&summary, &config.output.csv_path);
    Ok(())
}

fn print_summary(summary: &RunSummary, csv_path: &str) {
    println!();
    println!("  Process completed successfully!");
    println!("  Run:       {}", summary.run_id);
    println!("  Team:      {}", summary.team_name);
    println!("  Members:   {}", summary.members_total);
    println!("  Records:   {}", summary.records.len());
    println!("  Found:     {}", summary.found());
    println!("  Not found: {}", summary.not_found());
    println!("  Errors:    {}", summary.errors());
    println!("  CSV:       {csv_path}");
    println!("  Airtable:  {}", summary.store_link);
    println!("  Time:      {:.1}s", summary.elapsed.as_secs_f64());
    println!();
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn report(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::State(_) | ProgressEvent::RecordPersisted { .. } => {}
            ProgressEvent::FallbackSearch { .. } | ProgressEvent::ResolutionFailed { .. } => {
                self.spinner.println(event.to_string());
            }
            ProgressEvent::Completed { .. } | ProgressEvent::Failed { .. } => {
                self.spinner.finish_and_clear();
            }
            _ => self.spinner.set_message(event.to_string()),
        }
    }
}
