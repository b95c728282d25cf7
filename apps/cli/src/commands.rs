//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{SubsecRound, Utc};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use curator_core::{
    ChatCompletionsGenerator, ProgressReporter, RunContext, RunOutcome, Selection,
    preview_candidate, rebuild_site, run_once, site_output_dir,
};
use curator_feeds::{Enricher, HttpFeedSource, ImagePolicy, NoopEnricher, RedditJsonEnricher};
use curator_shared::{AppConfig, SelectionStrategy, init_config, load_config, resolve_config_path};
use curator_storage::{StatePaths, StateStore};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Curator: one curated article a day, published as a static site.
#[derive(Parser)]
#[command(
    name = "curator",
    version,
    about = "Select a trending feed entry, write an article about it, and rebuild the static site.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Path to curator.toml (defaults to ./curator.toml, then ~/.curator/curator.toml).
    #[arg(short, long, global = true, env = "CURATOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

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
    /// Run the daily pipeline: select, generate, save, rebuild.
    Run {
        /// Print the run report as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Rebuild the site from the stored article history.
    Build,

    /// Show which entry the next run would pick. Writes nothing.
    Select,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a default curator.toml.
    Init {
        /// Where to write it (defaults to ./curator.toml).
        #[arg(long)]
        path: Option<PathBuf>,
    },
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
        0 => "curator=info",
        1 => "curator=debug",
        _ => "curator=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

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
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Run { json } => cmd_run(config_path, json).await,
        Command::Build => cmd_build(config_path).await,
        Command::Select => cmd_select(config_path).await,
        Command::Config { action } => match action {
            ConfigAction::Init { path } => cmd_config_init(path.as_deref()).await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

// ---------------------------------------------------------------------------
// Collaborator wiring
// ---------------------------------------------------------------------------

fn feed_source(config: &AppConfig) -> Result<HttpFeedSource> {
    let timeout = Duration::from_secs(config.feeds.timeout_secs);
    Ok(HttpFeedSource::new(timeout, ImagePolicy::from_safety(&config.safety))?)
}

/// The Reddit JSON enricher under the momentum strategy, a no-op otherwise.
fn enricher(config: &AppConfig) -> Result<Box<dyn Enricher>> {
    match config.selection.strategy {
        SelectionStrategy::Momentum => {
            let timeout = Duration::from_secs(config.feeds.timeout_secs);
            let images = ImagePolicy::from_safety(&config.safety);
            Ok(Box::new(RedditJsonEnricher::new(timeout, images)?))
        }
        SelectionStrategy::Recency => Ok(Box::new(NoopEnricher)),
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config_path)?;

    // Missing API key fails here, before any network traffic.
    let generator = ChatCompletionsGenerator::from_app(&config)?;
    let feeds = feed_source(&config)?;
    let enricher = enricher(&config)?;
    let store = StateStore::open(StatePaths::from(&config.state))?;

    info!(
        feeds = config.feeds.urls.len(),
        strategy = ?config.selection.strategy,
        "starting daily run"
    );

    let ctx = RunContext {
        config: &config,
        store: &store,
        feeds: &feeds,
        enricher: enricher.as_ref(),
        generator: &generator,
    };

    let reporter = CliProgress::new();
    let outcome = match run_once(&ctx, &reporter).await {
        Ok(outcome) => outcome,
        Err(e) => {
            reporter.fail();
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.report)?);
        return Ok(());
    }

    let report = &outcome.report;
    println!();
    if report.created {
        println!("  Article published!");
        println!("  Title:   {}", report.article_title);
        println!("  URL:     {}", report.article_url);
        println!("  Source:  {}", report.source_url);
    } else {
        println!("  {}", report.note);
    }
    println!("  Site:    {}", outcome.site.output_dir.display());
    println!("  Files:   {}", outcome.site.files.len());
    println!("  Home:    {}", report.homepage_url);
    println!("  Time:    {:.1}s", outcome.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_build(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let store = StateStore::open_readonly(StatePaths::from(&config.state));

    info!(output = %site_output_dir(&config).display(), "rebuilding site");
    let build = rebuild_site(&config, &store, Utc::now().trunc_subsecs(0))?;

    println!();
    println!("  Site rebuilt.");
    println!("  Articles: {}", build.article_count);
    println!("  Files:    {}", build.files.len());
    println!("  Path:     {}", build.output_dir.display());
    println!();

    Ok(())
}

async fn cmd_select(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let store = StateStore::open_readonly(StatePaths::from(&config.state));
    let feeds = feed_source(&config)?;
    let enricher = enricher(&config)?;

    let Selection { candidate, stats } =
        preview_candidate(&config, &store, &feeds, enricher.as_ref()).await?;

    println!();
    match candidate {
        Some(c) => {
            println!("  Next candidate:");
            println!("  Title:     {}", c.entry.title);
            println!("  Link:      {}", c.canonical_link);
            if let Some(sub) = &c.entry.subreddit {
                println!("  Community: r/{sub}");
            }
            println!("  Momentum:  {}", c.momentum);
        }
        None => println!("  No eligible candidate."),
    }
    println!(
        "  Fetched {} entries from {} feeds ({} failed): {} processed, {} unsafe, {} near-duplicates, {} eligible",
        stats.fetched,
        config.feeds.urls.len(),
        stats.feeds_failed,
        stats.processed,
        stats.unsafe_entries,
        stats.near_duplicates,
        stats.eligible,
    );
    println!();

    Ok(())
}

async fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = init_config(path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    match resolve_config_path(config_path)? {
        Some(path) => println!("# {}", path.display()),
        None => println!("# no config file found, showing defaults"),
    }
    let config: AppConfig = load_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
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
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn fail(&self) {
        self.spinner.abandon_with_message("Run failed");
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _outcome: &RunOutcome) {
        self.spinner.finish_and_clear();
    }
}
