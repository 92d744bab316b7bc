//! Archive-Weaver main entry point
//!
//! This is the command-line interface for the Archive-Weaver archive crawler.

use anyhow::Context;
use archive_weaver::config::{load_config_with_hash, validate, Config};
use archive_weaver::crawler::{run_crawl, run_incremental, PeriodFilter};
use archive_weaver::mbox::import_mbox_directory;
use archive_weaver::output::{print_summary, RunSummary};
use archive_weaver::Period;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Archive-Weaver: a resumable mailing-list archive crawler
///
/// Crawls a month-paginated mailing-list web archive (or imports local
/// mailbox files) into a newline-delimited JSON record log with
/// reconstructed conversation threads.
#[derive(Parser, Debug)]
#[command(name = "archive-weaver")]
#[command(version)]
#[command(about = "A resumable mailing-list archive crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl the web archive, skipping periods completed by earlier runs
    Scrape {
        /// Skip periods before this one (YYYY/MM)
        #[arg(long, value_name = "YYYY/MM")]
        from: Option<Period>,

        /// Crawl only this period (YYYY/MM)
        #[arg(long, value_name = "YYYY/MM")]
        only: Option<Period>,
    },

    /// Resume from the latest completed period
    Incremental,

    /// Import a directory of .mbox files instead of crawling
    Mbox {
        /// Directory containing the mailbox files
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(cli.config.as_deref())?;

    let summary = match cli.command {
        Command::Scrape { from, only } => run_crawl(config, PeriodFilter { from, only })
            .await
            .context("crawl aborted")?,
        Command::Incremental => run_incremental(config)
            .await
            .context("incremental crawl aborted")?,
        Command::Mbox { dir } => import_mbox_directory(&config, &dir)
            .with_context(|| format!("import of {} aborted", dir.display()))?,
    };

    report(&summary, cli.quiet);
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("archive_weaver=info,warn"),
            1 => EnvFilter::new("archive_weaver=debug,info"),
            2 => EnvFilter::new("archive_weaver=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file if one was given, otherwise the defaults
fn load_configuration(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using defaults");
        let config = Config::default();
        validate(&config)?;
        return Ok(config);
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

fn report(summary: &RunSummary, quiet: bool) {
    if !quiet {
        print_summary(summary);
    }
}
