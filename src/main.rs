//! Lead Harvester main entry point
//!
//! Command-line interface for harvesting contact emails from business
//! websites. The hidden `worker` subcommand is the child side of the
//! per-site process boundary and is not meant to be run by hand.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use lead_harvester::config::{load_config_with_hash, Config};
use lead_harvester::detect::{HttpSiteDetector, SiteDetector};
use lead_harvester::leads::{
    EmailFilter, GooglePlacesClient, LeadPipeline, OpenRouterFilter, PassThroughFilter,
};
use lead_harvester::output::{
    generate_markdown_report, load_run_summary, summarize, write_leads_json, OutputHandler,
    SqliteOutputHandler,
};
use lead_harvester::storage::{open_storage, RunStatus};
use lead_harvester::url::parse_root;
use lead_harvester::worker::{emit_result, run_worker, WorkerSupervisor};
use lead_harvester::{CrawlResult, CrawlTarget};
use tracing_subscriber::EnvFilter;

/// Lead Harvester: contact emails for business leads
///
/// Looks up businesses through a places directory, crawls each website for
/// contact addresses (plain HTTP or a headless browser, whichever the site
/// needs) and keeps the addresses that belong to the business.
#[derive(Parser, Debug)]
#[command(name = "lead-harvester")]
#[command(version)]
#[command(about = "Harvests contact emails from business websites", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl one website in an isolated worker and print the outcome
    Scrape {
        url: String,

        /// Breadth-first levels to crawl, the root being level one
        #[arg(long)]
        depth: Option<u32>,

        /// Whole-crawl attempts before giving up
        #[arg(long)]
        retries: Option<u32>,

        /// Wall-clock limit for the worker, in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Run one crawl in this process and report on stdout
    #[command(hide = true)]
    Worker {
        url: String,
        depth: u32,
        retries: u32,
        snapshot: PathBuf,
    },

    /// Classify a website as static or script-rendered
    Detect { url: String },

    /// Search for businesses and harvest emails from each website
    Leads {
        query: String,

        /// Maximum number of businesses to process
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Keep every harvested email instead of asking the relevance filter
        #[arg(long)]
        no_filter: bool,
    },

    /// Write the Markdown report for a stored run
    ExportReport {
        /// Run to report on; defaults to the most recent run
        #[arg(long)]
        run: Option<i64>,
    },

    /// Validate the configuration and show the effective settings
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(cli.config.as_deref())?;

    match cli.command {
        Command::Scrape {
            url,
            depth,
            retries,
            timeout,
        } => handle_scrape(&config, cli.config, &url, depth, retries, timeout).await,
        Command::Worker {
            url,
            depth,
            retries,
            snapshot,
        } => handle_worker(&config, &url, depth, retries, snapshot).await,
        Command::Detect { url } => handle_detect(&config, &url).await,
        Command::Leads {
            query,
            limit,
            no_filter,
        } => handle_leads(&config, cli.config, &query, limit, no_filter).await,
        Command::ExportReport { run } => handle_export_report(&config, run),
        Command::CheckConfig => handle_check_config(&config),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs always go to stderr; a worker's stdout carries only its result line.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("lead_harvester=info,warn"),
            1 => EnvFilter::new("lead_harvester=debug,info"),
            2 => EnvFilter::new("lead_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn load_configuration(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::debug!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::debug!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

async fn handle_scrape(
    config: &Config,
    config_path: Option<PathBuf>,
    url: &str,
    depth: Option<u32>,
    retries: Option<u32>,
    timeout: Option<u64>,
) -> Result<()> {
    parse_root(url).with_context(|| format!("Invalid website URL: {}", url))?;

    let mut supervisor = WorkerSupervisor::from_config(config, config_path)?;
    if let Some(depth) = depth {
        supervisor = supervisor.with_depth(depth);
    }
    if let Some(retries) = retries {
        supervisor = supervisor.with_retries(retries);
    }
    if let Some(secs) = timeout {
        supervisor = supervisor.with_timeout(Duration::from_secs(secs));
    }

    let outcome = supervisor.scrape(url).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

/// Child side of the worker boundary; exits non-zero on a failed crawl
async fn handle_worker(
    config: &Config,
    url: &str,
    depth: u32,
    retries: u32,
    snapshot: PathBuf,
) -> Result<()> {
    let result = match CrawlTarget::new(url, depth, retries, snapshot) {
        Ok(target) => run_worker(config, &target).await,
        Err(e) => CrawlResult::error(e.to_string()),
    };

    let stdout = std::io::stdout();
    emit_result(&mut stdout.lock(), &result).context("Failed to write worker result")?;

    if !result.is_ok() {
        std::process::exit(1);
    }
    Ok(())
}

async fn handle_detect(config: &Config, url: &str) -> Result<()> {
    let root = parse_root(url).with_context(|| format!("Invalid website URL: {}", url))?;
    let detector = HttpSiteDetector::new(config.crawler.detect_timeout())?;

    let kind = detector.detect(&root).await;
    println!("{}", kind);
    Ok(())
}

async fn handle_leads(
    config: &Config,
    config_path: Option<PathBuf>,
    query: &str,
    limit: usize,
    no_filter: bool,
) -> Result<()> {
    let places = GooglePlacesClient::from_config(&config.places)?;
    let scraper = WorkerSupervisor::from_config(config, config_path)?;
    let filter: Box<dyn EmailFilter> = if no_filter || !config.filter.enabled {
        tracing::info!("Relevance filter disabled, keeping all emails");
        Box::new(PassThroughFilter)
    } else {
        Box::new(OpenRouterFilter::from_config(&config.filter)?)
    };

    let pipeline = LeadPipeline::new(Box::new(places), Box::new(scraper), filter);

    let mut store = match &config.output.database_path {
        Some(path) => {
            let storage = open_storage(Path::new(path))?;
            let handler = SqliteOutputHandler::start(storage, query)?;
            tracing::info!(run_id = handler.run_id(), database = %path, "Recording leads");
            Some(handler)
        }
        None => None,
    };

    let result = pipeline
        .run(query, limit, |lead| {
            if let Some(handler) = store.as_mut() {
                if let Err(e) = handler.record_lead(lead) {
                    tracing::warn!(business = %lead.place.name, error = %e, "Failed to record lead");
                }
            }
        })
        .await;

    let status = if result.is_ok() {
        RunStatus::Completed
    } else {
        RunStatus::Failed
    };
    if let Some(handler) = store.as_mut() {
        handler.finalize(status)?;
    }

    let leads = result?;

    let stdout = std::io::stdout();
    write_leads_json(&mut stdout.lock(), &leads)?;

    if let Some(report_path) = &config.output.report_path {
        let summary = summarize(query, leads);
        generate_markdown_report(&summary, Path::new(report_path))?;
        tracing::info!("Report written to: {}", report_path);
    }

    Ok(())
}

/// Writes the Markdown report for a stored run
fn handle_export_report(config: &Config, run_id: Option<i64>) -> Result<()> {
    let database_path = config
        .output
        .database_path
        .as_deref()
        .context("No database-path configured in [output]")?;
    let report_path = config
        .output
        .report_path
        .as_deref()
        .context("No report-path configured in [output]")?;

    let storage = open_storage(Path::new(database_path))?;

    tracing::info!("Loading lead data from database...");
    let summary = load_run_summary(&storage, run_id)?;
    generate_markdown_report(&summary, Path::new(report_path))?;

    println!("✓ Report exported to: {}", report_path);
    Ok(())
}

/// Prints the effective settings after validation
fn handle_check_config(config: &Config) -> Result<()> {
    let mut out = std::io::stdout().lock();

    writeln!(out, "=== Lead Harvester Configuration ===\n")?;

    writeln!(out, "Crawler:")?;
    writeln!(out, "  Max depth: {}", config.crawler.max_depth)?;
    writeln!(out, "  Max retries: {}", config.crawler.max_retries)?;
    writeln!(out, "  Request timeout: {}s", config.crawler.request_timeout_secs)?;
    writeln!(out, "  Detect timeout: {}s", config.crawler.detect_timeout_secs)?;
    writeln!(out, "  Worker timeout: {}s", config.crawler.worker_timeout_secs)?;
    writeln!(out, "  Snapshot dir: {}", config.crawler.snapshot_dir().display())?;

    writeln!(out, "\nBrowser:")?;
    writeln!(out, "  Headless: {}", config.browser.headless)?;
    writeln!(
        out,
        "  Executable: {}",
        config.browser.chrome_executable.as_deref().unwrap_or("(auto-detect)")
    )?;
    writeln!(out, "  Navigation timeout: {}ms", config.browser.navigation_timeout_ms)?;
    writeln!(out, "  Max anchors: {}", config.browser.max_anchors)?;

    writeln!(out, "\nUser Agent:")?;
    writeln!(out, "  {}", config.user_agent.header_value())?;

    writeln!(out, "\nPlaces:")?;
    writeln!(out, "  Endpoint: {}", config.places.endpoint)?;
    writeln!(out, "  Timeout: {}s", config.places.timeout_secs)?;
    writeln!(
        out,
        "  API key: ${} ({})",
        config.places.api_key_env,
        key_status(&config.places.api_key_env)
    )?;

    writeln!(out, "\nFilter:")?;
    writeln!(out, "  Enabled: {}", config.filter.enabled)?;
    writeln!(out, "  Endpoint: {}", config.filter.endpoint)?;
    writeln!(out, "  Model: {}", config.filter.model)?;
    writeln!(out, "  Timeout: {}s", config.filter.timeout_secs)?;
    writeln!(
        out,
        "  API key: ${} ({})",
        config.filter.api_key_env,
        key_status(&config.filter.api_key_env)
    )?;

    writeln!(out, "\nOutput:")?;
    writeln!(
        out,
        "  Database: {}",
        config.output.database_path.as_deref().unwrap_or("(none)")
    )?;
    writeln!(
        out,
        "  Report: {}",
        config.output.report_path.as_deref().unwrap_or("(none)")
    )?;

    writeln!(out, "\n✓ Configuration is valid")?;
    Ok(())
}

fn key_status(var_name: &str) -> &'static str {
    match std::env::var(var_name) {
        Ok(value) if !value.trim().is_empty() => "set",
        _ => "missing",
    }
}
