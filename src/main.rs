//! Site-Folio main entry point
//!
//! This is the command-line interface for the Site-Folio page archiver.

use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;
use site_folio::config::{load_config_with_hash, validate, Config};
use site_folio::crawler::Coordinator;
use site_folio::output::{
    load_statistics, print_statistics, print_summary, write_markdown_report, ReportContext,
    REPORT_FILE_NAME,
};
use site_folio::policy::{prompt_policy, resolve_mode, FolderPolicy};
use site_folio::render::{ChromiumOptions, ChromiumRenderer, Renderer};
use site_folio::storage::{open_storage, Storage};
use site_folio::{normalize, FolioError};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Site-Folio: archive every page of a website as PDF
///
/// Site-Folio crawls all pages of one host reachable from the given URL,
/// renders each through a headless browser and saves it as a PDF. Pages
/// whose content has not changed since the last run are not written again.
#[derive(Parser, Debug)]
#[command(name = "site-folio")]
#[command(version)]
#[command(about = "Archive every page of a website as PDF", long_about = None)]
struct Cli {
    /// Starting URL (e.g. example.com or https://example.com/docs)
    #[arg(value_name = "URL")]
    url: String,

    /// Output directory for PDFs (default: results/{host}-pdfs)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Number of parallel render workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// How to treat an existing output folder
    #[arg(short, long, value_enum, default_value_t = FolderPolicy::Ask)]
    mode: FolderPolicy,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Per-page render timeout in seconds
    #[arg(short, long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Stop after this many pages (0 = unlimited)
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show statistics from the hash database and exit
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = load_settings(&cli)?;

    let seed = normalize(&cli.url, None).map_err(FolioError::InvalidSeed)?;
    let output_dir = config.output.resolve_directory(&seed);
    let database_path = config.output.resolve_database_path(&output_dir);

    if cli.stats {
        return handle_stats(&database_path);
    }

    let folder_exists = output_dir.exists();
    let policy = if cli.mode == FolderPolicy::Ask && !std::io::stdin().is_terminal() {
        tracing::warn!("No terminal to ask on, using append mode");
        FolderPolicy::Append
    } else {
        cli.mode
    };
    let mode = match resolve_mode(policy, folder_exists, || prompt_policy(&output_dir))? {
        Some(mode) => mode,
        None => {
            println!("Aborted: {} left unchanged", output_dir.display());
            return Ok(());
        }
    };

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    if let Some(parent) = database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let storage: Arc<Mutex<dyn Storage>> = Arc::new(Mutex::new(open_storage(&database_path)?));

    handle_crawl(&cli.url, config, config_hash, mode, storage).await
}

/// Loads the config file (if any) and applies command-line overrides
fn load_settings(cli: &Cli) -> anyhow::Result<(Config, String)> {
    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::debug!("Configuration loaded (hash: {})", hash);
            (config, hash)
        }
        None => (Config::default(), String::new()),
    };

    if let Some(output) = &cli.output {
        config.output.directory = Some(output.clone());
    }
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }
    if let Some(timeout) = cli.timeout {
        config.crawler.render_timeout_secs = timeout;
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if cli.headful {
        config.browser.headless = false;
    }

    validate(&config)?;
    Ok((config, config_hash))
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_folio=info,warn"),
            1 => EnvFilter::new("site_folio=debug,info"),
            2 => EnvFilter::new("site_folio=trace,debug"),
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

/// Handles the --stats mode: shows statistics from the hash database
fn handle_stats(database_path: &std::path::Path) -> anyhow::Result<()> {
    if !database_path.exists() {
        println!("No archive database at {}", database_path.display());
        return Ok(());
    }

    println!("Database: {}\n", database_path.display());
    let storage = open_storage(database_path)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    seed: &str,
    config: Config,
    config_hash: String,
    mode: site_folio::ExportMode,
    storage: Arc<Mutex<dyn Storage>>,
) -> anyhow::Result<()> {
    let options = ChromiumOptions {
        chrome_path: config.browser.chrome_path.clone(),
        headless: config.browser.headless,
    };
    let browser = Arc::new(
        ChromiumRenderer::launch(&options)
            .await
            .context("Render engine unavailable")?,
    );
    let renderer: Arc<dyn Renderer> = browser.clone();

    let coordinator = Coordinator::new(seed, &config, mode, renderer, storage)?
        .with_config_hash(config_hash.clone());
    let output_dir = coordinator.output_dir();

    let stop = coordinator.stop_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.stop("interrupted");
        }
    });

    let started_at = Utc::now();
    let start_time = Instant::now();
    let seed_url = coordinator.seed().to_string();
    let (run_id, summary) = coordinator.run().await?;

    interrupt.abort();
    let _ = interrupt.await;

    print_summary(&summary);

    if config.output.report {
        let context = ReportContext {
            run_id,
            seed_url,
            mode: mode.to_string(),
            workers: config.crawler.workers,
            started_at: started_at.to_rfc3339(),
            finished_at: Utc::now().to_rfc3339(),
            duration_seconds: start_time.elapsed().as_secs(),
            config_hash,
        };
        let report_path = output_dir.join(REPORT_FILE_NAME);
        match write_markdown_report(&summary, &context, &report_path) {
            Ok(()) => tracing::info!("Report written to {}", report_path.display()),
            Err(e) => tracing::warn!("Failed to write report: {}", e),
        }
    }

    match Arc::try_unwrap(browser) {
        Ok(browser) => browser.shutdown().await,
        Err(_) => tracing::warn!("Browser still in use, not shutting down cleanly"),
    }

    if let Some(reason) = &summary.aborted {
        bail!("Run stopped early: {}", reason);
    }

    Ok(())
}
