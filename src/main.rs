//! Listing Harvester main entry point
//!
//! This is the command-line interface for the incremental listing crawler.

use anyhow::Context;
use clap::Parser;
use listing_harvester::config::{load_config_with_hash, validate, Config};
use listing_harvester::crawler::{build_http_client, run_crawl, HttpFetcher};
use listing_harvester::output::{load_statistics, print_report, print_statistics};
use listing_harvester::url::ListingQuery;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit code for a crawl that ended in the aborted phase
const EXIT_ABORTED: u8 = 2;

/// Listing Harvester: an incremental product listing crawler
///
/// Crawls a paginated product listing page by page and appends every product
/// not seen in an earlier run to a JSON-lines result log.
#[derive(Parser, Debug)]
#[command(name = "listing-harvester")]
#[command(version = "1.0.0")]
#[command(about = "An incremental product listing crawler", long_about = None)]
struct Cli {
    /// Listing page URL, e.g. www.icanvas.com/canvas-art-prints/tag/dogs
    #[arg(value_name = "LISTING_URL", required_unless_present = "stats")]
    listing_url: Option<String>,

    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Stop after this many pages
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Delay between page requests in milliseconds
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show the configuration and the first page request without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the result log and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = load_effective_config(&cli)?;

    if cli.stats {
        handle_stats(&config)?;
        return Ok(ExitCode::SUCCESS);
    }

    let listing_url = cli
        .listing_url
        .as_deref()
        .context("a listing URL is required")?;

    if cli.dry_run {
        handle_dry_run(&config, listing_url)?;
        Ok(ExitCode::SUCCESS)
    } else {
        handle_crawl(&config, listing_url).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_harvester=info,warn"),
            1 => EnvFilter::new("listing_harvester=debug,info"),
            2 => EnvFilter::new("listing_harvester=trace,debug"),
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

/// Loads the config file (if any) and applies command-line overrides
fn load_effective_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = Some(max_pages);
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.crawler.request_delay_ms = delay_ms;
    }

    validate(&config).context("invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config, listing_url: &str) -> anyhow::Result<()> {
    let query = ListingQuery::from_listing_url(listing_url)?;
    let fetcher = HttpFetcher::new(build_http_client(config)?, config)?;

    println!("=== Listing Harvester Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Page size: {}", config.crawler.page_size);
    match config.crawler.max_pages {
        Some(max) => println!("  Max pages: {}", max),
        None => println!("  Max pages: unbounded"),
    }
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!(
        "  Fetch attempts per page: {} (backoff {}ms)",
        config.crawler.max_retries, config.crawler.retry_backoff_ms
    );

    println!("\nSource:");
    println!("  Endpoint: {}", config.source.endpoint);
    if let Some(bootstrap) = &config.source.bootstrap_url {
        println!("  Session bootstrap: {}", bootstrap);
    }
    println!("  User agents in pool: {}", fetcher.agents().len());

    println!("\nOutput:");
    println!("  Result log: {}", config.output.result_log_path);
    println!("  Error log: {}", config.output.error_log_path);

    println!("\nQuery: {}", query);
    println!("First request: {}", fetcher.page_url(&query, 1));

    Ok(())
}

/// Handles the --stats mode: summarizes the result log
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let path = Path::new(&config.output.result_log_path);
    println!("Result log: {}\n", path.display());

    let stats = load_statistics(path)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, listing_url: &str) -> anyhow::Result<ExitCode> {
    tracing::info!("Starting crawl of {}", listing_url);

    let report = run_crawl(config, listing_url).await?;
    print_report(&report);

    if report.is_aborted() {
        Ok(ExitCode::from(EXIT_ABORTED))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
