//! Fence-Crawl main entry point
//!
//! This is the command-line interface for the Fence-Crawl crawler.

use clap::Parser;
use fence_crawl::config::{load_config_with_hash, validate, Config};
use fence_crawl::crawler::Coordinator;
use fence_crawl::output::print_summary;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Fence-Crawl: a bounded-domain concurrent web crawler
///
/// Fence-Crawl starts from a seed URL and follows every link whose host
/// matches the configured domain suffix, visiting each URL exactly once.
#[derive(Parser, Debug)]
#[command(name = "fence-crawl")]
#[command(version)]
#[command(about = "A bounded-domain concurrent web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the configured number of workers
    #[arg(long, value_name = "N")]
    workers: Option<u32>,

    /// Override the configured seed URL
    #[arg(long, value_name = "URL")]
    seed: Option<String>,

    /// Ignore the configured response cache
    #[arg(long)]
    no_cache: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    let config = apply_overrides(config, &cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    // Fail before any crawling if the runtime cannot get its threads
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            tracing::error!("Failed to start async runtime: {}", e);
            e
        })?;

    runtime.block_on(handle_crawl(config, cli.quiet))
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fence_crawl=info,warn"),
            1 => EnvFilter::new("fence_crawl=debug,info"),
            2 => EnvFilter::new("fence_crawl=trace,debug"),
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

/// Applies command-line overrides and re-validates
fn apply_overrides(mut config: Config, cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    if let Some(workers) = cli.workers {
        config.crawler.worker_count = workers;
    }
    if let Some(seed) = &cli.seed {
        config.crawler.seed_url = seed.clone();
    }
    if cli.no_cache {
        config.cache = None;
    }

    validate(&config)?;
    Ok(config)
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Fence-Crawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed URL: {}", config.crawler.seed_url);
    println!("  Domain suffix: {}", config.crawler.domain_suffix);
    println!("  Host match: {:?}", config.crawler.host_match);
    println!("  Workers: {}", config.crawler.worker_count);
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.value);

    println!("\nResponse Cache:");
    match &config.cache {
        Some(cache) => {
            println!("  Directory: {}", cache.directory);
            println!("  Max bytes: {}", cache.max_bytes);
        }
        None => println!("  Disabled"),
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, quiet: bool) -> Result<(), Box<dyn std::error::Error>> {
    let coordinator = match Coordinator::new(config).await {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to initialize crawler: {}", e);
            return Err(e.into());
        }
    };

    // Ctrl-C stops all workers; the summary still gets printed
    let token = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping workers");
            token.cancel();
        }
    });

    match coordinator.run().await {
        Ok(summary) => {
            if !quiet {
                print_summary(&summary);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
