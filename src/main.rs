//! Lex-Archiver main entry point
//!
//! This is the command-line interface for the Lex-Archiver statute crawler.

use clap::Parser;
use lex_archiver::config::{load_config_with_hash, Config};
use lex_archiver::crawler::Coordinator;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Lex-Archiver: a resumable, polite crawler for statutory documents
///
/// Lex-Archiver walks government legislation sites breadth-first, archives
/// the pages holding legal text and checkpoints its progress so an
/// interrupted crawl resumes where it stopped.
#[derive(Parser, Debug)]
#[command(name = "lex-archiver")]
#[command(version = "1.0.0")]
#[command(about = "A resumable, polite crawler for statutory documents", long_about = None)]
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

    /// Start a fresh crawl, ignoring the checkpoint
    #[arg(long)]
    fresh: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    handle_crawl(config, config_hash, cli.fresh).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("lex_archiver=info,warn"),
            1 => EnvFilter::new("lex_archiver=debug,info"),
            2 => EnvFilter::new("lex_archiver=trace,debug"),
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

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: String,
    fresh: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Sources: {}, seeds: {}, max depth: {}",
        config
            .sources
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        config.crawler.seeds.len(),
        config.crawler.max_depth
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current page");
            let _ = stop_tx.send(true);
        }
    });

    let mut coordinator = match Coordinator::new(config, fresh) {
        Ok(c) => c.with_config_hash(config_hash).with_shutdown(stop_rx),
        Err(e) => {
            tracing::error!("Failed to start crawl: {}", e);
            return Err(e.into());
        }
    };

    match coordinator.run().await {
        Ok(report) => {
            tracing::info!("Crawl {}: {}", report.phase, report.stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
