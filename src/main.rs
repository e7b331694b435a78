//! dirsentry - recursive directory monitor
//!
//! Entry point for the dirsentry command.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::io::{self, BufWriter};

use clap::Parser;
use dirsentry::config::{DEFAULT_CAPACITY, DEFAULT_GROWTH_INCREMENT};
use dirsentry::observability::{init_tracing, TracingConfig};
use dirsentry::watcher::monitor;
use dirsentry::{Config, Result, WatcherError};
use tokio::signal::unix::{signal, SignalKind};

/// dirsentry - watch a directory tree and delete unwanted files on arrival
#[derive(Parser, Debug)]
#[command(name = "dirsentry")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root directory to watch (defaults to the current directory)
    #[arg(short, long, visible_alias = "base", env = "DIRSENTRY_ROOT")]
    root: Option<std::path::PathBuf>,

    /// Watch table slots to pre-allocate
    #[arg(short, long, visible_alias = "allocs", env = "DIRSENTRY_CAPACITY", default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Slots added each time the watch table fills up
    #[arg(long, env = "DIRSENTRY_GROWTH", default_value_t = DEFAULT_GROWTH_INCREMENT)]
    growth: usize,

    /// Comma-separated suffixes to delete on arrival, e.g. ".tmp,.exe"
    #[arg(long, env = "DIRSENTRY_REJECT", value_delimiter = ',')]
    reject: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DIRSENTRY_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "DIRSENTRY_LOG_JSON")]
    log_json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config {
        initial_capacity: cli.capacity,
        growth_increment: cli.growth,
        rejected_extensions: cli.reject,
        log_level: cli.log_level,
        log_json: cli.log_json,
        ..Config::default()
    };
    if let Some(root) = cli.root {
        config.root = root;
    }

    init_tracing(&TracingConfig::from(&config));

    tracing::info!("dirsentry v{} starting...", env!("CARGO_PKG_VERSION"));
    tracing::debug!(?config, "Configuration loaded");

    match run(&config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!(error = %e, "Fatal error, exiting");
            Err(e)
        }
    }
}

async fn run(config: &Config) -> Result<()> {
    config.validate()?;

    let mut interrupt = signal(SignalKind::interrupt())
        .map_err(|e| WatcherError::init("interrupt handler", e))?;
    let shutdown = async move {
        interrupt.recv().await;
    };

    let out = BufWriter::new(io::stdout().lock());
    let stats = monitor(config, out, shutdown).await?;

    println!("Total events: {}", stats.events);
    tracing::info!(
        events = stats.events,
        retired = stats.retired,
        deletions = stats.deletions,
        delete_failures = stats.delete_failures,
        "Stopped"
    );

    Ok(())
}
