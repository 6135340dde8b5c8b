//! csv-query - filter a delimited text file with boolean queries

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use csv_query::config::{Config, DEFAULT_CONFIG_PATH};
use csv_query::logging;
use csv_query::pipeline::{ConsoleSink, FileSource, Scanner, StdinPrompt};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// csv-query - rescan a CSV file and print the rows matching a query
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// File to scan (overrides head.path)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Seconds per scan cycle (overrides timeout)
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    if let Some(file) = args.file {
        config.head.path = file;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }
    config.validate()?;

    let log_level = if args.debug {
        "debug".to_string()
    } else {
        config.log.level.clone().unwrap_or_else(|| "info".to_string())
    };
    logging::init(
        &log_level,
        config.log.output_path.as_deref(),
        config.log.error_output_path.as_deref(),
    )?;

    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    println!("csv-query v{}", env!("CARGO_PKG_VERSION"));
    println!("Working directory: {}", cwd.display());
    println!("Scanning: {}", config.head.path.display());

    let schema = config.schema().context("Invalid head.fields")?;
    let options = config.scan_options();
    log::info!(
        "Cycle timeout {:?}, {} workers, separator {:?}",
        options.timeout,
        options.workers,
        options.separator
    );

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => log::info!("Interrupted, shutting down"),
                Err(e) => log::error!("Failed to listen for Ctrl+C: {}", e),
            }
            cancel.cancel();
        });
    }

    let mut scanner = Scanner::new(
        FileSource::new(&config.head.path),
        Arc::new(ConsoleSink::stdout()),
        options,
        schema,
        cancel,
    );
    let mut prompt = StdinPrompt::spawn()?;

    scanner
        .run(&mut prompt)
        .await
        .with_context(|| format!("Scan of {} failed", config.head.path.display()))?;

    log::info!("Scan finished");
    Ok(())
}
