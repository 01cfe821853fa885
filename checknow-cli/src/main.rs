//! Binary crate for the `checknow` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Human-friendly output formatting

use checknow_core::Config;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod render;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    let config = Config::load();

    let level = match &config {
        Ok(config) => config.logging.level.as_str(),
        Err(_) => "info",
    };
    init_tracing(cmd.verbose, level);

    if let Err(e) = &config {
        tracing::warn!("Could not load configuration: {:#}", e);
    }

    cmd.run(config).await
}

/// `RUST_LOG` wins; otherwise `--verbose` or the configured level.
fn init_tracing(verbose: bool, configured: &str) {
    let fallback = if verbose { "debug" } else { configured };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
