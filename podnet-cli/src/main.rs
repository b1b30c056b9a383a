//! Podnet CLI
//!
//! Attaches a pod sandbox network namespace through a pluggable network manager.

use clap::Parser;
use std::process;
use tracing::Level;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::Cli;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Setup logging based on verbosity, RUST_LOG wins when set
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Handle errors
    if let Err(e) = commands::dispatch(cli.command).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
