//! Binary crate for the `weather` dashboard.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration and search prompts
//! - Human-friendly output formatting

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod render;

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
