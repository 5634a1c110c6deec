//! Buildwright CLI - Multi-component build orchestrator
//!
//! Entry point for the buildwright command-line application.

use anyhow::Result;
use clap::Parser;

use buildwright::cli::output::{display_error, level_filter};
use buildwright::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber; RUST_LOG overrides the flag-derived level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(level_filter(cli.verbose, cli.quiet).into()),
        )
        .init();

    // Run the command and handle errors
    match cli.run().await {
        Ok(()) => Ok(()),
        Err(e) => {
            display_error(&e);
            std::process::exit(1);
        }
    }
}
