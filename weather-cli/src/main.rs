//! Binary crate for the `weather-display` tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Logging setup
//! - The terminal display backend and icon glyphs

use tracing_subscriber::EnvFilter;

use crate::diagnostics::DeferredStderr;

mod cli;
mod diagnostics;
mod glyphs;
mod terminal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse_or_exit();

    // Held back while the terminal display is active.
    let stderr = DeferredStderr::new();
    let log_writer = stderr.clone();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cmd.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(move || log_writer.clone())
        .with_target(false)
        .init();

    cmd.run(stderr).await
}
