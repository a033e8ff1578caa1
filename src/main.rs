// Credvault - Application Entry Point
//
// Parses CLI arguments, initializes structured logging (secret values are
// never logged at any level), and dispatches to the command handler.
// Uses the tokio runtime for the UDS gateway.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use credvault::cli::{execute, Cli};

#[tokio::main]
async fn main() {
    // RUST_LOG=credvault=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("credvault=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = execute(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
