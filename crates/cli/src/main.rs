/// Entry point for the Solcloak CLI, a Solidity source obfuscation tool.
///
/// This module parses command-line arguments, initializes logging and dispatches to the
/// `obfuscate`, `tree` and `slots` subcommands.
use clap::Parser;
use solcloak_cli::commands::{Cmd, Command};
use tracing_subscriber::EnvFilter;

/// Command-line interface for Solcloak.
///
/// Solcloak rewrites Solidity sources into functionally equivalent but harder to read
/// sources: dead code, opaque branches, split string literals, random identifiers and
/// bitwise arithmetic helpers.
#[derive(Parser)]
#[command(name = "solcloak")]
#[command(about = "Solcloak: Solidity source obfuscator")]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Log pass details at debug level.
    #[arg(long, short, global = true)]
    verbose: bool,
}

/// Runs the Solcloak CLI with the provided arguments.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    cli.command.execute().await
}
