//! cosplit command-line entry point

use clap::Parser;
use cosplit_cli::commands::Commands;

/// Evaluate and serve compound splitters
#[derive(Debug, Parser)]
#[command(name = "cosplit", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> anyhow::Result<()> {
    Cli::parse().command.execute()
}
