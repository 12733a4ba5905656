//! phpnav CLI entry point

use clap::Parser;
use phpnav::cli::{Cli, Commands};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_env("PHPNAV_LOG"))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Tokens(args) => phpnav::cli::tokens::run(args),
        Commands::Outline(args) => phpnav::cli::outline::run(args),
    }
}
