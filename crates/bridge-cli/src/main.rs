//! Compiler console - command-line client for the compile gateway.
//!
//! The main entry point for the `bridge` CLI binary.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bridge_cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match cli.command {
            Commands::Health => bridge_cli::commands::health::execute(&config).await,
            Commands::Compile(args) => bridge_cli::commands::compile::execute(args, &config).await,
            Commands::Console => bridge_cli::commands::console::execute(&config).await,
            Commands::Sample => bridge_cli::commands::sample::execute(&config),
        }
    })
}
