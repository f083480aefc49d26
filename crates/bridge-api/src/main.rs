//! `bridge-api` binary entrypoint.
//!
//! Loads configuration from environment variables and starts the HTTP server.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

use anyhow::{Context, Result};

use bridge_api::config::Config;
use bridge_api::server::Server;
use bridge_core::observability::{LogFormat, init_logging};

fn choose_log_format(config: &Config) -> LogFormat {
    if config.debug {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("load configuration")?;

    init_logging(choose_log_format(&config));

    tracing::info!(
        deploy_dir = %config.deploy_dir.display(),
        isolation = %config.artifact_isolation,
        "Compile gateway initializing"
    );

    let server = Server::new(config);
    server.serve().await.context("serve")?;
    Ok(())
}
