//! Health command - check gateway and compiler availability.

use anyhow::Result;

use crate::client::{ApiClient, GatewayApi};
use crate::{Config, OutputFormat, render};

/// Execute the health command.
///
/// Exits with an error when the gateway is unreachable or reports the
/// compiler as missing.
///
/// # Errors
///
/// Returns an error if the request fails or the compiler is missing.
pub async fn execute(config: &Config) -> Result<()> {
    let client = ApiClient::new(config)?;
    let report = client.health().await?;

    match config.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", render::health(&report)),
    }

    if !report.compiler_exists {
        anyhow::bail!("compiler not found on gateway at {}", client.base_url());
    }
    Ok(())
}
