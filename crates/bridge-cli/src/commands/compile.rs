//! Compile command - submit a source file to the gateway.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::AsyncReadExt;

use crate::client::{ApiClient, CompileResponse, GatewayApi};
use crate::render::{self, View};
use crate::{Config, OutputFormat, SAMPLE_SOURCE};

/// Arguments for the compile command.
#[derive(Debug, Args)]
pub struct CompileArgs {
    /// Source file, or `-` for stdin.
    #[arg(conflicts_with = "sample")]
    pub file: Option<PathBuf>,

    /// Compile the built-in sample program.
    #[arg(long)]
    pub sample: bool,

    /// Which result pane(s) to print.
    #[arg(long, value_enum, default_value = "both")]
    pub view: View,
}

impl CompileArgs {
    async fn source(&self) -> Result<String> {
        match &self.file {
            _ if self.sample => Ok(SAMPLE_SOURCE.to_string()),
            Some(path) if path.as_os_str() == "-" => {
                let mut buf = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut buf)
                    .await
                    .context("Failed to read source from stdin")?;
                Ok(buf)
            }
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display())),
            None => anyhow::bail!("Provide a source file, `-` for stdin, or --sample"),
        }
    }
}

/// Execute the compile command.
///
/// # Errors
///
/// Returns an error if the source cannot be read, the request fails, or the
/// gateway reports a compilation failure.
pub async fn execute(args: CompileArgs, config: &Config) -> Result<()> {
    let source = args.source().await?;
    let client = ApiClient::new(config)?;
    let response = submit(&client, &source).await?;

    match config.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::Text => print!("{}", render::compile_result(&response, args.view)),
    }

    if !response.success {
        anyhow::bail!("compilation failed");
    }
    Ok(())
}

/// Trims and submits source; rejects empty input locally.
///
/// # Errors
///
/// Returns an error if the source is blank or the request fails.
pub async fn submit<C: GatewayApi + ?Sized>(client: &C, source: &str) -> Result<CompileResponse> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        anyhow::bail!("Please enter some code to compile!");
    }
    let response = client.compile(trimmed).await?;
    Ok(response)
}
