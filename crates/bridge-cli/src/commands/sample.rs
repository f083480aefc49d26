//! Sample command - print the sample program.

use anyhow::Result;

use crate::{Config, OutputFormat, SAMPLE_SOURCE};

/// Execute the sample command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(config: &Config) -> Result<()> {
    match config.format {
        OutputFormat::Json => {
            let body = serde_json::json!({ "code": SAMPLE_SOURCE });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Text => println!("{SAMPLE_SOURCE}"),
    }
    Ok(())
}
