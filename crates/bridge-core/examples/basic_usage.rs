//! Compile one program through a local deployment directory.
//!
//! Run with: `cargo run --example basic_usage -- <deploy-dir> [source-file]`

use bridge_core::observability::{LogFormat, init_logging};
use bridge_core::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(LogFormat::Pretty);

    let mut args = std::env::args().skip(1);
    let deploy_dir = args.next().unwrap_or_else(|| ".".to_string());
    let source = match args.next() {
        Some(path) => std::fs::read_to_string(&path)
            .map_err(|e| bridge_core::Error::io("read source", &path, e))?,
        None => "dhoro x = 10;".to_string(),
    };

    let gateway = CompileGateway::new(GatewaySettings::for_deploy_dir(deploy_dir));
    gateway.prepare()?;
    println!("Compiler present: {}", gateway.compiler_exists());

    let outcome = gateway.compile(Some(&source)).await?;
    if outcome.succeeded {
        println!("Assembly:\n{}", outcome.assembly_text);
        println!("Output:\n{}", outcome.diagnostic_text);
        println!(
            "Keywords: {}  Identifiers: {}",
            outcome.keyword_count, outcome.identifier_count
        );
    } else {
        println!("Failed: {}", outcome.error.unwrap_or_default());
    }

    Ok(())
}
