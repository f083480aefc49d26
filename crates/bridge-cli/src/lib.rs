//! # bridge-cli
//!
//! Terminal console for the compile gateway.
//!
//! ## Commands
//!
//! - `bridge health` - Check gateway and compiler availability
//! - `bridge compile [FILE|-]` - Compile a file, stdin, or the sample program
//! - `bridge console` - Interactive editor session
//! - `bridge sample` - Print the sample program
//!
//! ## Configuration
//!
//! - `BRIDGE_API_URL` - Gateway endpoint (default: `http://localhost:5000`)

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
// CLI uses print! macros intentionally
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

pub mod client;
pub mod commands;
pub mod console;
pub mod render;

use std::time::Duration;

use clap::{Parser, Subcommand};

/// Default gateway URL.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Sample program loaded into a fresh editor.
pub const SAMPLE_SOURCE: &str = "dhoro x = 10;
dhoro y = 20;
dhoro sum = x + y;

lekho sum;

jodi (x < y) {
    lekho x;
} jodi na {
    lekho y;
}";

/// Compiler console - talk to a compile gateway from the terminal.
#[derive(Debug, Parser)]
#[command(name = "bridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Gateway URL.
    #[arg(long, env = "BRIDGE_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Output format.
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// HTTP timeout in seconds.
    #[arg(long, default_value = "30")]
    pub timeout_secs: u64,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Get the effective configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            api_url: self.api_url.trim_end_matches('/').to_string(),
            format: self.format.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check gateway and compiler availability.
    Health,
    /// Compile a source file.
    Compile(commands::compile::CompileArgs),
    /// Start an interactive console session.
    Console,
    /// Print the sample program.
    Sample,
}

/// Output format.
#[derive(Debug, Clone, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
}

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gateway URL without a trailing slash.
    pub api_url: String,
    /// Output format.
    pub format: OutputFormat,
    /// HTTP timeout.
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            format: OutputFormat::Text,
            timeout: Duration::from_secs(30),
        }
    }
}
