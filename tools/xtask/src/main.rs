//! Workspace automation tasks.
//!
//! Run with: `cargo xtask <command>`

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

/// Stand-in compiler: copies stdin to `output.asm` and prints counts.
const STUB_COMPILER: &str = r#"#!/bin/sh
# Development stand-in for the real compiler: reads source on stdin.
src=$(cat)
printf '%s\n' "$src" > output.asm
words=$(printf '%s\n' "$src" | grep -oE '[A-Za-z_][A-Za-z0-9_]*')
kw=$(printf '%s\n' "$words" | grep -ciwE 'dhoro|lekho|jodi|na')
id=$(printf '%s\n' "$words" | grep -viwE 'dhoro|lekho|jodi|na' | grep -v '^$' | sort -u | wc -l | tr -d ' ')
echo "KEYWORDS: $kw"
echo "IDENTIFIERS: $id"
"#;

#[derive(Parser)]
#[command(name = "xtask", about = "Compile gateway workspace automation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all CI checks locally
    Ci,
    /// Validate workspace conventions
    Lint,
    /// Generate coverage report
    Coverage,
    /// Install a stand-in compiler so the gateway can run without the real one
    StubCompiler {
        /// Deployment directory to install into
        #[arg(long, default_value = ".")]
        deploy_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci => run_ci(),
        Commands::Lint => run_lint(),
        Commands::Coverage => run_coverage(),
        Commands::StubCompiler { deploy_dir } => install_stub_compiler(&deploy_dir),
    }
}

fn run_ci() -> Result<()> {
    println!("Running CI checks...\n");

    run_cmd("cargo", &["fmt", "--check"])?;
    run_cmd("cargo", &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])?;
    run_cmd("cargo", &["test", "--workspace"])?;
    run_cmd("cargo", &["doc", "--workspace", "--no-deps"])?;

    println!("\nAll CI checks passed!");
    Ok(())
}

fn run_lint() -> Result<()> {
    println!("Validating workspace conventions...\n");

    // Check crate naming
    for entry in std::fs::read_dir("crates").context("read crates/")? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with("bridge-") {
            anyhow::bail!("Crate '{name}' does not follow bridge-* naming");
        }
        if !entry.path().join("Cargo.toml").is_file() {
            anyhow::bail!("Crate '{name}' has no Cargo.toml");
        }
    }

    println!("All conventions validated!");
    Ok(())
}

fn run_coverage() -> Result<()> {
    run_cmd("cargo", &["llvm-cov", "--workspace", "--html"])?;
    println!("\nCoverage report: target/llvm-cov/html/index.html");
    Ok(())
}

fn install_stub_compiler(deploy_dir: &Path) -> Result<()> {
    let name = if cfg!(windows) { "compiler.exe" } else { "compiler" };
    let target = deploy_dir.join(name);
    if cfg!(windows) {
        anyhow::bail!("stub compiler is a shell script; install a real compiler at {}", target.display());
    }

    std::fs::create_dir_all(deploy_dir.join("temp"))
        .with_context(|| format!("Failed to create {}", deploy_dir.join("temp").display()))?;
    std::fs::write(&target, STUB_COMPILER)
        .with_context(|| format!("Failed to write {}", target.display()))?;
    run_cmd("chmod", &["+x", &target.to_string_lossy()])?;

    println!("Installed stub compiler at {}", target.display());
    Ok(())
}

fn run_cmd(cmd: &str, args: &[&str]) -> Result<()> {
    println!("$ {} {}", cmd, args.join(" "));
    let status = Command::new(cmd)
        .args(args)
        .status()
        .with_context(|| format!("Failed to run: {} {}", cmd, args.join(" ")))?;

    if !status.success() {
        anyhow::bail!("Command failed: {} {}", cmd, args.join(" "));
    }
    Ok(())
}
