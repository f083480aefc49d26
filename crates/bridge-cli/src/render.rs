//! Terminal rendering for console state and compile results.

use std::fmt::Write as _;

use owo_colors::OwoColorize;

use crate::client::{CompileResponse, HealthReport};
use crate::console::{Console, Indicator, Notice, NoticeLevel};

/// Which pane(s) to print.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum View {
    /// Output pane only.
    Output,
    /// Assembly pane only.
    Assembly,
    /// Both panes.
    #[default]
    Both,
}

/// Formats the indicator with color.
#[must_use]
pub fn indicator_colored(indicator: Indicator) -> String {
    let label = indicator.label();
    match indicator {
        Indicator::Connected => label.green().to_string(),
        Indicator::CompilerMissing => label.yellow().to_string(),
        Indicator::Disconnected => label.red().to_string(),
        Indicator::Unknown => label.dimmed().to_string(),
    }
}

/// Formats a notice with color.
#[must_use]
pub fn notice_colored(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Success => notice.message.green().to_string(),
        NoticeLevel::Warning => notice.message.yellow().to_string(),
        NoticeLevel::Error => notice.message.red().to_string(),
    }
}

/// Renders a health report.
#[must_use]
pub fn health(report: &HealthReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Gateway Health".bold());
    let _ = writeln!(out, "  Status:    {}", report.status);
    if let Some(port) = report.port {
        let _ = writeln!(out, "  Port:      {port}");
    }
    let compiler = if report.compiler_exists {
        "present".green().to_string()
    } else {
        "missing".red().to_string()
    };
    let _ = writeln!(out, "  Compiler:  {compiler}");
    if let Some(ts) = &report.timestamp {
        let _ = writeln!(out, "  Checked:   {ts}");
    }
    out
}

fn pane(out: &mut String, title: &str, body: &str) {
    let _ = writeln!(out, "{}", format!("── {title} ──").cyan().bold());
    let _ = writeln!(out, "{body}");
}

/// Renders the console panes.
#[must_use]
pub fn panes<C>(console: &Console<C>, view: View) -> String {
    let mut out = String::new();
    if matches!(view, View::Output | View::Both) {
        pane(&mut out, "Output", &console.output);
    }
    if matches!(view, View::Assembly | View::Both) {
        pane(&mut out, "Assembly", &console.assembly);
    }
    let _ = writeln!(
        out,
        "{} {}   {} {}",
        "Keywords:".dimmed(),
        console.keywords,
        "Identifiers:".dimmed(),
        console.identifiers
    );
    out
}

/// Renders a one-shot compile response.
#[must_use]
pub fn compile_result(response: &CompileResponse, view: View) -> String {
    let mut out = String::new();
    if response.success {
        if matches!(view, View::Output | View::Both) {
            pane(&mut out, "Output", &response.output);
        }
        if matches!(view, View::Assembly | View::Both) {
            pane(&mut out, "Assembly", &response.assembly);
        }
        let _ = writeln!(
            out,
            "{} {}   {} {}",
            "Keywords:".dimmed(),
            response.keywords,
            "Identifiers:".dimmed(),
            response.identifiers
        );
    } else {
        let error = response
            .error
            .as_deref()
            .unwrap_or("Unknown compilation error");
        let _ = writeln!(out, "{} {error}", "Compilation Error:".red().bold());
    }
    out
}
