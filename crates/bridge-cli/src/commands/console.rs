//! Console command - interactive editor session.
//!
//! Lines typed at the prompt are appended to the editor buffer. Lines
//! starting with `:` are console commands:
//!
//! | Command            | Effect                                 |
//! |--------------------|----------------------------------------|
//! | `:compile`, `:c`   | Compile the editor contents            |
//! | `:show`            | Print the editor with line numbers     |
//! | `:clear`           | Empty the editor                       |
//! | `:sample`          | Reload the sample program              |
//! | `:output`, `:asm`  | Print one result pane                  |
//! | `:health`          | Re-check the gateway                   |
//! | `:help`            | List commands                          |
//! | `:quit`, `:q`      | Leave the session                      |

use std::io::Write;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::client::{ApiClient, GatewayApi};
use crate::console::Console;
use crate::render::{self, View};
use crate::{Config, SAMPLE_SOURCE};

const HELP: &str = "\
:compile, :c      compile the editor contents
:show             print the editor with line numbers
:clear            empty the editor
:sample           reload the sample program
:output, :asm     print one result pane
:health           re-check the gateway
:quit, :q         leave the session
Any other line is appended to the editor.";

/// Execute the console command.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or terminal I/O fails.
pub async fn execute(config: &Config) -> Result<()> {
    let client = ApiClient::new(config)?;
    let mut console = Console::new(client);
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run_session(&mut console, stdin, &mut stdout).await
}

/// Drives a console session from `input`, writing to `out` until EOF or `:quit`.
///
/// # Errors
///
/// Returns an error on I/O failure.
pub async fn run_session<C, R, W>(console: &mut Console<C>, input: R, out: &mut W) -> Result<()>
where
    C: GatewayApi,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    console.check_health().await;
    writeln!(out, "{}", render::indicator_colored(console.indicator))?;
    flush_notices(console, out)?;
    writeln!(
        out,
        "Editor loaded with {} lines. Type :help for commands.",
        console.line_count()
    )?;

    let mut lines = input.lines();
    loop {
        write!(out, "{} ", format!("{}>", console.line_count()).dimmed())?;
        out.flush()?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };

        match line.trim() {
            ":quit" | ":q" => break,
            ":help" => writeln!(out, "{HELP}")?,
            ":compile" | ":c" => {
                if console.compile().await {
                    write!(out, "{}", render::panes(console, View::Both))?;
                }
            }
            ":show" => {
                for (n, text) in console.editor.split('\n').enumerate() {
                    writeln!(out, "{:>4} | {text}", n + 1)?;
                }
                writeln!(out, "Lines: {}", console.line_count())?;
            }
            ":clear" => console.set_editor(""),
            ":sample" => console.set_editor(SAMPLE_SOURCE),
            ":output" => write!(out, "{}", render::panes(console, View::Output))?,
            ":asm" => write!(out, "{}", render::panes(console, View::Assembly))?,
            ":health" => {
                console.check_health().await;
                writeln!(out, "{}", render::indicator_colored(console.indicator))?;
            }
            cmd if cmd.starts_with(':') => {
                writeln!(out, "{} {cmd} (try :help)", "Unknown command".yellow())?;
            }
            _ => {
                if !console.editor.is_empty() {
                    console.editor.push('\n');
                }
                console.editor.push_str(&line);
            }
        }
        flush_notices(console, out)?;
    }

    Ok(())
}

fn flush_notices<C: GatewayApi, W: Write>(console: &mut Console<C>, out: &mut W) -> Result<()> {
    for notice in console.take_notices() {
        writeln!(out, "{}", render::notice_colored(&notice))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CompileResponse;
    use crate::console::testing::FakeGateway;

    async fn drive(console: &mut Console<FakeGateway>, script: &str) -> Result<String> {
        let mut out = Vec::new();
        run_session(console, script.as_bytes(), &mut out).await?;
        Ok(String::from_utf8(out)?)
    }

    fn compiled() -> CompileResponse {
        CompileResponse {
            success: true,
            error: None,
            assembly: "MOV x, 10".to_string(),
            output: "KEYWORDS: 1\nIDENTIFIERS: 1\n".to_string(),
            keywords: 1,
            identifiers: 1,
        }
    }

    #[tokio::test]
    async fn session_reports_health_on_start() -> Result<()> {
        let mut console = Console::new(FakeGateway::healthy());
        let out = drive(&mut console, "").await?;
        assert!(out.contains("Connected"));
        assert!(out.contains("Backend connected successfully!"));
        assert!(out.contains("Editor loaded with 11 lines"));
        Ok(())
    }

    #[tokio::test]
    async fn typed_lines_replace_cleared_editor_and_compile() -> Result<()> {
        let mut console = Console::new(FakeGateway::compiling(compiled()));
        let out = drive(&mut console, ":clear\ndhoro x = 10;\n:c\n:quit\nignored\n").await?;

        assert_eq!(console.editor, "dhoro x = 10;");
        assert_eq!(
            console.client().submitted.lock().unwrap().as_slice(),
            ["dhoro x = 10;"]
        );
        assert!(out.contains("MOV x, 10"));
        assert!(out.contains("Compilation successful!"));
        Ok(())
    }

    #[tokio::test]
    async fn lines_append_to_editor() -> Result<()> {
        let mut console = Console::new(FakeGateway::healthy());
        drive(&mut console, ":clear\nline one\nline two\n").await?;
        assert_eq!(console.editor, "line one\nline two");
        assert_eq!(console.line_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn compile_of_empty_editor_warns() -> Result<()> {
        let mut console = Console::new(FakeGateway::healthy());
        let out = drive(&mut console, ":clear\n:compile\n").await?;
        assert!(out.contains("Please enter some code to compile!"));
        assert!(console.client().submitted.lock().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn show_and_sample() -> Result<()> {
        let mut console = Console::new(FakeGateway::healthy());
        let out = drive(&mut console, ":clear\nabc\n:sample\n:show\n").await?;
        assert_eq!(console.editor, SAMPLE_SOURCE);
        assert!(out.contains("   1 | dhoro x = 10;"));
        assert!(out.contains("Lines: 11"));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_command_is_reported() -> Result<()> {
        let mut console = Console::new(FakeGateway::healthy());
        let before = console.editor.clone();
        let out = drive(&mut console, ":frobnicate\n").await?;
        assert!(out.contains(":frobnicate (try :help)"));
        assert_eq!(console.editor, before);
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_gateway_still_allows_editing() -> Result<()> {
        let mut console = Console::new(FakeGateway::default());
        let out = drive(&mut console, ":clear\nx\n").await?;
        assert!(out.contains("Not Connected"));
        assert_eq!(console.editor, "x");
        Ok(())
    }
}
