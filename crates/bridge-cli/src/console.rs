//! Console session state.
//!
//! [`Console`] holds everything the interactive front end shows: the editor
//! buffer, the connection indicator, the two output panes, symbol counters,
//! the compile trigger, and a queue of transient notices. Rendering lives in
//! [`crate::render`]; this module only moves state.

use crate::SAMPLE_SOURCE;
use crate::client::{ClientError, CompileResponse, GatewayApi};

/// Trigger label while idle.
pub const TRIGGER_IDLE: &str = "Compile";
/// Trigger label while a compile is in flight.
pub const TRIGGER_BUSY: &str = "Compiling...";

/// Initial text in the output pane.
pub const OUTPUT_READY: &str = "// Ready!  Write your code and click Compile";
/// Initial text in the assembly pane.
pub const ASSEMBLY_PLACEHOLDER: &str = "// Assembly code will appear here after compilation...";

/// Connection indicator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// Not checked yet.
    Unknown,
    /// Gateway reachable and compiler present.
    Connected,
    /// Gateway reachable but compiler missing.
    CompilerMissing,
    /// Gateway unreachable.
    Disconnected,
}

impl Indicator {
    /// Status line text.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "Backend Status: Checking...",
            Self::Connected => "Backend Status: ✅ Connected",
            Self::CompilerMissing => "Backend Status: ⚠️ Compiler Missing",
            Self::Disconnected => "Backend Status: ❌ Not Connected",
        }
    }
}

/// Notice severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Positive confirmation.
    Success,
    /// Recoverable problem.
    Warning,
    /// Failure.
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Message text.
    pub message: String,
}

/// Compile trigger state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    /// Whether a compile can be started.
    pub enabled: bool,
    /// Label shown to the user.
    pub label: &'static str,
}

impl Default for Trigger {
    fn default() -> Self {
        Self {
            enabled: true,
            label: TRIGGER_IDLE,
        }
    }
}

/// Interactive console state bound to a gateway.
#[derive(Debug)]
pub struct Console<C> {
    client: C,
    /// Editor buffer.
    pub editor: String,
    /// Connection indicator.
    pub indicator: Indicator,
    /// Output pane.
    pub output: String,
    /// Assembly pane.
    pub assembly: String,
    /// Keyword counter.
    pub keywords: u64,
    /// Identifier counter.
    pub identifiers: u64,
    /// Compile trigger.
    pub trigger: Trigger,
    notices: Vec<Notice>,
}

impl<C: GatewayApi> Console<C> {
    /// Creates a console with the sample program loaded.
    pub fn new(client: C) -> Self {
        Self {
            client,
            editor: SAMPLE_SOURCE.to_string(),
            indicator: Indicator::Unknown,
            output: OUTPUT_READY.to_string(),
            assembly: ASSEMBLY_PLACEHOLDER.to_string(),
            keywords: 0,
            identifiers: 0,
            trigger: Trigger::default(),
            notices: Vec::new(),
        }
    }

    /// The gateway client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Number of editor lines, counting an empty buffer as one.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.editor.split('\n').count()
    }

    /// Replaces the editor contents.
    pub fn set_editor(&mut self, source: impl Into<String>) {
        self.editor = source.into();
    }

    /// Queues a notice.
    pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
    }

    /// Drains queued notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Probes the gateway and updates the indicator.
    pub async fn check_health(&mut self) {
        match self.client.health().await {
            Ok(report) if report.compiler_exists => {
                self.indicator = Indicator::Connected;
                self.output = OUTPUT_READY.to_string();
                self.assembly = ASSEMBLY_PLACEHOLDER.to_string();
                self.notify(NoticeLevel::Success, "✅ Backend connected successfully!");
            }
            Ok(_) => {
                self.indicator = Indicator::CompilerMissing;
                self.output = "// ERROR: Compiler not found on server!\n\
                               // Please run build script in backend folder"
                    .to_string();
                self.notify(NoticeLevel::Warning, "⚠️ Compiler not found on server");
            }
            Err(err) => {
                tracing::debug!(error = %err, "health check failed");
                self.indicator = Indicator::Disconnected;
                self.output = format!(
                    "// ERROR: Cannot connect to backend server!\n\
                     // Make sure the server is running on {}",
                    self.client.base_url()
                );
                self.assembly = "// Backend not responding".to_string();
                self.notify(NoticeLevel::Error, "❌ Cannot connect to backend! ");
            }
        }
    }

    /// Validates the editor and moves into the compiling state.
    ///
    /// Returns the trimmed source to submit, or `None` when there is nothing
    /// to compile or a compile is already running.
    pub fn begin_compile(&mut self) -> Option<String> {
        if !self.trigger.enabled {
            return None;
        }

        let source = self.editor.trim();
        if source.is_empty() {
            self.notify(NoticeLevel::Warning, "Please enter some code to compile!");
            return None;
        }
        let source = source.to_string();

        self.trigger = Trigger {
            enabled: false,
            label: TRIGGER_BUSY,
        };
        self.output = "⏳ Compiling...\n\nSending request to backend server...".to_string();
        self.assembly = "// ⏳ Compiling...".to_string();
        Some(source)
    }

    /// Applies a compile result and re-enables the trigger.
    pub fn finish_compile(&mut self, result: Result<CompileResponse, ClientError>) {
        match result {
            Ok(response) if response.success => {
                self.assembly = non_empty_or(response.assembly, "// No assembly code generated");
                self.output = non_empty_or(response.output, "// No output generated");
                self.keywords = response.keywords;
                self.identifiers = response.identifiers;
                self.notify(NoticeLevel::Success, "✅ Compilation successful!");
            }
            Ok(response) => {
                let error = response
                    .error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| "Unknown compilation error".to_string());
                self.output = format!("❌ Compilation Error:\n\n{error}");
                self.assembly = "// Compilation failed - see Output tab for details".to_string();
                self.notify(NoticeLevel::Error, "❌ Compilation failed!");
            }
            Err(err) => {
                tracing::debug!(error = %err, "compile request failed");
                self.output = format!(
                    "❌ Connection Error\n\n{err}\n\n\
                     The backend server is not responding.\n\
                     Please check:\n\
                     1. Backend server is running\n\
                     2. Server is on {}\n\
                     3. No firewall is blocking the connection",
                    self.client.base_url()
                );
                self.assembly = "// Server not responding - see Output tab".to_string();
                self.notify(NoticeLevel::Error, "❌ Cannot connect to server!");
            }
        }
        self.trigger = Trigger::default();
    }

    /// Compiles the editor contents end to end.
    ///
    /// Returns `false` if nothing was submitted.
    pub async fn compile(&mut self) -> bool {
        let Some(source) = self.begin_compile() else {
            return false;
        };
        let result = self.client.compile(&source).await;
        self.finish_compile(result);
        true
    }
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}
