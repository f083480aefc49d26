//! External compiler invocation.
//!
//! The compiler is a black box: it reads source on stdin, prints a report on
//! stdout, complains on stderr, and drops an assembly artifact into its
//! working directory. [`CompilerInvoker`] runs it under a deadline and always
//! returns an [`Invocation`]; spawn failures and timeouts are states, not errors.
//!
//! stdout and stderr are drained by background tasks into shared buffers, so
//! output written before a timeout kill is kept.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// Default deadline for one compiler run.
pub const DEFAULT_COMPILE_TIMEOUT: Duration = Duration::from_secs(10);

/// How long to keep draining pipes after the process is gone.
///
/// A grandchild that inherited the pipes can keep them open past a kill.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Per-stream capture limit; anything beyond is drained and dropped.
const MAX_CAPTURE_BYTES: usize = 8 * 1024 * 1024;

/// How the compiler process ended.
#[derive(Debug, Clone)]
pub enum ExitState {
    /// The process exited on its own (or was killed by a signal).
    Exited(ExitStatus),
    /// The deadline elapsed and the process was killed.
    TimedOut(Duration),
    /// The process could not be started.
    SpawnFailed(String),
    /// Waiting on the process failed.
    WaitFailed(String),
}

/// Captured result of one compiler run.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// How the process ended.
    pub state: ExitState,
    /// Captured stdout (lossy UTF-8).
    pub stdout: String,
    /// Captured stderr (lossy UTF-8).
    pub stderr: String,
    /// Wall-clock time from spawn to exit.
    pub elapsed: Duration,
}

impl Invocation {
    fn spawn_failed(program: &Path, error: &std::io::Error) -> Self {
        Self {
            state: ExitState::SpawnFailed(format!(
                "failed to start compiler {}: {error}",
                program.display()
            )),
            stdout: String::new(),
            stderr: String::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Returns true when the process exited with status zero.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(&self.state, ExitState::Exited(status) if status.success())
    }

    /// Returns true when the process was killed at the deadline.
    #[must_use]
    pub fn timed_out(&self) -> bool {
        matches!(self.state, ExitState::TimedOut(_))
    }

    /// Describes why the run failed, or `None` if it succeeded.
    #[must_use]
    pub fn failure_reason(&self) -> Option<String> {
        match &self.state {
            ExitState::Exited(status) if status.success() => None,
            ExitState::Exited(status) => Some(format!("compiler exited with {status}")),
            ExitState::TimedOut(limit) => Some(format!(
                "compiler timed out after {}s and was terminated",
                limit.as_secs_f64()
            )),
            ExitState::SpawnFailed(reason) | ExitState::WaitFailed(reason) => Some(reason.clone()),
        }
    }

    /// Text shown to the client when the run failed without stdout:
    /// stderr when present, otherwise the failure reason.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        if self.stderr.is_empty() {
            self.failure_reason().unwrap_or_default()
        } else {
            self.stderr.clone()
        }
    }
}

/// Runs the external compiler.
#[derive(Debug, Clone)]
pub struct CompilerInvoker {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl CompilerInvoker {
    /// Creates an invoker for `program` with the given deadline.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout,
        }
    }

    /// Sets extra arguments passed before stdin is read.
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Runs the compiler in `cwd` with `stdin` as its input stream.
    ///
    /// The child is killed when the deadline elapses, and also when the
    /// returned future is dropped (client went away).
    pub async fn invoke(&self, stdin: std::fs::File, cwd: &Path) -> Invocation {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .current_dir(cwd)
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let started = Instant::now();
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(program = %self.program.display(), error = %e, "compiler spawn failed");
                return Invocation::spawn_failed(&self.program, &e);
            }
        };

        let stdout = PipeCapture::spawn(child.stdout.take());
        let stderr = PipeCapture::spawn(child.stderr.take());

        let state = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => ExitState::Exited(status),
            Ok(Err(e)) => ExitState::WaitFailed(format!("failed to wait for compiler: {e}")),
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(error = %e, "failed to kill timed out compiler");
                }
                ExitState::TimedOut(self.timeout)
            }
        };
        let elapsed = started.elapsed();

        Invocation {
            state,
            stdout: stdout.finish().await,
            stderr: stderr.finish().await,
            elapsed,
        }
    }
}

/// Background reader for one child pipe.
struct PipeCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
    task: Option<JoinHandle<()>>,
}

impl PipeCapture {
    fn spawn<R>(reader: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let task = reader.map(|mut reader| {
            let buffer = Arc::clone(&buffer);
            tokio::spawn(async move {
                let mut chunk = [0u8; 8192];
                loop {
                    match reader.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            let mut captured = lock(&buffer);
                            let room = MAX_CAPTURE_BYTES.saturating_sub(captured.len());
                            captured.extend_from_slice(&chunk[..n.min(room)]);
                        }
                    }
                }
            })
        });
        Self { buffer, task }
    }

    async fn finish(self) -> String {
        if let Some(mut task) = self.task {
            if tokio::time::timeout(DRAIN_GRACE, &mut task).await.is_err() {
                task.abort();
            }
        }
        // The guard must be released before `self` is dropped at return.
        let guard = lock(&self.buffer);
        let text = String::from_utf8_lossy(&guard).into_owned();
        drop(guard);
        text
    }
}

fn lock(buffer: &Mutex<Vec<u8>>) -> MutexGuard<'_, Vec<u8>> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}
