//! Compile request orchestration.
//!
//! [`CompileGateway::compile`] runs the full lifecycle of one request:
//!
//! 1. reject empty source (normal failure outcome, no subprocess)
//! 2. write the source to a [`ScratchFile`]
//! 3. report a missing compiler (normal failure outcome, no subprocess)
//! 4. run the compiler with the scratch file as stdin, under a deadline
//! 5. turn a failed run without stdout into a compile-error outcome
//! 6. otherwise read the assembly artifact and scrape the counters
//!
//! Scratch resources are drop guards, so every exit path releases them.
//!
//! ## Artifact isolation
//!
//! The compiler writes its artifact to a fixed name in its working directory.
//! Concurrent runs in the same directory would read each other's artifact, so
//! the gateway picks a working directory per [`ArtifactIsolation`] mode.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::counters::extract_counts;
use crate::error::{Error, Result};
use crate::id::ScratchToken;
use crate::invoker::{CompilerInvoker, DEFAULT_COMPILE_TIMEOUT};
use crate::metrics;
use crate::observability::compile_span;
use crate::outcome::{CompilationOutcome, NO_ASSEMBLY_PLACEHOLDER};
use crate::scratch::{ScratchFile, WorkDir, ensure_scratch_root};

/// Default artifact file name written by the compiler.
pub const DEFAULT_ARTIFACT_NAME: &str = "output.asm";

/// Default scratch directory name under the deployment directory.
pub const DEFAULT_SCRATCH_DIR_NAME: &str = "temp";

/// Default compiler file name under the deployment directory.
#[cfg(windows)]
pub const DEFAULT_COMPILER_FILE_NAME: &str = "compiler.exe";

/// Default compiler file name under the deployment directory.
#[cfg(not(windows))]
pub const DEFAULT_COMPILER_FILE_NAME: &str = "compiler";

/// Where each compiler run writes its artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactIsolation {
    /// Each run gets a fresh working directory under the scratch root.
    #[default]
    PerRequest,
    /// Runs share the deployment directory and take turns behind a lock.
    Serialized,
    /// Runs share the deployment directory with no lock. Overlaps can swap
    /// artifacts between requests; they are logged and counted.
    Shared,
}

impl ArtifactIsolation {
    /// Returns the configuration spelling of this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PerRequest => "per_request",
            Self::Serialized => "serialized",
            Self::Shared => "shared",
        }
    }
}

impl fmt::Display for ArtifactIsolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactIsolation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per_request" => Ok(Self::PerRequest),
            "serialized" => Ok(Self::Serialized),
            "shared" => Ok(Self::Shared),
            _ => Err(Error::InvalidInput(format!(
                "artifact isolation must be one of: per_request, serialized, shared (got {s})"
            ))),
        }
    }
}

/// Filesystem and process settings for the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySettings {
    /// Compiler executable.
    pub compiler: PathBuf,
    /// Arguments passed to the compiler ahead of stdin.
    pub compiler_args: Vec<String>,
    /// Deployment directory; the compiler's working directory in shared modes.
    pub deploy_dir: PathBuf,
    /// Scratch root for scratch files and per-request working directories.
    pub scratch_dir: PathBuf,
    /// Artifact file name, relative to the compiler's working directory.
    pub artifact_name: String,
    /// Deadline for one compiler run.
    pub timeout: Duration,
    /// Artifact isolation mode.
    pub isolation: ArtifactIsolation,
}

impl GatewaySettings {
    /// Default layout rooted at `deploy_dir`: `<deploy>/compiler`,
    /// `<deploy>/temp`, `output.asm`, 10 second deadline, per-request isolation.
    #[must_use]
    pub fn for_deploy_dir(deploy_dir: impl Into<PathBuf>) -> Self {
        let deploy_dir = deploy_dir.into();
        Self {
            compiler: deploy_dir.join(DEFAULT_COMPILER_FILE_NAME),
            compiler_args: Vec::new(),
            scratch_dir: deploy_dir.join(DEFAULT_SCRATCH_DIR_NAME),
            deploy_dir,
            artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
            timeout: DEFAULT_COMPILE_TIMEOUT,
            isolation: ArtifactIsolation::default(),
        }
    }
}

/// Orchestrates compile requests against the external compiler.
#[derive(Debug)]
pub struct CompileGateway {
    settings: GatewaySettings,
    invoker: CompilerInvoker,
    serial: tokio::sync::Mutex<()>,
    in_flight: AtomicUsize,
    contention_events: AtomicU64,
}

impl CompileGateway {
    /// Creates a gateway. Call [`prepare`](Self::prepare) before serving.
    #[must_use]
    pub fn new(mut settings: GatewaySettings) -> Self {
        // The child runs in a different working directory, so relative paths
        // must be resolved against ours first.
        settings.compiler = absolutize(settings.compiler);
        settings.deploy_dir = absolutize(settings.deploy_dir);
        settings.scratch_dir = absolutize(settings.scratch_dir);
        let invoker = CompilerInvoker::new(settings.compiler.clone(), settings.timeout)
            .with_args(settings.compiler_args.clone());
        Self {
            settings,
            invoker,
            serial: tokio::sync::Mutex::new(()),
            in_flight: AtomicUsize::new(0),
            contention_events: AtomicU64::new(0),
        }
    }

    /// Returns the gateway settings.
    #[must_use]
    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Creates the scratch root if needed and logs the compiler's presence.
    ///
    /// # Errors
    ///
    /// Returns an error if the scratch root cannot be created.
    pub fn prepare(&self) -> Result<()> {
        if ensure_scratch_root(&self.settings.scratch_dir)? {
            tracing::info!(path = %self.settings.scratch_dir.display(), "created scratch directory");
        }
        if self.compiler_exists() {
            tracing::info!(path = %self.settings.compiler.display(), "compiler found");
        } else {
            tracing::warn!(path = %self.settings.compiler.display(), "compiler NOT found");
        }
        Ok(())
    }

    /// Returns true if the compiler executable is currently on disk.
    ///
    /// Checked on every call; never cached.
    #[must_use]
    pub fn compiler_exists(&self) -> bool {
        self.settings.compiler.exists()
    }

    /// Number of shared-mode invocations that overlapped another one.
    #[must_use]
    pub fn contention_events(&self) -> u64 {
        self.contention_events.load(Ordering::Relaxed)
    }

    /// Compiles `source`.
    ///
    /// `None`, empty, and whitespace-only source all yield the
    /// "No code provided" outcome without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error only for orchestration faults: the scratch file or
    /// working directory cannot be created, or the artifact exists but cannot
    /// be read. Compiler failures are reported in the outcome.
    pub async fn compile(&self, source: Option<&str>) -> Result<CompilationOutcome> {
        let started = Instant::now();
        let result = match source.filter(|text| !text.trim().is_empty()) {
            None => {
                tracing::info!("compile request without source text");
                Ok(CompilationOutcome::empty_source())
            }
            Some(text) => {
                let token = ScratchToken::generate();
                let span = compile_span(&token, self.settings.isolation.as_str());
                self.compile_source(token, text).instrument(span).await
            }
        };

        match &result {
            Ok(outcome) => metrics::record_compile(outcome.kind(), started.elapsed()),
            Err(e) => {
                tracing::error!(error = %e, "compile orchestration failed");
                metrics::record_compile_fault();
            }
        }
        result
    }

    async fn compile_source(&self, token: ScratchToken, source: &str) -> Result<CompilationOutcome> {
        let scratch = ScratchFile::create(&self.settings.scratch_dir, token, source).await?;
        tracing::debug!(path = %scratch.path().display(), bytes = source.len(), "scratch file written");

        if !self.compiler_exists() {
            tracing::warn!(path = %self.settings.compiler.display(), "compiler executable not found");
            return Ok(CompilationOutcome::tool_missing());
        }

        match self.settings.isolation {
            ArtifactIsolation::PerRequest => {
                let work = WorkDir::create(&self.settings.scratch_dir, token).await?;
                self.invoke_and_collect(&scratch, &work).await
            }
            ArtifactIsolation::Serialized => {
                let _turn = self.serial.lock().await;
                let work = WorkDir::shared(&self.settings.deploy_dir);
                self.discard_stale_artifact(work.path()).await?;
                self.invoke_and_collect(&scratch, &work).await
            }
            ArtifactIsolation::Shared => {
                let _slot = self.enter_shared();
                let work = WorkDir::shared(&self.settings.deploy_dir);
                self.invoke_and_collect(&scratch, &work).await
            }
        }
    }

    async fn invoke_and_collect(
        &self,
        scratch: &ScratchFile,
        work: &WorkDir,
    ) -> Result<CompilationOutcome> {
        let stdin = scratch.open_for_stdin()?;
        let invocation = self.invoker.invoke(stdin, work.path()).await;

        if !invocation.succeeded() && invocation.stdout.is_empty() {
            if invocation.timed_out() {
                tracing::warn!(
                    timeout_secs = self.settings.timeout.as_secs_f64(),
                    "compiler timed out without output"
                );
            } else {
                tracing::info!(
                    reason = invocation.failure_reason().as_deref().unwrap_or_default(),
                    "compilation failed"
                );
            }
            return Ok(CompilationOutcome::compile_error(
                &invocation.diagnostic(),
                invocation.timed_out(),
            ));
        }

        if let Some(reason) = invocation.failure_reason() {
            tracing::warn!(reason = %reason, "compiler reported failure but produced output");
        }

        let assembly = self.read_artifact(work.path()).await?;
        let counts = extract_counts(&invocation.stdout);
        tracing::info!(
            keywords = counts.keywords,
            identifiers = counts.identifiers,
            elapsed_ms = u64::try_from(invocation.elapsed.as_millis()).unwrap_or(u64::MAX),
            "compilation completed"
        );

        Ok(CompilationOutcome::success(&invocation.stdout, assembly, counts))
    }

    async fn read_artifact(&self, dir: &Path) -> Result<String> {
        let path = dir.join(&self.settings.artifact_name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no assembly artifact produced");
                Ok(NO_ASSEMBLY_PLACEHOLDER.to_string())
            }
            Err(e) => Err(Error::io("failed to read assembly artifact", path, e)),
        }
    }

    async fn discard_stale_artifact(&self, dir: &Path) -> Result<()> {
        let path = dir.join(&self.settings.artifact_name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io("failed to discard stale assembly artifact", path, e)),
        }
    }

    fn enter_shared(&self) -> SharedSlot<'_> {
        let others = self.in_flight.fetch_add(1, Ordering::SeqCst);
        if others > 0 {
            self.contention_events.fetch_add(1, Ordering::Relaxed);
            metrics::record_artifact_contention();
            tracing::warn!(
                concurrent = others,
                "overlapping compiler runs share one artifact path; assembly may belong to another request"
            );
        }
        SharedSlot {
            in_flight: &self.in_flight,
        }
    }
}

/// Marks one shared-mode invocation as in flight.
struct SharedSlot<'a> {
    in_flight: &'a AtomicUsize,
}

impl Drop for SharedSlot<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

fn absolutize(path: PathBuf) -> PathBuf {
    match std::path::absolute(&path) {
        Ok(absolute) => absolute,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not resolve path; keeping it relative");
            path
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolation_parses_config_spellings() {
        assert_eq!("per_request".parse::<ArtifactIsolation>().unwrap(), ArtifactIsolation::PerRequest);
        assert_eq!(" Serialized ".parse::<ArtifactIsolation>().unwrap(), ArtifactIsolation::Serialized);
        assert_eq!("shared".parse::<ArtifactIsolation>().unwrap(), ArtifactIsolation::Shared);
        assert!(matches!(
            "parallel".parse::<ArtifactIsolation>(),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn isolation_display_matches_parse() {
        for mode in [
            ArtifactIsolation::PerRequest,
            ArtifactIsolation::Serialized,
            ArtifactIsolation::Shared,
        ] {
            assert_eq!(mode.to_string().parse::<ArtifactIsolation>().unwrap(), mode);
        }
    }

    #[test]
    fn default_settings_layout() {
        let settings = GatewaySettings::for_deploy_dir("/srv/bridge");
        assert_eq!(settings.compiler, Path::new("/srv/bridge").join(DEFAULT_COMPILER_FILE_NAME));
        assert_eq!(settings.scratch_dir, Path::new("/srv/bridge/temp"));
        assert_eq!(settings.artifact_name, "output.asm");
        assert_eq!(settings.timeout, Duration::from_secs(10));
        assert_eq!(settings.isolation, ArtifactIsolation::PerRequest);
    }

    #[test]
    fn relative_paths_are_resolved_against_cwd() {
        let gateway = CompileGateway::new(GatewaySettings::for_deploy_dir("deploy/rel"));
        let cwd = std::env::current_dir().unwrap();
        let settings = gateway.settings();

        assert!(settings.compiler.is_absolute());
        assert_eq!(settings.deploy_dir, cwd.join("deploy/rel"));
        assert_eq!(settings.scratch_dir, cwd.join("deploy/rel").join(DEFAULT_SCRATCH_DIR_NAME));
        assert_eq!(
            settings.compiler,
            cwd.join("deploy/rel").join(DEFAULT_COMPILER_FILE_NAME)
        );
    }

    #[tokio::test]
    async fn empty_source_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = GatewaySettings::for_deploy_dir(dir.path());
        // Scratch root deliberately missing: any filesystem access would fail.
        settings.scratch_dir = dir.path().join("missing");
        let gateway = CompileGateway::new(settings);

        for source in [None, Some(""), Some("   \n\t")] {
            let outcome = gateway.compile(source).await.unwrap();
            assert!(!outcome.succeeded);
            assert_eq!(outcome.error.as_deref(), Some("No code provided"));
        }
        assert!(!dir.path().join("missing").exists());
    }

    #[test]
    fn shared_slot_counts_overlaps() {
        let gateway = CompileGateway::new(GatewaySettings::for_deploy_dir("/nonexistent"));
        let first = gateway.enter_shared();
        assert_eq!(gateway.contention_events(), 0);
        let second = gateway.enter_shared();
        assert_eq!(gateway.contention_events(), 1);
        drop(second);
        drop(first);
        let _third = gateway.enter_shared();
        assert_eq!(gateway.contention_events(), 1);
    }
}
