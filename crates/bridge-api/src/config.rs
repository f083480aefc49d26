//! Server configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use bridge_core::gateway::{DEFAULT_ARTIFACT_NAME, DEFAULT_COMPILER_FILE_NAME, DEFAULT_SCRATCH_DIR_NAME};
use bridge_core::{ArtifactIsolation, Error, GatewaySettings, Result};

/// Default listen port.
pub const DEFAULT_HTTP_PORT: u16 = 5000;

/// Default request body limit (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Default compiler deadline in seconds.
pub const DEFAULT_COMPILE_TIMEOUT_SECS: u64 = 10;

/// Configuration for the compile gateway server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server port.
    pub http_port: u16,

    /// Enable debug mode (pretty, human-readable logs).
    pub debug: bool,

    /// Deployment directory. The compiler and scratch root live here by default.
    pub deploy_dir: PathBuf,

    /// Compiler executable. `None` means `<deploy_dir>/compiler`
    /// (`compiler.exe` on Windows).
    #[serde(default)]
    pub compiler_path: Option<PathBuf>,

    /// Extra compiler arguments.
    #[serde(default)]
    pub compiler_args: Vec<String>,

    /// Scratch root. `None` means `<deploy_dir>/temp`.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,

    /// Artifact file name written by the compiler.
    pub artifact_name: String,

    /// Compiler deadline in seconds. Must be greater than zero.
    pub compile_timeout_secs: u64,

    /// Artifact isolation mode.
    #[serde(default)]
    pub artifact_isolation: ArtifactIsolation,

    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,

    /// Mount the Prometheus `/metrics` endpoint.
    #[serde(default)]
    pub metrics_enabled: bool,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins. `["*"]` allows any origin. Empty list disables CORS.
    pub allowed_origins: Vec<String>,

    /// Max age for preflight cache (seconds).
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            // The browser console is served from anywhere, including file://.
            allowed_origins: vec!["*".to_string()],
            max_age_seconds: 3600,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: DEFAULT_HTTP_PORT,
            debug: false,
            deploy_dir: PathBuf::from("."),
            compiler_path: None,
            compiler_args: Vec::new(),
            scratch_dir: None,
            artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
            compile_timeout_secs: DEFAULT_COMPILE_TIMEOUT_SECS,
            artifact_isolation: ArtifactIsolation::default(),
            cors: CorsConfig::default(),
            metrics_enabled: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `PORT` | listen port |
    /// | `BRIDGE_DEBUG` | pretty logs |
    /// | `BRIDGE_DEPLOY_DIR` | deployment directory (default: current dir) |
    /// | `BRIDGE_COMPILER_PATH` | compiler executable |
    /// | `BRIDGE_COMPILER_ARGS` | whitespace-separated compiler arguments |
    /// | `BRIDGE_SCRATCH_DIR` | scratch root |
    /// | `BRIDGE_ARTIFACT_NAME` | artifact file name |
    /// | `BRIDGE_COMPILE_TIMEOUT_SECS` | compiler deadline |
    /// | `BRIDGE_ARTIFACT_ISOLATION` | `per_request`, `serialized`, or `shared` |
    /// | `BRIDGE_CORS_ALLOWED_ORIGINS` | comma-separated origins or `*` |
    /// | `BRIDGE_CORS_MAX_AGE_SECONDS` | preflight cache age |
    /// | `BRIDGE_METRICS_ENABLED` | mount `/metrics` |
    /// | `BRIDGE_MAX_BODY_BYTES` | request body limit |
    ///
    /// Relative paths are resolved against the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is set to an unparseable value or the
    /// current directory cannot be determined.
    pub fn from_env() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| Error::io("failed to resolve current directory", ".", e))?;
        Self::from_lookup(&|name: &str| std::env::var(name).ok(), &cwd)
    }

    /// Loads configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable holds an unparseable value.
    pub fn from_lookup(lookup: Lookup<'_>, cwd: &Path) -> Result<Self> {
        let mut config = Self {
            deploy_dir: cwd.to_path_buf(),
            ..Self::default()
        };

        if let Some(port) = env_u16(lookup, "PORT")? {
            config.http_port = port;
        }
        if let Some(debug) = env_bool(lookup, "BRIDGE_DEBUG")? {
            config.debug = debug;
        }

        if let Some(dir) = env_string(lookup, "BRIDGE_DEPLOY_DIR") {
            config.deploy_dir = absolutize(cwd, dir);
        }
        if let Some(path) = env_string(lookup, "BRIDGE_COMPILER_PATH") {
            config.compiler_path = Some(absolutize(cwd, path));
        }
        if let Some(args) = env_string(lookup, "BRIDGE_COMPILER_ARGS") {
            config.compiler_args = args.split_whitespace().map(str::to_string).collect();
        }
        if let Some(dir) = env_string(lookup, "BRIDGE_SCRATCH_DIR") {
            config.scratch_dir = Some(absolutize(cwd, dir));
        }
        if let Some(name) = env_string(lookup, "BRIDGE_ARTIFACT_NAME") {
            config.artifact_name = name;
        }
        if let Some(secs) = env_u64(lookup, "BRIDGE_COMPILE_TIMEOUT_SECS")? {
            if secs == 0 {
                return Err(Error::InvalidInput(
                    "BRIDGE_COMPILE_TIMEOUT_SECS must be greater than 0".to_string(),
                ));
            }
            config.compile_timeout_secs = secs;
        }
        if let Some(mode) = env_string(lookup, "BRIDGE_ARTIFACT_ISOLATION") {
            config.artifact_isolation = mode.parse().map_err(|_| {
                Error::InvalidInput(format!(
                    "BRIDGE_ARTIFACT_ISOLATION must be one of: per_request, serialized, shared (got {mode})"
                ))
            })?;
        }

        if let Some(origins) = env_string(lookup, "BRIDGE_CORS_ALLOWED_ORIGINS") {
            config.cors.allowed_origins = parse_cors_allowed_origins(&origins);
        }
        if let Some(max_age) = env_u64(lookup, "BRIDGE_CORS_MAX_AGE_SECONDS")? {
            config.cors.max_age_seconds = max_age;
        }
        if let Some(enabled) = env_bool(lookup, "BRIDGE_METRICS_ENABLED")? {
            config.metrics_enabled = enabled;
        }
        if let Some(limit) = env_usize(lookup, "BRIDGE_MAX_BODY_BYTES")? {
            config.max_body_bytes = limit;
        }

        Ok(config)
    }

    /// Returns the effective compiler path.
    #[must_use]
    pub fn compiler_path(&self) -> PathBuf {
        self.compiler_path
            .clone()
            .unwrap_or_else(|| self.deploy_dir.join(DEFAULT_COMPILER_FILE_NAME))
    }

    /// Returns the effective scratch root.
    #[must_use]
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(|| self.deploy_dir.join(DEFAULT_SCRATCH_DIR_NAME))
    }

    /// Builds gateway settings from this configuration.
    #[must_use]
    pub fn gateway_settings(&self) -> GatewaySettings {
        GatewaySettings {
            compiler: self.compiler_path(),
            compiler_args: self.compiler_args.clone(),
            deploy_dir: self.deploy_dir.clone(),
            scratch_dir: self.scratch_dir(),
            artifact_name: self.artifact_name.clone(),
            timeout: Duration::from_secs(self.compile_timeout_secs),
            isolation: self.artifact_isolation,
        }
    }
}

/// Variable source used by [`Config::from_lookup`].
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn absolutize(cwd: &Path, value: String) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

fn env_string(lookup: Lookup<'_>, name: &str) -> Option<String> {
    lookup(name).and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn env_u16(lookup: Lookup<'_>, name: &str) -> Result<Option<u16>> {
    let Some(v) = env_string(lookup, name) else {
        return Ok(None);
    };
    v.parse::<u16>()
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("{name} must be a u16: {e}")))
}

fn env_u64(lookup: Lookup<'_>, name: &str) -> Result<Option<u64>> {
    let Some(v) = env_string(lookup, name) else {
        return Ok(None);
    };
    v.parse::<u64>()
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("{name} must be a u64: {e}")))
}

fn env_usize(lookup: Lookup<'_>, name: &str) -> Result<Option<usize>> {
    let Some(v) = env_string(lookup, name) else {
        return Ok(None);
    };
    v.parse::<usize>()
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("{name} must be a usize: {e}")))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    let value = value.trim().to_ascii_lowercase();
    match value.as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        _ => Err(Error::InvalidInput(format!(
            "{name} must be a boolean (true/false/1/0)"
        ))),
    }
}

fn env_bool(lookup: Lookup<'_>, name: &str) -> Result<Option<bool>> {
    let Some(v) = env_string(lookup, name) else {
        return Ok(None);
    };
    parse_bool(name, &v).map(Some)
}

fn parse_cors_allowed_origins(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if trimmed == "*" {
        return vec!["*".to_string()];
    }

    trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
