// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and environment overrides for the
//! MCP fuzzer.
//!
//! This crate provides [`FuzzConfig`] — the resolved external-interface
//! configuration record the session driver is built from — together with
//! helpers for loading it from a TOML file, applying environment variable
//! overrides, and producing advisory [`ConfigWarning`]s.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use mcpf_safety::NetworkPolicy;
use mcpf_strategy::{Mode, PhaseSelection};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while loading or validating a [`FuzzConfig`].
///
/// Per the error handling design, every instance here is fatal at startup
/// (exit status 2); there is no retry path for a malformed configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

impl mcpf_error::Classify for ConfigError {
    fn category(&self) -> mcpf_error::ErrorCategory {
        mcpf_error::ErrorCategory::Config
    }
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent a session from starting but
/// deserve the operator's attention.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarning {
    /// `timeout_s` is unusually large for a per-case budget.
    LargeTimeout {
        /// The configured timeout, in seconds.
        secs: f64,
    },
    /// `max_concurrency` is unusually high given `runs_per_tool`.
    HighConcurrency {
        /// The configured concurrency cap.
        max_concurrency: usize,
    },
    /// Safety filtering is disabled against a network endpoint.
    SafetyDisabledOnNetworkEndpoint,
    /// No RNG seed was supplied; this session's cases will not be
    /// reproducible from its `RunRecord`s alone.
    NoSeedConfigured,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::LargeTimeout { secs } => {
                write!(f, "timeout_s of {secs}s is unusually large")
            }
            ConfigWarning::HighConcurrency { max_concurrency } => {
                write!(f, "max_concurrency of {max_concurrency} is unusually high")
            }
            ConfigWarning::SafetyDisabledOnNetworkEndpoint => {
                write!(f, "safety_enabled is false against a network endpoint")
            }
            ConfigWarning::NoSeedConfigured => {
                write!(f, "no seed configured; this run will not be reproducible")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// The wire shape the session speaks to the target server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// Plain HTTP POST.
    Http,
    /// HTTP POST over TLS.
    Https,
    /// Server-Sent Events.
    Sse,
    /// Newline-delimited JSON over a spawned child process's stdio.
    Stdio,
    /// Streamable HTTP (a POST whose reply may be a single JSON body or an
    /// SSE stream of progress events terminating in one result).
    StreamableHttp,
}

impl Protocol {
    /// True for the one protocol that spawns a child process rather than
    /// dialing a URL.
    pub fn is_process(self) -> bool {
        matches!(self, Protocol::Stdio)
    }
}

/// Where the target server lives: a URL for the network-family transports,
/// or an executable and argv for stdio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Endpoint {
    /// A network endpoint dialed by the HTTP/SSE/streamable-HTTP transports.
    Network {
        /// The target URL.
        #[schemars(with = "String")]
        url: url::Url,
    },
    /// A child process spoken to over stdio.
    Process {
        /// Executable to spawn.
        command: String,
        /// Arguments passed to the executable.
        #[serde(default)]
        args: Vec<String>,
    },
}

/// Top-level resolved configuration for one fuzzing session.
///
/// Mirrors the external-interface record exactly: every field here is
/// something a collaborator (CLI flags, a TOML file, environment
/// overrides) must have resolved before the session driver is built.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FuzzConfig {
    /// Which targets to fuzz: discovered tools, the protocol catalog, or both.
    #[serde(default = "default_mode")]
    pub mode: Mode,
    /// Which generation phase(s) to run.
    #[serde(default)]
    pub phase: PhaseSelection,
    /// The wire shape to speak.
    pub protocol: Protocol,
    /// Where the target server lives.
    pub endpoint: Endpoint,
    /// Cases generated per phase, per target.
    #[serde(default = "default_runs_per_tool")]
    pub runs_per_tool: usize,
    /// Maximum cases dispatched concurrently.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Wall-clock budget per case, in seconds.
    #[serde(default = "default_timeout_s")]
    pub timeout_s: f64,
    /// Extra attempts after the first for retry-eligible transport errors.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    /// Whether the safety filter is consulted before every dispatch.
    #[serde(default = "default_safety_enabled")]
    pub safety_enabled: bool,
    /// Absolute path the filesystem sandbox confines generated paths to.
    pub fs_root: PathBuf,
    /// Whether string leaves that look like paths are scrubbed when they
    /// resolve outside `fs_root`.
    #[serde(default = "default_sandbox_paths")]
    pub sandbox_paths: bool,
    /// Outbound host rules applied by HTTP-family transports.
    #[serde(default)]
    pub network_policy: NetworkPolicy,
    /// RNG seed for reproducibility. `None` seeds from session start time.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Headers injected per request by HTTP-family transports.
    #[serde(default)]
    pub auth_headers: BTreeMap<String, String>,
}

fn default_mode() -> Mode {
    Mode::Both
}

fn default_runs_per_tool() -> usize {
    10
}

fn default_max_concurrency() -> usize {
    5
}

fn default_timeout_s() -> f64 {
    30.0
}

fn default_retry_count() -> u32 {
    1
}

fn default_safety_enabled() -> bool {
    true
}

fn default_sandbox_paths() -> bool {
    true
}

impl Default for FuzzConfig {
    /// A config with every numeric knob at its documented default and a
    /// placeholder stdio endpoint. `protocol`/`endpoint`/`fs_root` have no
    /// sensible global default, so validation rejects this as-is — it
    /// exists so a TOML file only needs to specify what it overrides.
    fn default() -> Self {
        Self {
            mode: default_mode(),
            phase: PhaseSelection::default(),
            protocol: Protocol::Stdio,
            endpoint: Endpoint::Process { command: String::new(), args: Vec::new() },
            runs_per_tool: default_runs_per_tool(),
            max_concurrency: default_max_concurrency(),
            timeout_s: default_timeout_s(),
            retry_count: default_retry_count(),
            safety_enabled: default_safety_enabled(),
            fs_root: std::env::temp_dir(),
            sandbox_paths: default_sandbox_paths(),
            network_policy: NetworkPolicy::default(),
            seed: None,
            auth_headers: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Above this, a per-case timeout is flagged as unusually large.
const LARGE_TIMEOUT_THRESHOLD_SECS: f64 = 300.0;

/// Above this, concurrency is flagged as unusually high.
const HIGH_CONCURRENCY_THRESHOLD: usize = 64;

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`FuzzConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file on top of
///   [`FuzzConfig::default()`] (fields absent from the file keep their
///   default).
/// * If `path` is `None`, returns [`FuzzConfig::default()`] unchanged.
///
/// Environment variable overrides are applied on top in both cases, before
/// validation.
pub fn load_config(path: Option<&Path>) -> Result<FuzzConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => FuzzConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML string into a [`FuzzConfig`].
pub fn parse_toml(content: &str) -> Result<FuzzConfig, ConfigError> {
    toml::from_str::<FuzzConfig>(content).map_err(|e| ConfigError::ParseError { reason: e.to_string() })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Recognised variables:
/// - `MCP_FUZZER_IN_SAFE_MODE` — when `1`, forces `safety_enabled` on.
/// - `MCP_FUZZER_FS_ROOT` — overrides `fs_root`.
/// - `MCP_FUZZER_TIMEOUT` — overrides `timeout_s`.
pub fn apply_env_overrides(config: &mut FuzzConfig) {
    if std::env::var("MCP_FUZZER_IN_SAFE_MODE").as_deref() == Ok("1") {
        config.safety_enabled = true;
    }
    if let Ok(val) = std::env::var("MCP_FUZZER_FS_ROOT") {
        config.fs_root = PathBuf::from(val);
    }
    if let Ok(val) = std::env::var("MCP_FUZZER_TIMEOUT")
        && let Ok(secs) = val.parse::<f64>()
    {
        config.timeout_s = secs;
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a resolved configuration, returning advisory warnings.
///
/// Hard errors (inconsistent protocol/endpoint pairing, out-of-range
/// knobs) come back as a [`ConfigError::ValidationError`]; soft issues
/// come back as warnings.
pub fn validate_config(config: &FuzzConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    match (&config.endpoint, config.protocol.is_process()) {
        (Endpoint::Process { command, .. }, true) => {
            if command.trim().is_empty() {
                errors.push("stdio protocol requires a non-empty endpoint command".into());
            }
        }
        (Endpoint::Network { url }, false) => {
            let scheme_ok = match config.protocol {
                Protocol::Https => url.scheme() == "https",
                Protocol::Http | Protocol::Sse | Protocol::StreamableHttp => {
                    url.scheme() == "http" || url.scheme() == "https"
                }
                Protocol::Stdio => unreachable!("handled above"),
            };
            if !scheme_ok {
                errors.push(format!(
                    "endpoint scheme '{}' does not match protocol {:?}",
                    url.scheme(),
                    config.protocol
                ));
            }
        }
        (Endpoint::Process { .. }, false) => {
            errors.push(format!("protocol {:?} requires a network endpoint, not a process", config.protocol));
        }
        (Endpoint::Network { .. }, true) => {
            errors.push("stdio protocol requires a process endpoint, not a network URL".into());
        }
    }

    if config.runs_per_tool == 0 {
        errors.push("runs_per_tool must be >= 1".into());
    }
    if config.max_concurrency == 0 {
        errors.push("max_concurrency must be >= 1".into());
    }
    if !(config.timeout_s.is_finite() && config.timeout_s > 0.0) {
        errors.push(format!("timeout_s must be a positive, finite number (got {})", config.timeout_s));
    }
    if !config.fs_root.is_absolute() {
        errors.push(format!("fs_root must be an absolute path (got {})", config.fs_root.display()));
    }
    if config.network_policy.no_network && !config.protocol.is_process() {
        errors.push("network_policy.no_network cannot be set alongside a network protocol".into());
    }

    if config.timeout_s > LARGE_TIMEOUT_THRESHOLD_SECS {
        warnings.push(ConfigWarning::LargeTimeout { secs: config.timeout_s });
    }
    if config.max_concurrency > HIGH_CONCURRENCY_THRESHOLD {
        warnings.push(ConfigWarning::HighConcurrency { max_concurrency: config.max_concurrency });
    }
    if !config.safety_enabled && !config.protocol.is_process() {
        warnings.push(ConfigWarning::SafetyDisabledOnNetworkEndpoint);
    }
    if config.seed.is_none() {
        warnings.push(ConfigWarning::NoSeedConfigured);
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
