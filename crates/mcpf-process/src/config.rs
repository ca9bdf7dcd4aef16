// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration for spawning a managed child process.

use mcpf_core::duration::option_duration_millis;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Parameters for spawning and supervising a stdio-transport child process.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// Executable to run.
    pub command: String,
    /// Arguments passed to the executable.
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory for the child. Defaults to the fuzzer's own cwd.
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    /// Extra environment variables merged on top of (or replacing) the
    /// inherited environment.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Whether to inherit the fuzzer's own environment.
    #[serde(default = "default_true")]
    pub inherit_env: bool,
    /// Wall-clock cap on the process's total lifetime. `None` means no cap
    /// beyond the session's own shutdown.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "option_duration_millis")]
    pub max_lifetime: Option<Duration>,
    /// How long since the last observed stdin write or stdout read before
    /// the watchdog logs a warning that the process may be hung.
    #[serde(
        default = "default_process_timeout",
        serialize_with = "mcpf_core::duration::duration_millis",
        deserialize_with = "mcpf_core::duration::duration_millis_de"
    )]
    pub process_timeout: Duration,
    /// Extra idle time allowed past `process_timeout` before a TERM is sent,
    /// gated by `auto_kill`.
    #[serde(
        default = "default_extra_buffer",
        serialize_with = "mcpf_core::duration::duration_millis",
        deserialize_with = "mcpf_core::duration::duration_millis_de"
    )]
    pub extra_buffer: Duration,
    /// Whether the watchdog may escalate to TERM/KILL at all, or only warn.
    #[serde(default = "default_true")]
    pub auto_kill: bool,
    /// Absolute idle ceiling, independent of `auto_kill`, past which the
    /// watchdog sends KILL.
    #[serde(
        default = "default_max_hang_time",
        serialize_with = "mcpf_core::duration::duration_millis",
        deserialize_with = "mcpf_core::duration::duration_millis_de"
    )]
    pub max_hang_time: Duration,
    /// How often the watchdog polls this process's activity and lifetime.
    #[serde(
        default = "default_check_interval",
        serialize_with = "mcpf_core::duration::duration_millis",
        deserialize_with = "mcpf_core::duration::duration_millis_de"
    )]
    pub check_interval: Duration,
}

fn default_true() -> bool {
    true
}

fn default_process_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_extra_buffer() -> Duration {
    Duration::from_secs(10)
}

fn default_max_hang_time() -> Duration {
    Duration::from_secs(60)
}

fn default_check_interval() -> Duration {
    Duration::from_millis(250)
}

impl ProcessConfig {
    /// Build a minimal config for `command` with no arguments.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
            inherit_env: true,
            max_lifetime: None,
            process_timeout: default_process_timeout(),
            extra_buffer: default_extra_buffer(),
            auto_kill: true,
            max_hang_time: default_max_hang_time(),
            check_interval: default_check_interval(),
        }
    }

    /// Builder-style: append arguments.
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_inherits_env_and_has_no_lifetime_cap() {
        let cfg = ProcessConfig::new("mcp-server");
        assert!(cfg.inherit_env);
        assert!(cfg.max_lifetime.is_none());
        assert_eq!(cfg.process_timeout, Duration::from_secs(30));
        assert_eq!(cfg.extra_buffer, Duration::from_secs(10));
        assert_eq!(cfg.max_hang_time, Duration::from_secs(60));
        assert!(cfg.auto_kill);
    }

    #[test]
    fn with_args_sets_argv() {
        let cfg = ProcessConfig::new("mcp-server").with_args(["--stdio", "--verbose"]);
        assert_eq!(cfg.args, vec!["--stdio".to_string(), "--verbose".to_string()]);
    }
}
