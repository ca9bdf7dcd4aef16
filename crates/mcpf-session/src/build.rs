// SPDX-License-Identifier: MIT OR Apache-2.0
//! Turns a resolved [`FuzzConfig`] into the transport and safety-filter
//! collaborators a session drives.

use crate::error::SessionError;
use mcpf_config::{Endpoint, FuzzConfig, Protocol};
use mcpf_process::ProcessConfig;
use mcpf_safety::{CommandBlocker, FilesystemSandbox, MethodDenyList, NetworkPolicy, SafetyFilter, SAFE_MODE_ENV_VAR};
use mcpf_transport::{HttpTransport, SseTransport, StdioTransport, StreamableHttpTransport, Transport};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

/// The transport a session speaks, plus the command-blocker shim directory
/// for a stdio child, if one was installed. The blocker must outlive the
/// transport: dropping it removes the shim directory from disk.
pub(crate) struct BuiltTransport {
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) _command_blocker: Option<CommandBlocker>,
}

pub(crate) fn build_transport(config: &FuzzConfig) -> Result<BuiltTransport, SessionError> {
    let timeout = Duration::from_secs_f64(config.timeout_s);

    match (&config.protocol, &config.endpoint) {
        (Protocol::Stdio, Endpoint::Process { command, args }) => {
            let mut process_config = ProcessConfig::new(command.clone()).with_args(args.clone());
            let command_blocker = if config.safety_enabled {
                let blocker = CommandBlocker::install()?;
                let existing_path = std::env::var("PATH").unwrap_or_default();
                process_config.env.insert("PATH".to_string(), blocker.prepend_to_path(&existing_path));
                process_config.env.insert(SAFE_MODE_ENV_VAR.to_string(), "1".to_string());
                info!(target: "mcpf.session", shim_dir = %blocker.path_prefix().display(), "installed command-blocker shims for stdio child");
                Some(blocker)
            } else {
                None
            };
            let transport = StdioTransport::new(process_config);
            Ok(BuiltTransport { transport: Box::new(transport), _command_blocker: command_blocker })
        }
        (protocol, Endpoint::Network { url }) if !protocol.is_process() => {
            let headers: HashMap<String, String> = config.auth_headers.clone().into_iter().collect();
            let policy = config.network_policy.clone();
            let transport: Box<dyn Transport> = match protocol {
                Protocol::Http | Protocol::Https => {
                    Box::new(HttpTransport::new(url.clone(), headers, timeout, policy)?)
                }
                Protocol::Sse => Box::new(SseTransport::new(url.clone(), headers, timeout, policy)?),
                Protocol::StreamableHttp => {
                    Box::new(StreamableHttpTransport::new(url.clone(), headers, timeout, policy)?)
                }
                Protocol::Stdio => unreachable!("guarded by is_process() above"),
            };
            Ok(BuiltTransport { transport, _command_blocker: None })
        }
        (protocol, _) => Err(SessionError::EndpointMismatch { protocol: *protocol }),
    }
}

/// Build the safety filter a session consults before every dispatch.
///
/// There is no bypass for the danger-pattern scan itself; disabling safety
/// only relaxes the network policy to permissive and drops the filesystem
/// sandbox entirely.
pub(crate) fn build_safety_filter(config: &FuzzConfig) -> SafetyFilter {
    let network_policy = if config.safety_enabled {
        config.network_policy.clone()
    } else {
        NetworkPolicy::permissive()
    };
    let mut filter = SafetyFilter::new(MethodDenyList::default(), network_policy);

    if config.safety_enabled && config.sandbox_paths {
        match FilesystemSandbox::new(&config.fs_root) {
            Ok(sandbox) => filter = filter.with_sandbox(sandbox),
            Err(err) => warn!(
                target: "mcpf.session",
                %err,
                fs_root = %config.fs_root.display(),
                "failed to build filesystem sandbox, path leaves will not be scrubbed"
            ),
        }
    }

    filter
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpf_safety::Decision;
    use std::collections::BTreeMap;

    fn base_config() -> FuzzConfig {
        FuzzConfig {
            mode: mcpf_strategy::Mode::Protocol,
            phase: mcpf_strategy::PhaseSelection::Both,
            protocol: Protocol::Http,
            endpoint: Endpoint::Network { url: "http://127.0.0.1:9999/mcp".parse().unwrap() },
            runs_per_tool: 1,
            max_concurrency: 1,
            timeout_s: 1.0,
            retry_count: 0,
            safety_enabled: true,
            fs_root: std::env::temp_dir(),
            sandbox_paths: true,
            network_policy: NetworkPolicy::default(),
            seed: Some(1),
            auth_headers: BTreeMap::new(),
        }
    }

    #[test]
    fn stdio_protocol_against_a_network_endpoint_is_rejected() {
        let mut config = base_config();
        config.protocol = Protocol::Stdio;
        let err = build_transport(&config).expect_err("stdio requires a process endpoint");
        assert!(matches!(err, SessionError::EndpointMismatch { protocol: Protocol::Stdio }));
    }

    #[test]
    fn network_protocol_against_a_process_endpoint_is_rejected() {
        let mut config = base_config();
        config.endpoint = Endpoint::Process { command: "mcp-server".into(), args: vec![] };
        let err = build_transport(&config).expect_err("http requires a network endpoint");
        assert!(matches!(err, SessionError::EndpointMismatch { protocol: Protocol::Http }));
    }

    #[test]
    fn stdio_with_safety_enabled_installs_a_command_blocker_and_safe_mode_env() {
        let mut config = base_config();
        config.protocol = Protocol::Stdio;
        config.endpoint = Endpoint::Process { command: "mcp-server".into(), args: vec!["--stdio".into()] };

        let built = build_transport(&config).expect("stdio transport builds");

        assert!(built._command_blocker.is_some());
    }

    #[test]
    fn disabling_safety_relaxes_the_network_policy_to_permissive() {
        let mut config = base_config();
        config.safety_enabled = false;
        config.network_policy = NetworkPolicy { deny: vec!["evil.example.com".into()], ..NetworkPolicy::default() };

        let filter = build_safety_filter(&config);
        let args = serde_json::json!({ "url": "http://evil.example.com/x" });

        assert!(matches!(filter.check("tools/call", &args), Decision::Allow(_)));
    }

    #[test]
    fn sandbox_paths_enabled_scrubs_a_path_outside_fs_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = base_config();
        config.fs_root = dir.path().to_path_buf();
        config.sandbox_paths = true;

        let filter = build_safety_filter(&config);
        let args = serde_json::json!({ "path": "/etc/passwd" });

        match filter.check("tools/call", &args) {
            Decision::Sanitize(sanitized) => {
                assert_eq!(sanitized["path"], serde_json::json!("[redacted-path-outside-sandbox]"));
            }
            other => panic!("expected Sanitize, got {other:?}"),
        }
    }

    #[test]
    fn sandbox_paths_disabled_leaves_paths_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = base_config();
        config.fs_root = dir.path().to_path_buf();
        config.sandbox_paths = false;

        let filter = build_safety_filter(&config);
        let args = serde_json::json!({ "path": "/etc/passwd" });

        assert!(matches!(filter.check("tools/call", &args), Decision::Allow(_)));
    }

    #[test]
    fn enabling_safety_applies_the_configured_network_policy() {
        let mut config = base_config();
        config.safety_enabled = true;
        config.network_policy = NetworkPolicy { deny: vec!["evil.example.com".into()], ..NetworkPolicy::default() };

        let filter = build_safety_filter(&config);
        let args = serde_json::json!({ "url": "http://evil.example.com/x" });

        assert!(matches!(filter.check("tools/call", &args), Decision::Block(_)));
    }
}
