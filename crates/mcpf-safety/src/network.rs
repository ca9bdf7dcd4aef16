// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host allow/deny rules applied by HTTP-family transports before send and
//! re-applied against redirect targets.

use mcpf_glob::host_matches_any;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Outbound network rules for HTTP/SSE/streamable-HTTP transports.
///
/// `local_hosts` are treated as always-allowed regardless of the allow/deny
/// lists (loopback endpoints the fuzzer itself is told to target). The deny
/// list takes precedence over the allow list, matching the policy-combination
/// convention used elsewhere in this crate.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NetworkPolicy {
    /// Hosts considered local to the fuzzing session; always allowed.
    #[serde(default)]
    pub local_hosts: Vec<String>,
    /// Hosts explicitly allowed. Empty means "no allowlist constraint".
    #[serde(default)]
    pub allow: Vec<String>,
    /// Hosts explicitly denied. Checked before `allow`.
    #[serde(default)]
    pub deny: Vec<String>,
    /// When true, block every outbound request regardless of the lists.
    #[serde(default)]
    pub no_network: bool,
    /// Whether HTTP-family transports may follow redirects at all. When
    /// false, every redirect hop is denied regardless of its host.
    #[serde(default = "default_allow_redirect")]
    pub allow_redirect: bool,
}

fn default_allow_redirect() -> bool {
    true
}

impl Default for NetworkPolicy {
    fn default() -> Self {
        Self {
            local_hosts: Vec::new(),
            allow: Vec::new(),
            deny: Vec::new(),
            no_network: false,
            allow_redirect: true,
        }
    }
}

impl NetworkPolicy {
    /// A policy with no restrictions: every host is allowed.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Decide whether a redirect hop to `host` may be followed: both the
    /// blanket `allow_redirect` gate and the ordinary host rules apply.
    pub fn redirect_allowed(&self, host: &str) -> bool {
        self.allow_redirect && self.is_allowed(host)
    }

    /// Decide whether `host` may be contacted.
    pub fn is_allowed(&self, host: &str) -> bool {
        if self.no_network {
            return false;
        }
        if host_matches_any(host, &self.local_hosts) {
            return true;
        }
        if host_matches_any(host, &self.deny) {
            return false;
        }
        self.allow.is_empty() || host_matches_any(host, &self.allow)
    }
}
