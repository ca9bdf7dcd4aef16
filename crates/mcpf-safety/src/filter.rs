// SPDX-License-Identifier: MIT OR Apache-2.0
//! The pure function the session driver consults before dispatching any
//! generated [`mcpf_core::TestCase`] to a transport.

use crate::danger::{self, BLOCKED_URI_SCHEMES};
use crate::network::NetworkPolicy;
use crate::sandbox::FilesystemSandbox;
use mcpf_core::JsonValue;
use serde::{Deserialize, Serialize};

/// Outcome of running an envelope through the safety filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decision {
    /// The envelope may be sent as-is.
    Allow(JsonValue),
    /// The envelope may be sent once dangerous substrings are stripped.
    Sanitize(JsonValue),
    /// The envelope must not be sent; the executor synthesizes a mock
    /// response instead.
    Block(String),
}

impl Decision {
    /// True for [`Decision::Allow`] and [`Decision::Sanitize`].
    pub fn is_sendable(&self) -> bool {
        !matches!(self, Decision::Block(_))
    }
}

/// Methods never allowed through regardless of their arguments.
#[derive(Debug, Clone, Default)]
pub struct MethodDenyList(Vec<String>);

impl MethodDenyList {
    /// Build a deny list from method names.
    pub fn new(methods: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(methods.into_iter().map(Into::into).collect())
    }

    fn denies(&self, method: &str) -> bool {
        self.0.iter().any(|m| m == method)
    }
}

/// Inspects an about-to-send JSON-RPC `params` value against the danger
/// pattern catalog, the method deny list, and the network policy.
///
/// `check` is pure: identical `(method, args)` pairs always produce an
/// identical [`Decision`], as required of the safety filter.
#[derive(Debug, Clone, Default)]
pub struct SafetyFilter {
    method_deny_list: MethodDenyList,
    network_policy: NetworkPolicy,
    sandbox: Option<FilesystemSandbox>,
}

impl SafetyFilter {
    /// Build a filter with the given method deny list and network policy.
    /// No filesystem sandbox is attached; see [`with_sandbox`](Self::with_sandbox).
    pub fn new(method_deny_list: MethodDenyList, network_policy: NetworkPolicy) -> Self {
        Self { method_deny_list, network_policy, sandbox: None }
    }

    /// Attach a filesystem sandbox. String leaves that look like paths and
    /// resolve outside the sandbox root are scrubbed rather than sent
    /// verbatim.
    pub fn with_sandbox(mut self, sandbox: FilesystemSandbox) -> Self {
        self.sandbox = Some(sandbox);
        self
    }

    /// Evaluate `args` (the request's `params`) against every rule.
    pub fn check(&self, method: &str, args: &JsonValue) -> Decision {
        if self.method_deny_list.denies(method) {
            return Decision::Block(format!("method '{method}' is denied"));
        }

        if let Some(host) = find_network_destination(args) {
            if !self.network_policy.is_allowed(&host) {
                return Decision::Block(format!("network destination '{host}' is denied"));
            }
        }

        match scan(args, self.sandbox.as_ref()) {
            Scan::Clean => Decision::Allow(args.clone()),
            Scan::Blockable(reason) => Decision::Block(reason),
            Scan::Sanitizable => Decision::Sanitize(sanitize(args, self.sandbox.as_ref())),
        }
    }
}

enum Scan {
    Clean,
    Sanitizable,
    Blockable(String),
}

fn scan(value: &JsonValue, sandbox: Option<&FilesystemSandbox>) -> Scan {
    match value {
        JsonValue::String(s) => scan_string(s, sandbox),
        JsonValue::Array(items) => items.iter().map(|v| scan(v, sandbox)).fold(Scan::Clean, combine),
        JsonValue::Object(map) => map.values().map(|v| scan(v, sandbox)).fold(Scan::Clean, combine),
        _ => Scan::Clean,
    }
}

fn combine(acc: Scan, next: Scan) -> Scan {
    match (acc, next) {
        (Scan::Blockable(reason), _) | (_, Scan::Blockable(reason)) => Scan::Blockable(reason),
        (Scan::Sanitizable, _) | (_, Scan::Sanitizable) => Scan::Sanitizable,
        (Scan::Clean, Scan::Clean) => Scan::Clean,
    }
}

fn scan_string(s: &str, sandbox: Option<&FilesystemSandbox>) -> Scan {
    if danger::contains_dangerous_command(s) {
        return Scan::Blockable(format!("string contains a dangerous command substring: {s:?}"));
    }
    if danger::references_launcher(s) {
        return Scan::Blockable(format!("string references a launcher binary: {s:?}"));
    }
    if let Some(scheme) = danger::uri_scheme(s) {
        if BLOCKED_URI_SCHEMES.contains(&scheme.as_str()) {
            return Scan::Blockable(format!("string uses blocked URI scheme '{scheme}'"));
        }
        if !danger::ALLOWED_URI_SCHEMES.contains(&scheme.as_str()) {
            return Scan::Sanitizable;
        }
    }
    if let Some(sandbox) = sandbox {
        if looks_like_path(s) && !sandbox.contains(strip_file_scheme(s)) {
            return Scan::Sanitizable;
        }
    }
    Scan::Clean
}

/// Strip dangerous substrings and launcher references from every string leaf,
/// leaving the JSON shape intact.
fn sanitize(value: &JsonValue, sandbox: Option<&FilesystemSandbox>) -> JsonValue {
    match value {
        JsonValue::String(s) => JsonValue::String(sanitize_string(s, sandbox)),
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(|v| sanitize(v, sandbox)).collect()),
        JsonValue::Object(map) => {
            JsonValue::Object(map.iter().map(|(k, v)| (k.clone(), sanitize(v, sandbox))).collect())
        }
        other => other.clone(),
    }
}

fn sanitize_string(s: &str, sandbox: Option<&FilesystemSandbox>) -> String {
    let mut out = s.to_string();
    for pattern in danger::DANGEROUS_COMMAND_SUBSTRINGS {
        out = out.replace(pattern, "[redacted]");
    }
    if let Some(scheme) = danger::uri_scheme(&out) {
        if !danger::ALLOWED_URI_SCHEMES.contains(&scheme.as_str())
            && !BLOCKED_URI_SCHEMES.contains(&scheme.as_str())
        {
            out = format!("[redacted-scheme-{scheme}]");
        }
    }
    if let Some(sandbox) = sandbox {
        if looks_like_path(&out) && !sandbox.contains(strip_file_scheme(&out)) {
            out = "[redacted-path-outside-sandbox]".to_string();
        }
    }
    out
}

/// Best-effort check for whether a string leaf is shaped like a filesystem
/// path rather than some other kind of value. Deliberately loose: the
/// sandbox itself decides containment, this just decides whether to ask it.
fn looks_like_path(s: &str) -> bool {
    if let Some(scheme) = danger::uri_scheme(s) {
        return scheme == "file";
    }
    s.starts_with('/') || s.starts_with("./") || s.starts_with("../") || s.contains('/')
}

fn strip_file_scheme(s: &str) -> &str {
    s.strip_prefix("file://").unwrap_or(s)
}

/// Best-effort extraction of a hostname from a URL-shaped string leaf, for
/// the network-policy check. Only `http(s)://` values are inspected; other
/// values pass through untouched (they aren't network destinations).
fn find_network_destination(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => {
            let rest = s.strip_prefix("http://").or_else(|| s.strip_prefix("https://"))?;
            let host = rest.split(['/', ':', '?', '#']).next()?;
            if host.is_empty() {
                None
            } else {
                Some(host.to_string())
            }
        }
        JsonValue::Array(items) => items.iter().find_map(find_network_destination),
        JsonValue::Object(map) => map.values().find_map(find_network_destination),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn allows_benign_args() {
        let filter = SafetyFilter::default();
        let args = json!({"query": "hello world"});
        assert_eq!(filter.check("tools/call", &args), Decision::Allow(args));
    }

    #[test]
    fn blocks_dangerous_command_substring() {
        let filter = SafetyFilter::default();
        let args = json!({"cmd": "rm -rf / --no-preserve-root"});
        assert!(matches!(filter.check("tools/call", &args), Decision::Block(_)));
    }

    #[test]
    fn blocks_javascript_uri() {
        let filter = SafetyFilter::default();
        let args = json!({"href": "javascript:alert(1)"});
        assert!(matches!(filter.check("tools/call", &args), Decision::Block(_)));
    }

    #[test]
    fn sanitizes_unrecognized_scheme() {
        let filter = SafetyFilter::default();
        let args = json!({"href": "gopher://example.com/1"});
        match filter.check("tools/call", &args) {
            Decision::Sanitize(sanitized) => {
                assert_eq!(sanitized["href"], json!("[redacted-scheme-gopher]"));
            }
            other => panic!("expected Sanitize, got {other:?}"),
        }
    }

    #[test]
    fn blocks_denied_method_regardless_of_args() {
        let filter = SafetyFilter::new(MethodDenyList::new(["dangerous/op"]), NetworkPolicy::permissive());
        assert!(matches!(filter.check("dangerous/op", &json!({})), Decision::Block(_)));
    }

    #[test]
    fn blocks_denied_network_destination() {
        let policy = NetworkPolicy { deny: vec!["evil.example.com".into()], ..NetworkPolicy::default() };
        let filter = SafetyFilter::new(MethodDenyList::default(), policy);
        let args = json!({"url": "https://evil.example.com/payload"});
        assert!(matches!(filter.check("tools/call", &args), Decision::Block(_)));
    }

    #[test]
    fn sandboxed_path_outside_root_is_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = crate::sandbox::FilesystemSandbox::new(dir.path()).unwrap();
        let filter = SafetyFilter::default().with_sandbox(sandbox);
        let args = json!({"path": "/etc/passwd"});
        match filter.check("tools/call", &args) {
            Decision::Sanitize(sanitized) => {
                assert_eq!(sanitized["path"], json!("[redacted-path-outside-sandbox]"));
            }
            other => panic!("expected Sanitize, got {other:?}"),
        }
    }

    #[test]
    fn sandboxed_path_inside_root_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, b"x").unwrap();
        let sandbox = crate::sandbox::FilesystemSandbox::new(dir.path()).unwrap();
        let filter = SafetyFilter::default().with_sandbox(sandbox);
        let args = json!({"path": file.to_string_lossy()});
        assert_eq!(filter.check("tools/call", &args), Decision::Allow(args));
    }

    #[test]
    fn no_sandbox_attached_leaves_paths_untouched() {
        let filter = SafetyFilter::default();
        let args = json!({"path": "/etc/passwd"});
        assert_eq!(filter.check("tools/call", &args), Decision::Allow(args));
    }

    #[test]
    fn check_is_pure() {
        let filter = SafetyFilter::default();
        let args = json!({"cmd": "rm -rf /"});
        let first = filter.check("tools/call", &args);
        let second = filter.check("tools/call", &args);
        assert_eq!(first, second);
    }
}
