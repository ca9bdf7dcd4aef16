// SPDX-License-Identifier: MIT OR Apache-2.0
//! The catalog the [`crate::filter::SafetyFilter`] matches string leaves and
//! URIs against.

/// Command substrings that are never acceptable in a value sent to a real
/// MCP server, regardless of which tool declared the parameter.
pub const DANGEROUS_COMMAND_SUBSTRINGS: &[&str] = &[
    "rm -rf /",
    "rm -rf ~",
    "curl | sh",
    "curl | bash",
    "wget | sh",
    "mkfs",
    "dd if=/dev/zero",
    ":(){ :|:& };:",
    "> /dev/sda",
    "chmod -R 777 /",
];

/// URI schemes allowed through unscrutinized. Anything else triggers a
/// sanitize/block decision when found in a string leaf that looks like a URI.
pub const ALLOWED_URI_SCHEMES: &[&str] = &["http", "https", "mailto", "tel", "file"];

/// Schemes that are always blocked outright, even though they'd otherwise
/// parse as a URI.
pub const BLOCKED_URI_SCHEMES: &[&str] = &["javascript", "data", "vbscript"];

/// Launcher binaries that would hand control to a browser or default
/// application handler if actually executed.
pub const LAUNCHER_BINARIES: &[&str] = &[
    "xdg-open",
    "open",
    "start",
    "firefox",
    "chrome",
    "chromium",
    "safari",
    "msedge",
];

/// True if `value` contains any dangerous command substring.
pub fn contains_dangerous_command(value: &str) -> bool {
    DANGEROUS_COMMAND_SUBSTRINGS
        .iter()
        .any(|pattern| value.contains(pattern))
}

/// True if `value` names a launcher binary, as a standalone word or the
/// leading token of a command line.
pub fn references_launcher(value: &str) -> bool {
    let first_token = value.split_whitespace().next().unwrap_or(value);
    LAUNCHER_BINARIES
        .iter()
        .any(|bin| first_token == *bin || first_token.ends_with(&format!("/{bin}")))
}

/// Extract the scheme of `value` if it parses as `scheme:...`, lower-cased.
pub fn uri_scheme(value: &str) -> Option<String> {
    let (scheme, rest) = value.split_once(':')?;
    if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-') {
        return None;
    }
    if !rest.starts_with("//") && !scheme.eq_ignore_ascii_case("mailto") && !scheme.eq_ignore_ascii_case("tel") {
        return None;
    }
    Some(scheme.to_ascii_lowercase())
}
