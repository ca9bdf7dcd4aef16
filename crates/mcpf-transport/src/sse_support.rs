// SPDX-License-Identifier: MIT OR Apache-2.0
//! SSE event parsing and redirect-policy plumbing shared by the HTTP, SSE,
//! and streamable-HTTP transports.

use crate::error::TransportError;
use mcpf_core::{JsonValue, RequestId};
use mcpf_safety::NetworkPolicy;
use std::fmt;

/// Build the `reqwest` redirect policy shared by every HTTP-family
/// transport: each hop is checked against `network_policy` before being
/// followed.
pub(crate) fn redirect_policy(network_policy: NetworkPolicy) -> reqwest::redirect::Policy {
    reqwest::redirect::Policy::custom(move |attempt| {
        let host = attempt.url().host_str().unwrap_or_default().to_string();
        if network_policy.redirect_allowed(&host) {
            attempt.follow()
        } else {
            attempt.error(RedirectDenied(host))
        }
    })
}

/// A redirect target the active network policy rejects. Surfaced through
/// `reqwest::Error::source` so a denied redirect hop becomes a
/// [`TransportError::PolicyViolation`] rather than a generic HTTP error.
#[derive(Debug)]
pub(crate) struct RedirectDenied(pub(crate) String);

impl fmt::Display for RedirectDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "redirect to '{}' denied by network policy", self.0)
    }
}

impl std::error::Error for RedirectDenied {}

/// Map a `reqwest::Error` to a [`TransportError`], recognizing a
/// [`RedirectDenied`] cause as a policy violation rather than a bare HTTP
/// error.
pub(crate) fn classify_send_error(err: reqwest::Error) -> TransportError {
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        if let Some(denied) = cause.downcast_ref::<RedirectDenied>() {
            return TransportError::PolicyViolation { host: denied.0.clone() };
        }
        source = cause.source();
    }
    TransportError::Http(err)
}

/// Pull the `id` field out of a raw JSON-RPC envelope, if present.
pub(crate) fn extract_id(value: &JsonValue) -> Option<RequestId> {
    value.get("id").cloned().and_then(|v| serde_json::from_value(v).ok())
}

/// True if `value` carries a `result` or `error` field: a terminal reply
/// rather than a progress notification sharing the same `id`.
pub(crate) fn is_terminal(value: &JsonValue) -> bool {
    value.get("result").is_some() || value.get("error").is_some()
}

/// Parse one SSE event block (the text between two `\n\n` delimiters) into
/// its JSON payload, discarding `ping` events per the MCP keep-alive
/// convention.
pub(crate) fn parse_event_block(block: &str) -> Option<JsonValue> {
    let mut data_lines = Vec::new();
    let mut event_type = None;
    for line in block.lines() {
        if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.trim());
        } else if let Some(value) = line.strip_prefix("event:") {
            event_type = Some(value.trim().to_string());
        }
    }
    if event_type.as_deref().is_some_and(|t| t.eq_ignore_ascii_case("ping")) {
        return None;
    }
    let data = data_lines.join("\n");
    if data.is_empty() || data.eq_ignore_ascii_case("[ping]") {
        return None;
    }
    serde_json::from_str(&data).ok()
}

/// Split a growing text buffer on `\n\n` boundaries, parsing and removing
/// each complete event, and calling `on_event` for every value produced.
pub(crate) fn drain_complete_events(buffer: &mut String, mut on_event: impl FnMut(JsonValue)) {
    while let Some(pos) = buffer.find("\n\n") {
        let block = buffer[..pos].to_string();
        *buffer = buffer[pos + 2..].to_string();
        if let Some(value) = parse_event_block(&block) {
            on_event(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_complete_events_yields_each_block_and_leaves_the_partial_remainder() {
        let mut buffer = "data: {\"id\":1}\n\ndata: {\"id\":2}\n\ndata: {\"id\":3".to_string();
        let mut seen = Vec::new();
        drain_complete_events(&mut buffer, |value| seen.push(value["id"].as_i64().unwrap()));
        assert_eq!(seen, vec![1, 2]);
        assert_eq!(buffer, "data: {\"id\":3");
    }

    #[test]
    fn is_terminal_distinguishes_progress_from_a_reply() {
        assert!(!is_terminal(&serde_json::json!({"id": 1, "progress": 0.2})));
        assert!(is_terminal(&serde_json::json!({"id": 1, "result": {}})));
    }
}
