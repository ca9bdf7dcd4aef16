// SPDX-License-Identifier: MIT OR Apache-2.0
//! Newline-delimited JSON framing for the stdio transport.

use crate::error::ProtocolError;
use mcpf_core::{JsonRpcRequest, JsonRpcResponse};
use serde::{de::DeserializeOwned, Serialize};

/// Encode one envelope as a single NDJSON line (including the trailing `\n`).
pub fn encode_line<T: Serialize>(value: &T) -> Result<String, ProtocolError> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    Ok(line)
}

/// Decode one NDJSON line into an envelope. Blank lines are rejected by the
/// caller before reaching here — see [`decode_stream`].
pub fn decode_line<T: DeserializeOwned>(line: &str) -> Result<T, ProtocolError> {
    Ok(serde_json::from_str(line)?)
}

/// Decode a full NDJSON buffer into a sequence of envelopes, skipping blank
/// lines. Returns one `Result` per non-blank line, preserving position so a
/// caller can report which line failed.
pub fn decode_all<T: DeserializeOwned>(input: &str) -> Vec<Result<T, ProtocolError>> {
    input
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(decode_line)
        .collect()
}

/// Encode a batch of requests as one NDJSON blob (one request per line).
pub fn encode_requests(requests: &[JsonRpcRequest]) -> Result<String, ProtocolError> {
    let mut out = String::new();
    for req in requests {
        out.push_str(&encode_line(req)?);
    }
    Ok(out)
}

/// Decode a batch of responses from an NDJSON blob, failing on the first
/// malformed line.
pub fn decode_responses(input: &str) -> Result<Vec<JsonRpcResponse>, ProtocolError> {
    decode_all(input).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpf_core::RequestId;

    #[test]
    fn round_trips_a_single_request() {
        let req = JsonRpcRequest::call(RequestId::Number(1), "tools/list", None);
        let line = encode_line(&req).expect("encode");
        assert!(line.ends_with('\n'));
        let decoded: JsonRpcRequest = decode_line(line.trim_end()).expect("decode");
        assert_eq!(decoded.method, "tools/list");
    }

    #[test]
    fn decode_all_skips_blank_lines() {
        let input = "{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":null}\n\n{\"jsonrpc\":\"2.0\",\"id\":2,\"result\":null}\n";
        let results = decode_all::<JsonRpcResponse>(input);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_ok()));
    }

    #[test]
    fn decode_all_reports_the_failing_line_position() {
        let input = "{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":null}\nnot json\n";
        let results = decode_all::<JsonRpcResponse>(input);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn encode_requests_joins_with_newlines() {
        let reqs = vec![
            JsonRpcRequest::call(RequestId::Number(1), "initialize", None),
            JsonRpcRequest::call(RequestId::Number(2), "tools/list", None),
        ];
        let blob = encode_requests(&reqs).expect("encode");
        assert_eq!(blob.lines().count(), 2);
    }
}
