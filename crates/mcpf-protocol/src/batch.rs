// SPDX-License-Identifier: MIT OR Apache-2.0
//! Collate a batch response array back to a per-request map, keyed by the
//! JSON-RPC id the request was sent under.

use crate::error::ProtocolError;
use mcpf_core::{BatchResponse, JsonRpcRequest, JsonRpcResponse, RequestId};
use std::collections::BTreeMap;

/// Correlate `responses` to the `id`s of `requests` (notifications, which
/// have no id, are skipped on the request side).
///
/// Returns the first [`ProtocolError::MissingResponse`] or
/// [`ProtocolError::UnexpectedResponse`] encountered; callers that want a
/// best-effort map even when some ids are missing should use
/// [`correlate_lenient`] instead.
pub fn correlate(
    requests: &[JsonRpcRequest],
    responses: BatchResponse,
) -> Result<BTreeMap<RequestId, JsonRpcResponse>, ProtocolError> {
    let expected: BTreeMap<RequestId, ()> = requests
        .iter()
        .filter_map(|r| r.id.clone())
        .map(|id| (id, ()))
        .collect();

    let mut map = BTreeMap::new();
    for response in responses {
        if !expected.contains_key(&response.id) {
            return Err(ProtocolError::UnexpectedResponse { id: response.id });
        }
        map.insert(response.id.clone(), response);
    }

    for id in expected.keys() {
        if !map.contains_key(id) {
            return Err(ProtocolError::MissingResponse { id: id.clone() });
        }
    }

    Ok(map)
}

/// Like [`correlate`], but collects every mismatch instead of stopping at
/// the first one — used by the invariant checker's batch variant, which
/// wants to report every id discrepancy in one `Finding`.
pub fn correlate_lenient(
    requests: &[JsonRpcRequest],
    responses: &BatchResponse,
) -> Vec<ProtocolError> {
    let expected: Vec<RequestId> = requests.iter().filter_map(|r| r.id.clone()).collect();
    let got: Vec<RequestId> = responses.iter().map(|r| r.id.clone()).collect();

    let mut problems = Vec::new();
    for id in &expected {
        if !got.contains(id) {
            problems.push(ProtocolError::MissingResponse { id: id.clone() });
        }
    }
    for id in &got {
        if !expected.contains(id) {
            problems.push(ProtocolError::UnexpectedResponse { id: id.clone() });
        }
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpf_core::JsonRpcVersion;
    use serde_json::json;

    fn req(id: i64, method: &str) -> JsonRpcRequest {
        JsonRpcRequest::call(RequestId::Number(id), method, None)
    }

    fn resp(id: i64) -> JsonRpcResponse {
        JsonRpcResponse {
            jsonrpc: JsonRpcVersion,
            id: RequestId::Number(id),
            result: Some(json!({"ok": true})),
            error: None,
        }
    }

    #[test]
    fn correlates_matching_ids() {
        let requests = vec![req(1, "tools/call"), req(2, "tools/call")];
        let responses = vec![resp(2), resp(1)];
        let map = correlate(&requests, responses).expect("correlate");
        assert_eq!(map.len(), 2);
        assert!(map.contains_key(&RequestId::Number(1)));
        assert!(map.contains_key(&RequestId::Number(2)));
    }

    #[test]
    fn missing_response_is_reported() {
        let requests = vec![req(1, "tools/call"), req(2, "tools/call")];
        let responses = vec![resp(1)];
        let err = correlate(&requests, responses).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingResponse { id } if id == RequestId::Number(2)));
    }

    #[test]
    fn unexpected_response_is_reported() {
        let requests = vec![req(1, "tools/call")];
        let responses = vec![resp(1), resp(99)];
        let err = correlate(&requests, responses).unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedResponse { id } if id == RequestId::Number(99)));
    }

    #[test]
    fn notifications_are_excluded_from_expected_ids() {
        let requests = vec![JsonRpcRequest::notification("progress/cancel", None), req(1, "tools/call")];
        let responses = vec![resp(1)];
        let map = correlate(&requests, responses).expect("correlate");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn lenient_variant_collects_every_mismatch() {
        let requests = vec![req(1, "a"), req(2, "b"), req(3, "c")];
        let responses = vec![resp(1), resp(99)];
        let problems = correlate_lenient(&requests, &responses);
        assert_eq!(problems.len(), 3);
    }
}
