// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz batch-response correlation against arbitrary request/response id
//! lists, checking `correlate_lenient` never panics and reports a problem
//! for every id mismatch it is given.
#![no_main]
use libfuzzer_sys::fuzz_target;
use serde::Deserialize;

use mcpf_core::{JsonRpcRequest, JsonRpcResponse, RequestId};
use mcpf_protocol::batch::correlate_lenient;

#[derive(Deserialize)]
struct Input {
    request_ids: Vec<RequestId>,
    response_ids: Vec<RequestId>,
}

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(input) = serde_json::from_str::<Input>(s) else {
        return;
    };

    let requests: Vec<JsonRpcRequest> = input
        .request_ids
        .into_iter()
        .map(|id| JsonRpcRequest::call(id, "tools/call", None))
        .collect();
    let responses: Vec<JsonRpcResponse> = input
        .response_ids
        .into_iter()
        .map(|id| JsonRpcResponse::success(id, serde_json::Value::Null))
        .collect();

    let problems = correlate_lenient(&requests, &responses);

    let expected: std::collections::HashSet<_> = requests.iter().filter_map(|r| r.id.clone()).collect();
    let got: std::collections::HashSet<_> = responses.iter().map(|r| r.id.clone()).collect();
    if expected == got {
        assert!(problems.is_empty(), "matching id sets must report no problems");
    }
});
