// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz the safety filter's dispatch check against arbitrary method names
//! and call arguments.
//!
//! Expects input shaped `{"method": "...", "args": {...}}`; anything else is
//! skipped. Exercises the danger-pattern scan and the network deny list
//! together, since both run unconditionally inside `SafetyFilter::check`.
#![no_main]
use libfuzzer_sys::fuzz_target;

use mcpf_safety::{MethodDenyList, NetworkPolicy, SafetyFilter};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(val) = serde_json::from_str::<serde_json::Value>(s) else {
        return;
    };

    let Some(method) = val.get("method").and_then(|m| m.as_str()) else {
        return;
    };
    let args = val.get("args").cloned().unwrap_or(serde_json::Value::Null);

    let deny_list = MethodDenyList::new(["fs/delete", "process/exec"]);
    let policy = NetworkPolicy {
        deny: vec!["blocked.example.com".to_string()],
        ..NetworkPolicy::default()
    };
    let filter = SafetyFilter::new(deny_list, policy);

    let _ = filter.check(method, &args);
});
