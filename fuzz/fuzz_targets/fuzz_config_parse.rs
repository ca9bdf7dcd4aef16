// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz FuzzConfig TOML parsing and validation.
//!
//! Feeds arbitrary byte strings through `parse_toml` and `validate_config`,
//! verifying:
//! 1. `parse_toml` never panics on arbitrary input.
//! 2. Successfully parsed configs can be validated without panics.
//! 3. Round-trip: serialize back to TOML and re-parse produces the same config.
//! 4. `validate_config` warnings and errors are well-formed (Display never panics).
#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(s) => s,
        Err(_) => return,
    };

    let config = match mcpf_config::parse_toml(s) {
        Ok(c) => c,
        Err(e) => {
            let _ = format!("{e}");
            return;
        }
    };

    match mcpf_config::validate_config(&config) {
        Ok(warnings) => {
            for w in &warnings {
                let _ = format!("{w}");
            }
        }
        Err(e) => {
            let _ = format!("{e}");
        }
    }

    if let Ok(toml_str) = toml::to_string(&config) {
        if let Ok(rt) = mcpf_config::parse_toml(&toml_str) {
            let a = serde_json::to_string(&config).unwrap();
            let b = serde_json::to_string(&rt).unwrap();
            assert_eq!(a, b, "TOML round-trip must be lossless");
        }
    }

    if let Ok(json) = serde_json::to_string(&config) {
        let _ = serde_json::from_str::<mcpf_config::FuzzConfig>(&json);
    }
});
