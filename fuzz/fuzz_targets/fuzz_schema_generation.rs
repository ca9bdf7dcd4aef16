// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz realistic and aggressive case generation against arbitrary JSON
//! Schemas.
//!
//! Decodes the input bytes as a `JsonSchema` and drives both generators
//! against it, checking that `realistic()` output always validates against
//! the schema it was generated from (aggressive output is allowed, even
//! expected, to fail validation).
#![no_main]
use libfuzzer_sys::fuzz_target;

use mcpf_core::JsonSchema;
use mcpf_invariant::CompiledSchema;
use mcpf_schema::{aggressive, realistic, CaseRng};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(schema) = serde_json::from_str::<JsonSchema>(s) else {
        return;
    };

    let seed = data.iter().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(*b as u64));
    let mut rng = CaseRng::from_seed(seed);

    if let Ok(value) = realistic(&schema, &mut rng) {
        if let Ok(compiled) = CompiledSchema::compile(&schema) {
            assert!(
                compiled.is_valid(&value),
                "realistic() produced a schema violation: {value:?}"
            );
        }
    }

    let _ = aggressive(&schema, &mut rng);
});
