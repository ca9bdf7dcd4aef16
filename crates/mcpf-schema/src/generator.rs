// SPDX-License-Identifier: MIT OR Apache-2.0
//! Two-phase, per-target test case generator.

use crate::aggressive::aggressive;
use crate::error::SchemaGenError;
use crate::rng::CaseRng;
use mcpf_core::{FuzzTarget, JsonSchema, Phase, TestCase};

/// Produces `runs` realistic cases followed by `runs` aggressive cases for
/// one fuzz target, deterministically from `base_seed`.
///
/// The sequence is restartable: constructing another `CaseGenerator` with the
/// same `target`, `schema`, `runs` and `base_seed` reproduces the same cases
/// in the same order, and each individual case can be regenerated on its own
/// given just its `TestCase::seed`.
pub struct CaseGenerator {
    target: FuzzTarget,
    schema: JsonSchema,
    runs: usize,
    base_seed: u64,
    emitted: usize,
}

impl CaseGenerator {
    /// Build a generator for `target`, drawing `runs` cases per phase.
    pub fn new(target: FuzzTarget, schema: JsonSchema, runs: usize, base_seed: u64) -> Self {
        Self { target, schema, runs, base_seed, emitted: 0 }
    }

    /// Regenerate the value for a single already-issued `TestCase` from its
    /// own seed, without needing to replay the whole sequence.
    pub fn regenerate(case: &TestCase, schema: &JsonSchema) -> Result<serde_json::Value, SchemaGenError> {
        let mut rng = CaseRng::from_seed(case.seed);
        match case.phase {
            Phase::Realistic => crate::realistic::realistic(schema, &mut rng),
            Phase::Aggressive => aggressive(schema, &mut rng),
        }
    }

    fn seed_for(&self, index: usize) -> u64 {
        // splitmix64-style spread so adjacent indices don't produce
        // correlated low bits in the downstream RNG.
        let mut z = self.base_seed.wrapping_add((index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

impl Iterator for CaseGenerator {
    type Item = Result<TestCase, SchemaGenError>;

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.runs * 2;
        if self.emitted >= total {
            return None;
        }
        let index = self.emitted;
        self.emitted += 1;

        let phase = if index < self.runs { Phase::Realistic } else { Phase::Aggressive };
        let seed = self.seed_for(index);
        let mut rng = CaseRng::from_seed(seed);

        let result = match phase {
            Phase::Realistic => crate::realistic::realistic(&self.schema, &mut rng),
            Phase::Aggressive => aggressive(&self.schema, &mut rng),
        };

        Some(result.map(|args| TestCase {
            target: self.target.clone(),
            phase,
            args,
            seed,
            violates_schema: matches!(phase, Phase::Aggressive),
        }))
    }
}
