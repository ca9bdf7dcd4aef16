// SPDX-License-Identifier: MIT OR Apache-2.0
//! Chains a [`CaseGenerator`] per fuzz target — one per discovered tool,
//! one per catalog protocol method — into the single pull contract the
//! session driver consumes.

use crate::mode::{Mode, PhaseSelection};
use mcpf_core::{FuzzTarget, RunRecord, SessionSummary, ToolDescriptor};
use mcpf_schema::{CaseGenerator, SchemaGenError};
use std::collections::VecDeque;

/// Owns the two-phase protocol across every target in scope for this
/// session: `runs_per_tool` realistic cases then `runs_per_tool` aggressive
/// cases per tool, and identically for each protocol method when `mode`
/// includes `Protocol`.
pub struct StrategyManager {
    generators: VecDeque<CaseGenerator>,
    phase: PhaseSelection,
    summary: SessionSummary,
}

impl StrategyManager {
    /// Build a manager over `tools` (as discovered via `tools/list`),
    /// drawing `runs_per_tool` cases per phase per target, seeded
    /// deterministically from `base_seed`.
    pub fn new(mode: Mode, phase: PhaseSelection, tools: &[ToolDescriptor], runs_per_tool: usize, base_seed: u64) -> Self {
        let mut generators = VecDeque::new();
        let mut index = 0u64;

        if mode.includes_tools() {
            for tool in tools {
                generators.push_back(CaseGenerator::new(
                    FuzzTarget::Tool { name: tool.name.clone() },
                    tool.input_schema.clone(),
                    runs_per_tool,
                    target_seed(base_seed, index),
                ));
                index += 1;
            }
        }

        if mode.includes_protocol() {
            for method in mcpf_protocol::catalog() {
                generators.push_back(CaseGenerator::new(
                    FuzzTarget::ProtocolMethod { method: method.name.to_string() },
                    method.params_schema,
                    runs_per_tool,
                    target_seed(base_seed, index),
                ));
                index += 1;
            }
        }

        Self { generators, phase, summary: SessionSummary::default() }
    }

    /// Pull the next case in sequence, advancing past exhausted targets.
    /// `None` once every target's sequence is exhausted.
    pub fn next_case(&mut self) -> Option<Result<mcpf_core::TestCase, SchemaGenError>> {
        loop {
            let case = self.generators.front_mut()?.find(|result| match result {
                Ok(case) => self.phase.matches(case.phase),
                Err(_) => true,
            });
            match case {
                Some(case) => return Some(case),
                None => {
                    self.generators.pop_front();
                }
            }
        }
    }

    /// Fold a dispatched case's record into the running session summary.
    pub fn record(&mut self, record: &RunRecord) {
        self.summary.record(record);
    }

    /// The session summary accumulated so far (final once [`next_case`](Self::next_case) is exhausted).
    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }
}

/// Same splitmix64-style dispersal [`CaseGenerator`] uses internally for its
/// own per-case seeds, applied here so adjacent targets don't start from
/// correlated RNG state either.
fn target_seed(base: u64, index: u64) -> u64 {
    let mut z = base.wrapping_add(index.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpf_core::{JsonSchema, Outcome, Phase, PrimitiveType};
    use std::time::Duration;

    fn tools() -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new("echo", JsonSchema::of_type(PrimitiveType::String)),
            ToolDescriptor::new("add", JsonSchema::of_type(PrimitiveType::Object)),
        ]
    }

    #[test]
    fn tools_only_mode_never_yields_a_protocol_method() {
        let mut manager = StrategyManager::new(Mode::Tools, PhaseSelection::Both, &tools(), 2, 1);
        let mut saw_tool = false;
        while let Some(case) = manager.next_case() {
            let case = case.expect("no generation errors");
            match case.target {
                FuzzTarget::Tool { .. } => saw_tool = true,
                FuzzTarget::ProtocolMethod { .. } => panic!("tools-only mode yielded a protocol method"),
            }
        }
        assert!(saw_tool);
    }

    #[test]
    fn protocol_only_mode_covers_the_whole_catalog() {
        let mut manager = StrategyManager::new(Mode::Protocol, PhaseSelection::Both, &[], 1, 7);
        let mut methods = std::collections::BTreeSet::new();
        while let Some(case) = manager.next_case() {
            let case = case.expect("no generation errors");
            if let FuzzTarget::ProtocolMethod { method } = case.target {
                methods.insert(method);
            }
        }
        let expected: std::collections::BTreeSet<_> =
            mcpf_protocol::catalog().into_iter().map(|m| m.name.to_string()).collect();
        assert_eq!(methods, expected);
    }

    #[test]
    fn realistic_only_phase_selection_excludes_aggressive_cases() {
        let mut manager = StrategyManager::new(Mode::Tools, PhaseSelection::Realistic, &tools(), 3, 42);
        let mut count = 0;
        while let Some(case) = manager.next_case() {
            let case = case.expect("no generation errors");
            assert_eq!(case.phase, Phase::Realistic);
            count += 1;
        }
        assert_eq!(count, 3 * tools().len());
    }

    #[test]
    fn both_mode_reaches_exhaustion_and_record_updates_the_summary() {
        let mut manager = StrategyManager::new(Mode::Both, PhaseSelection::Both, &tools(), 1, 3);
        let mut total = 0;
        while let Some(case) = manager.next_case() {
            let case = case.expect("no generation errors");
            manager.record(&RunRecord::new(case, Outcome::Success { response: serde_json::json!({}) }, Duration::from_millis(1)));
            total += 1;
        }
        let expected = tools().len() * 2 + mcpf_protocol::catalog().len() * 2;
        assert_eq!(total, expected);
        assert_eq!(manager.summary().tool_stats["echo"].total, 2);
    }
}
