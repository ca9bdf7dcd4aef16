// SPDX-License-Identifier: MIT OR Apache-2.0
//! Generated test cases and the outcomes they produce.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which generation phase produced a [`TestCase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Schema-conforming input.
    Realistic,
    /// Deliberately malformed or hostile input.
    Aggressive,
}

/// What's being fuzzed: a discovered tool, or a protocol-level MCP method.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FuzzTarget {
    /// A `tools/call` invocation of a discovered tool.
    Tool {
        /// The tool's name.
        name: String,
    },
    /// A JSON-RPC method from the baked-in MCP protocol catalog.
    ProtocolMethod {
        /// The method name, e.g. `"initialize"`.
        method: String,
    },
}

/// One generated input, ready for dispatch by the executor.
///
/// Created by the generator, consumed by the executor, discarded after
/// recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    /// What this case targets.
    pub target: FuzzTarget,
    /// Which phase produced this case.
    pub phase: Phase,
    /// The generated arguments (or protocol-method params).
    pub args: Value,
    /// RNG seed this case was generated from; reusing it reproduces `args`.
    pub seed: u64,
    /// True if the generator deliberately produced a schema-violating value
    /// (always false in realistic phase; may be true in aggressive phase).
    pub violates_schema: bool,
}

impl TestCase {
    /// The tool name this case targets, if it targets a tool.
    pub fn tool_name(&self) -> Option<&str> {
        match &self.target {
            FuzzTarget::Tool { name } => Some(name),
            FuzzTarget::ProtocolMethod { .. } => None,
        }
    }

    /// `(target, seed, phase)` triple used to reproduce this exact case.
    pub fn fingerprint(&self) -> String {
        let target = match &self.target {
            FuzzTarget::Tool { name } => format!("tool:{name}"),
            FuzzTarget::ProtocolMethod { method } => format!("method:{method}"),
        };
        format!("{target}#{:?}#{}", self.phase, self.seed)
    }
}
