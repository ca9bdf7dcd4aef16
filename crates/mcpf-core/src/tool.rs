// SPDX-License-Identifier: MIT OR Apache-2.0
//! The tool catalog discovered from an MCP server.

use crate::schema::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single tool advertised by an MCP server via `tools/list`.
///
/// Immutable after discovery; its lifetime equals the fuzzing session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// The tool's name, as used in `tools/call`.
    pub name: String,
    /// JSON-Schema describing the tool's accepted arguments.
    pub input_schema: JsonSchema,
    /// Optional human-readable description, as advertised by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ToolDescriptor {
    /// Construct a tool descriptor.
    pub fn new(name: impl Into<String>, input_schema: JsonSchema) -> Self {
        Self {
            name: name.into(),
            input_schema,
            description: None,
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
