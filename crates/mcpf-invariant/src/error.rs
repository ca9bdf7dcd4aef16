// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised while compiling a declared result schema.

use thiserror::Error;

/// Failure modes of [`crate::CompiledSchema::compile`].
#[derive(Debug, Error)]
pub enum InvariantError {
    /// The schema could not be re-serialized to a JSON document.
    #[error("failed to serialize schema: {0}")]
    Serialize(#[from] serde_json::Error),

    /// `jsonschema` rejected the compiled document as not a valid schema.
    #[error("invalid result schema: {0}")]
    CompileSchema(String),
}
