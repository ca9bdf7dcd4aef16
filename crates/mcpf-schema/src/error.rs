// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised while generating a value for a schema.

use thiserror::Error;

/// Failure modes of the schema-directed generator.
#[derive(Debug, Error)]
pub enum SchemaGenError {
    /// An `allOf` combinator's branches impose mutually exclusive
    /// constraints (e.g. `minimum: 10` and `maximum: 5`) and no value can
    /// satisfy all of them.
    #[error("allOf at {path} has no satisfiable merge: {reason}")]
    DegenerateAllOf {
        /// Dotted path to the offending schema node.
        path: String,
        /// Human-readable description of the conflict.
        reason: String,
    },

    /// `oneOf`/`anyOf` was declared with no branches.
    #[error("{keyword} at {path} has no branches to choose from")]
    EmptyCombinator {
        /// `"oneOf"` or `"anyOf"`.
        keyword: &'static str,
        /// Dotted path to the offending schema node.
        path: String,
    },

    /// `enum`/`const` was declared with no usable members.
    #[error("enum at {path} has no members")]
    EmptyEnum {
        /// Dotted path to the offending schema node.
        path: String,
    },
}
