// SPDX-License-Identifier: MIT OR Apache-2.0
//! mcpf-invariant
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Structural and schema-conformance checks run against every JSON-RPC
//! response a transport returns: the `result`/`error` exclusivity rule,
//! error object shape, id correlation, and (when a schema is known)
//! `result` conformance — individually and for whole batch responses.

mod checker;
mod error;
mod schema_validate;

pub use checker::InvariantChecker;
pub use error::InvariantError;
pub use schema_validate::CompiledSchema;
