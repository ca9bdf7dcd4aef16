// SPDX-License-Identifier: MIT OR Apache-2.0
//! mcpf-protocol
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! NDJSON framing for the stdio transport, batch response correlation, and
//! the baked-in MCP protocol method catalog fuzzed at the protocol level.

pub mod batch;
pub mod codec;
mod error;
pub mod method_catalog;

pub use error::ProtocolError;
pub use method_catalog::{catalog, ProtocolMethod};
