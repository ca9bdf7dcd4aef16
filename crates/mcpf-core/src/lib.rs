// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
//! mcpf-core
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Data model for the MCP fuzzer: JSON-Schema subset, JSON-RPC envelopes,
//! generated test cases, and the result records the rest of the crates
//! produce and consume.

pub mod duration;
pub mod outcome;
pub mod process;
pub mod record;
pub mod rpc;
pub mod schema;
pub mod testcase;
pub mod tool;

pub use outcome::{Finding, FindingKind, Outcome, TransportErrorKind};
pub use process::ProcessStatus;
pub use record::{RunRecord, SessionSummary, TargetStats};
pub use rpc::{
    BatchRequest, BatchResponse, JsonRpcError, JsonRpcRequest, JsonRpcResponse, JsonRpcVersion,
    RequestId,
};
pub use schema::{AdditionalProperties, JsonSchema, PrimitiveType, SchemaType};
pub use testcase::{FuzzTarget, Phase, TestCase};
pub use tool::ToolDescriptor;

/// Re-export of `serde_json::Value`, the JSON value type used throughout.
pub type JsonValue = serde_json::Value;
