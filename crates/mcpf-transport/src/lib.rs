// SPDX-License-Identifier: MIT OR Apache-2.0
//! mcpf-transport
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! A uniform request/notification/stream interface over the four wire
//! shapes an MCP server can expose: plain HTTP POST, Server-Sent Events,
//! a child process speaking NDJSON over stdio, and streamable HTTP.

mod error;
pub mod http;
mod outstanding;
pub mod sse;
mod sse_support;
pub mod stdio;
pub mod streamable;
mod transport;

pub use error::TransportError;
pub use http::HttpTransport;
pub use outstanding::{OutstandingMap, DEFAULT_CAPACITY};
pub use sse::SseTransport;
pub use stdio::StdioTransport;
pub use streamable::StreamableHttpTransport;
pub use transport::Transport;
