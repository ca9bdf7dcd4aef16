// SPDX-License-Identifier: MIT OR Apache-2.0
//! Protocol-layer errors: malformed wire bytes, and batch correlation failures.

use mcpf_core::RequestId;
use thiserror::Error;

/// Errors raised by the codec and batch correlator.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A line of NDJSON input didn't parse as JSON, or a value didn't
    /// deserialize into the expected envelope shape.
    #[error("malformed JSON-RPC envelope: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O error while reading or writing the stdio byte stream.
    #[error("protocol I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A request in a sent batch has no matching response in the reply.
    #[error("no response for request id {id} in batch reply")]
    MissingResponse {
        /// The unmatched request id.
        id: RequestId,
    },

    /// A response's id doesn't correspond to any request in the sent batch.
    #[error("response id {id} does not match any request in the sent batch")]
    UnexpectedResponse {
        /// The unrecognized response id.
        id: RequestId,
    },
}
