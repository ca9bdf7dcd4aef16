// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transport-level errors and their classification for the executor's
//! retry policy.

use mcpf_core::{RequestId, TransportErrorKind};
use thiserror::Error;

/// A failure raised by a [`crate::Transport`] implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to establish the connection.
    #[error("failed to connect: {0}")]
    Connect(String),

    /// Failed to serialize the outgoing envelope. Never retried.
    #[error("failed to encode request: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The transport was disconnected while the request was outstanding.
    #[error("disconnected while request {id} was outstanding")]
    Disconnected {
        /// The id whose reply was lost.
        id: RequestId,
    },

    /// The transport's own I/O timed out (distinct from the executor's
    /// per-operation timeout).
    #[error("transport I/O timed out")]
    Timeout,

    /// A network-policy rule blocked the destination or a redirect target.
    #[error("network policy denied destination '{host}'")]
    PolicyViolation {
        /// The host the policy rejected.
        host: String,
    },

    /// The session-wide cancel token fired while this request was in flight.
    #[error("cancelled")]
    Cancelled,

    /// A transient failure the executor should retry.
    #[error("transient transport failure: {0}")]
    Retryable(String),

    /// The underlying HTTP client reported a failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A protocol-level framing error (NDJSON decode, batch correlation).
    #[error("protocol error: {0}")]
    Protocol(#[from] mcpf_protocol::ProtocolError),

    /// The stdio transport's child process failed.
    #[error("process error: {0}")]
    Process(#[from] mcpf_process::ProcessError),

    /// An I/O failure not covered by a more specific variant.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The server responded with an HTTP status outside 2xx.
    #[error("unexpected HTTP status {status}")]
    UnexpectedStatus {
        /// The status code returned.
        status: u16,
    },
}

impl TransportError {
    /// Classify this error for the executor's retry-with-backoff policy.
    pub fn kind(&self) -> TransportErrorKind {
        match self {
            TransportError::Connect(_) => TransportErrorKind::Connect,
            TransportError::Encoding(_) => TransportErrorKind::Encoding,
            TransportError::Disconnected { .. } => TransportErrorKind::Disconnected,
            TransportError::Timeout => TransportErrorKind::Timeout,
            TransportError::PolicyViolation { .. } => TransportErrorKind::PolicyViolation,
            TransportError::Cancelled => TransportErrorKind::Cancelled,
            TransportError::Retryable(_) => TransportErrorKind::Retryable,
            TransportError::Http(_) | TransportError::UnexpectedStatus { .. } => {
                TransportErrorKind::Retryable
            }
            TransportError::Protocol(_) => TransportErrorKind::Encoding,
            TransportError::Process(_) => TransportErrorKind::Connect,
            TransportError::Io(_) => TransportErrorKind::Retryable,
        }
    }
}
