// SPDX-License-Identifier: MIT OR Apache-2.0
//! Terminal outcomes of dispatching a [`crate::TestCase`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transport-level failure classification. Only `Retryable` and `Timeout`
/// outcomes are eligible for the executor's retry-with-backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    /// Failed to establish the connection.
    Connect,
    /// Failed to serialize the outgoing envelope.
    Encoding,
    /// The transport was disconnected while the request was outstanding.
    Disconnected,
    /// The I/O layer itself timed out (distinct from the executor's timeout).
    Timeout,
    /// A network-policy rule (e.g. a denied redirect target) blocked the call.
    PolicyViolation,
    /// The session-wide cancel token fired while this request was in flight.
    Cancelled,
    /// A transient failure the executor should retry.
    Retryable,
}

/// A structural or semantic check that failed against an observed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Response had both or neither of `result`/`error`.
    NotExactlyOneOf,
    /// `error.code` was not an integer-typed JSON-RPC code.
    ErrorCodeType,
    /// `error.message` was not a string.
    ErrorMessageType,
    /// Response `id` didn't match the outstanding id it was issued under.
    IdMismatch,
    /// `result` did not validate against the method/tool's declared schema.
    SchemaViolation,
    /// Batch response id multi-set didn't equal the request id multi-set.
    BatchIdMismatch,
}

/// A single failed assertion, attached to a [`crate::RunRecord`].
///
/// Findings are non-fatal: the fuzzer records them and continues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Which check failed.
    pub kind: FindingKind,
    /// Where in the response the violation was observed, e.g. `"error.code"`.
    pub location: String,
    /// What was expected.
    pub expected: String,
    /// What was actually observed.
    pub actual: String,
}

impl Finding {
    /// Construct a finding.
    pub fn new(
        kind: FindingKind,
        location: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            location: location.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// The terminal result of dispatching one [`crate::TestCase`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The transport delivered a well-formed response.
    Success {
        /// The raw JSON-RPC response `result` or full response body.
        response: Value,
    },
    /// The server returned a JSON-RPC error.
    ProtocolError {
        /// The JSON-RPC error code.
        code: i64,
        /// The JSON-RPC error message.
        msg: String,
    },
    /// A transport-level failure occurred (after retries were exhausted).
    TransportError {
        /// The failure classification.
        kind: TransportErrorKind,
    },
    /// The per-operation or per-tool timeout elapsed.
    Timeout,
    /// The safety filter blocked this request before it reached the transport.
    Blocked {
        /// Why the request was blocked.
        reason: String,
    },
    /// The invariant checker found a structural or schema violation.
    InvariantViolation {
        /// Which kind of violation was the most severe observed.
        kind: FindingKind,
    },
}

impl Outcome {
    /// True if this outcome counts as a failure for exit-status purposes
    /// (an un-retried transport error or any invariant violation).
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Outcome::TransportError { .. } | Outcome::InvariantViolation { .. }
        )
    }
}
