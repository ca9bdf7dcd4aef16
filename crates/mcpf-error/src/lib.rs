// SPDX-License-Identifier: MIT OR Apache-2.0
//! mcpf-error
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Every owning crate (`mcpf-transport`, `mcpf-process`, `mcpf-safety`, ...)
//! defines its own `thiserror` error enum local to its concerns. This crate
//! holds only the cross-cutting classification those enums map onto at the
//! session-summary/reporting boundary — it is not a replacement for local
//! error handling.

use serde::{Deserialize, Serialize};

/// The error-kind taxonomy of the session driver, per the error handling
/// design: which kinds are fatal at startup, which are recorded and
/// retried, and which abort the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed or mutually inconsistent configuration. Fatal at startup.
    Config,
    /// Transport-level failure. Recorded per case, retried if eligible.
    Transport,
    /// Server-returned JSON-RPC error. Recorded, never retried.
    Protocol,
    /// Structural or schema invariant failed. Recorded, session continues.
    Invariant,
    /// Safety filter decision. Recorded, session continues.
    Safety,
    /// Process spawn/wait failure.
    Process,
    /// An invariant in our own code was violated. Session aborts.
    Internal,
}

impl ErrorCategory {
    /// True if an error of this category must abort the whole session,
    /// rather than merely being recorded on the offending `RunRecord`.
    pub fn is_fatal(self) -> bool {
        matches!(self, ErrorCategory::Config | ErrorCategory::Internal)
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCategory::Config => "config",
            ErrorCategory::Transport => "transport",
            ErrorCategory::Protocol => "protocol",
            ErrorCategory::Invariant => "invariant",
            ErrorCategory::Safety => "safety",
            ErrorCategory::Process => "process",
            ErrorCategory::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Implemented by each crate's local error enum so the reporting boundary
/// can classify any error without depending on every crate's concrete type.
pub trait Classify {
    /// This error's category.
    fn category(&self) -> ErrorCategory;
}
