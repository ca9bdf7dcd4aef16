// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors that can abort a session before or during its run, as opposed to
//! per-case failures, which are recorded as [`mcpf_core::Outcome`] values
//! and never surface here.

use mcpf_config::Protocol;
use mcpf_error::{Classify, ErrorCategory};
use thiserror::Error;

/// Failures that stop a [`crate::SessionDriver`] from starting or finishing
/// cleanly. Every variant is fatal to the session: there is no per-case
/// retry path for these.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Connecting (or discovering tools over) the transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] mcpf_transport::TransportError),

    /// Installing the stdio command-blocker shim directory failed.
    #[error("safety shim installation failed: {0}")]
    Safety(#[from] mcpf_safety::SafetyError),

    /// `config.protocol` and `config.endpoint` describe incompatible
    /// transports. `mcpf_config::validate_config` is expected to catch this
    /// before a session is ever built; this variant only guards against a
    /// caller skipping that step.
    #[error("{protocol:?} protocol does not match its configured endpoint")]
    EndpointMismatch {
        /// The configured protocol.
        protocol: Protocol,
    },
}

impl Classify for SessionError {
    fn category(&self) -> ErrorCategory {
        match self {
            SessionError::Transport(_) => ErrorCategory::Transport,
            SessionError::Safety(_) => ErrorCategory::Safety,
            SessionError::EndpointMismatch { .. } => ErrorCategory::Config,
        }
    }
}
