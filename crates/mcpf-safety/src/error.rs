// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors from constructing or applying a safety policy.

use std::path::PathBuf;
use thiserror::Error;

/// Failure constructing or applying a policy component.
#[derive(Debug, Error)]
pub enum SafetyError {
    /// A glob pattern in a policy list failed to compile.
    #[error("invalid pattern in {field}: {source}")]
    InvalidPattern {
        /// Which policy field the pattern came from.
        field: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// A path escaped the configured sandbox root.
    #[error("path '{path}' escapes sandbox root '{root}'")]
    Escape {
        /// The offending (canonicalized) path.
        path: PathBuf,
        /// The configured root it was checked against.
        root: PathBuf,
    },

    /// Canonicalizing a path failed (e.g. it doesn't exist).
    #[error("failed to canonicalize '{path}': {source}")]
    Canonicalize {
        /// The path that failed to canonicalize.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Setting up the command-blocker shim directory failed.
    #[error("failed to install command-blocker shim for '{command}': {source}")]
    ShimInstall {
        /// The dangerous command the shim stands in for.
        command: String,
        #[source]
        source: std::io::Error,
    },
}
