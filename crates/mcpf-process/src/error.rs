// SPDX-License-Identifier: MIT OR Apache-2.0
//! Process manager errors.

use thiserror::Error;

/// Failure modes of spawning or controlling a managed child process.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The OS refused to spawn the process.
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        /// The command that failed to spawn.
        command: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// Writing to the child's stdin failed.
    #[error("failed to write to child stdin: {0}")]
    Stdin(#[source] std::io::Error),

    /// Reading from the child's stdout failed.
    #[error("failed to read from child stdout: {0}")]
    Stdout(#[source] std::io::Error),

    /// An operation was attempted against a handle whose process already exited.
    #[error("process {pid} is no longer running")]
    NotRunning {
        /// The process id the caller tried to act on.
        pid: u32,
    },

    /// `stop` did not observe exit within the grace period even after escalating to KILL.
    #[error("process {pid} did not exit after TERM+KILL within {grace_ms}ms")]
    StopTimedOut {
        /// The process id.
        pid: u32,
        /// The grace period that elapsed, in milliseconds.
        grace_ms: u64,
    },

    /// Waiting on the child failed at the OS level.
    #[error("failed to wait on child: {0}")]
    Wait(#[source] std::io::Error),
}
