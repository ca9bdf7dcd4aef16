// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared process lifecycle vocabulary.
//!
//! The live, atomically-updated process handle lives in `mcpf-process`; this
//! module only carries the status vocabulary shared with reporting.

use serde::{Deserialize, Serialize};

/// The lifecycle state of a spawned child process.
///
/// Transitions `Running -> (Exited | Killed | Failed)` exactly once; a
/// reaper task performs the transition, the watchdog only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProcessStatus {
    /// Spawned and still alive.
    Running,
    /// Exited on its own with the given status code.
    Exited {
        /// Exit code, if the platform reported one.
        code: Option<i32>,
    },
    /// Terminated by the Process Manager (TERM escalated to KILL, or direct KILL).
    Killed,
    /// Failed to spawn or could not be waited on.
    Failed,
}

impl ProcessStatus {
    /// True if this status represents a still-live process.
    pub fn is_running(&self) -> bool {
        matches!(self, ProcessStatus::Running)
    }

    /// True if this status is terminal (the process will not transition again).
    pub fn is_terminal(&self) -> bool {
        !self.is_running()
    }
}
