// SPDX-License-Identifier: MIT OR Apache-2.0
//! mcpf-process
#![warn(missing_docs)]
//!
//! Subprocess lifecycle management for the stdio transport: spawning an MCP
//! server in its own process group, writing/reading its stdio pipes, and a
//! watchdog that reaps natural exits and kills processes that overrun their
//! lifetime cap or go idle too long.
//!
//! Signalling a whole process group on POSIX has no safe std API, so unlike
//! the rest of this workspace this crate does not `deny(unsafe_code)`: the
//! one `unsafe` block in [`manager`] wraps a single `libc::kill` call.

mod config;
mod error;
mod handle;
mod manager;
mod watchdog;

pub use config::ProcessConfig;
pub use error::ProcessError;
pub use handle::ProcessHandle;
pub use manager::{ProcessManager, ProcessStats, SignalKind};
pub use watchdog::Watchdog;
