// SPDX-License-Identifier: MIT OR Apache-2.0
//! mcpf-session
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! The session driver: the collaborator that owns one fuzzing run's full
//! lifecycle. Builds a transport and safety filter from a resolved
//! `FuzzConfig`, discovers tools if the mode calls for it, pulls generated
//! cases from a strategy manager, dispatches them through an executor,
//! checks every response against the invariant checker, and tears
//! everything down in order. Producing a human-facing report from the
//! resulting records is out of scope here; this crate only returns them.

mod build;
mod driver;
mod error;

pub use driver::{SessionDriver, SessionOutcome};
pub use error::SessionError;
