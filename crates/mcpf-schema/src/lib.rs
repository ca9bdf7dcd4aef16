// SPDX-License-Identifier: MIT OR Apache-2.0
//! mcpf-schema
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Schema-directed generator: realistic values that satisfy a
//! [`mcpf_core::JsonSchema`], aggressive values mutated from a realistic
//! skeleton per an attack catalog, and the per-target [`CaseGenerator`] that
//! drives both through a two-phase sequence.

mod aggressive;
mod catalog;
mod error;
mod format;
mod generator;
mod pattern;
mod realistic;
mod rng;

pub use aggressive::aggressive;
pub use error::SchemaGenError;
pub use generator::CaseGenerator;
pub use realistic::realistic;
pub use rng::CaseRng;
