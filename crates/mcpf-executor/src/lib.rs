// SPDX-License-Identifier: MIT OR Apache-2.0
//! mcpf-executor
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Bounded-concurrency dispatch of generated test cases against a
//! transport: safety-filter enforcement, per-operation timeout, and
//! retry-with-backoff around transient transport failures.

mod cancel;
mod executor;
mod retry;

pub use cancel::CancellationToken;
pub use executor::{Dispatched, Executor, ExecutorConfig};
pub use retry::RetryPolicy;
