// SPDX-License-Identifier: MIT OR Apache-2.0
//! A shared table of in-flight requests awaiting a correlated reply,
//! used by every transport whose replies arrive out of band (SSE,
//! streamable-HTTP, stdio).

use crate::error::TransportError;
use mcpf_core::{JsonRpcResponse, RequestId};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

/// Default cap on the number of simultaneously outstanding requests a
/// transport will track, per the core's concurrency model.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Maps a [`RequestId`] to the oneshot sender a waiting `send_request` call
/// is blocked on. One short critical section per operation, per the core's
/// stated locking model.
pub struct OutstandingMap {
    capacity: usize,
    inner: Mutex<BTreeMap<RequestId, oneshot::Sender<JsonRpcResponse>>>,
}

impl OutstandingMap {
    /// Build an empty map bounded at `capacity` concurrently-outstanding ids.
    pub fn new(capacity: usize) -> Self {
        Self { capacity, inner: Mutex::new(BTreeMap::new()) }
    }

    /// Register `id` as outstanding and return the receiver half the caller
    /// awaits. Errs if the table is already at capacity.
    pub fn register(&self, id: RequestId) -> Result<oneshot::Receiver<JsonRpcResponse>, TransportError> {
        let mut guard = self.inner.lock().expect("outstanding map poisoned");
        if guard.len() >= self.capacity {
            return Err(TransportError::Retryable(format!(
                "outstanding-request table full ({} entries)",
                self.capacity
            )));
        }
        let (tx, rx) = oneshot::channel();
        guard.insert(id, tx);
        Ok(rx)
    }

    /// Deliver `response` to whichever call registered its `id`, if still
    /// outstanding. Unsolicited or late replies are dropped with a debug log,
    /// per the transport's documented common behavior.
    pub fn complete(&self, response: JsonRpcResponse) {
        let sender = self.inner.lock().expect("outstanding map poisoned").remove(&response.id);
        match sender {
            Some(tx) => {
                let _ = tx.send(response);
            }
            None => {
                debug!(target: "mcpf.transport.outstanding", id = %response.id, "dropping unmatched or late response");
            }
        }
    }

    /// Remove `id` without delivering anything (timeout or cancellation).
    pub fn remove(&self, id: &RequestId) {
        self.inner.lock().expect("outstanding map poisoned").remove(id);
    }

    /// Drain every outstanding entry, dropping each sender so its waiter
    /// observes a closed channel. Called on `disconnect`.
    pub fn drain(&self) {
        self.inner.lock().expect("outstanding map poisoned").clear();
    }

    /// Number of currently outstanding requests.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("outstanding map poisoned").len()
    }

    /// True if no requests are outstanding.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for OutstandingMap {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
