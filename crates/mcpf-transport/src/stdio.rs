// SPDX-License-Identifier: MIT OR Apache-2.0
//! Child-process transport: newline-delimited JSON over the child's stdin
//! and stdout, with stderr captured for diagnostics only.

use crate::error::TransportError;
use crate::outstanding::OutstandingMap;
use crate::transport::Transport;
use async_trait::async_trait;
use mcpf_core::{JsonRpcRequest, JsonRpcResponse, JsonValue, RequestId};
use mcpf_process::{ProcessConfig, ProcessHandle, ProcessManager};
use mcpf_protocol::codec;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

/// Grace period given to the child on [`StdioTransport::disconnect`] before
/// the process manager escalates to a forced kill.
const STOP_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Spawns an MCP server as a child process and exchanges NDJSON-framed
/// JSON-RPC envelopes over its stdio pipes.
pub struct StdioTransport {
    manager: ProcessManager,
    config: ProcessConfig,
    next_id: Arc<AtomicI64>,
    outstanding: Arc<OutstandingMap>,
    state: Mutex<Option<ConnectedState>>,
}

struct ConnectedState {
    handle: ProcessHandle,
    reader: JoinHandle<()>,
}

impl StdioTransport {
    /// Build a transport that will spawn `config` on [`connect`](Self::connect).
    pub fn new(config: ProcessConfig) -> Self {
        Self {
            manager: ProcessManager::new(),
            config,
            next_id: Arc::new(AtomicI64::new(1)),
            outstanding: Arc::new(OutstandingMap::default()),
            state: Mutex::new(None),
        }
    }

    fn connected_handle(&self) -> Result<ProcessHandle, TransportError> {
        match self.state.try_lock() {
            Ok(guard) => guard
                .as_ref()
                .map(|s| s.handle.clone())
                .ok_or_else(|| TransportError::Connect("not connected".to_string())),
            Err(_) => Err(TransportError::Retryable("transport state busy".to_string())),
        }
    }
}

fn next_request_id(counter: &AtomicI64) -> RequestId {
    RequestId::Number(counter.fetch_add(1, Ordering::SeqCst))
}

/// Write `request` to the child's stdin as one NDJSON line.
async fn write_request(handle: &ProcessHandle, request: &JsonRpcRequest) -> Result<(), TransportError> {
    let line = codec::encode_line(request)?;
    handle.write_line(line.trim_end()).await.map_err(TransportError::Io)
}

/// Send a pre-serialized envelope and, if it carries an `id`, await the
/// correlated reply. Shared by `send_raw` and `stream_request`, the latter
/// of which needs an owned, non-borrowed version to run inside a spawned
/// task.
async fn write_and_await_raw(
    handle: &ProcessHandle,
    outstanding: &OutstandingMap,
    payload: JsonValue,
) -> Result<JsonValue, TransportError> {
    let id = payload.get("id").cloned().and_then(|v| serde_json::from_value::<RequestId>(v).ok());
    let line = codec::encode_line(&payload)?;
    let rx = id.clone().map(|id| outstanding.register(id)).transpose()?;
    handle.write_line(line.trim_end()).await.map_err(TransportError::Io)?;

    match rx {
        Some(rx) => {
            let response = rx
                .await
                .map_err(|_| TransportError::Disconnected { id: id.unwrap_or(RequestId::Number(0)) })?;
            Ok(serde_json::to_value(response)?)
        }
        None => Ok(JsonValue::Null),
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let mut guard = self.state.lock().await;
        if guard.is_some() {
            return Ok(());
        }

        let handle = self
            .manager
            .start(self.config.clone())
            .await
            .map_err(|source| TransportError::Connect(source.to_string()))?;

        let reader_handle = handle.clone();
        let outstanding = Arc::clone(&self.outstanding);
        let reader = tokio::spawn(async move {
            loop {
                match reader_handle.read_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match codec::decode_line::<JsonRpcResponse>(&line) {
                            Ok(response) => outstanding.complete(response),
                            Err(err) => warn!(target: "mcpf.transport.stdio", %err, "malformed line from child stdout"),
                        }
                    }
                    Ok(None) => {
                        debug!(target: "mcpf.transport.stdio", "child stdout closed");
                        outstanding.drain();
                        return;
                    }
                    Err(err) => {
                        warn!(target: "mcpf.transport.stdio", %err, "error reading child stdout");
                        outstanding.drain();
                        return;
                    }
                }
            }
        });

        *guard = Some(ConnectedState { handle, reader });
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let state = self.state.lock().await.take();
        self.outstanding.drain();
        if let Some(state) = state {
            state.reader.abort();
            self.manager
                .stop(&state.handle, STOP_GRACE_PERIOD)
                .await
                .map_err(TransportError::Process)?;
        }
        Ok(())
    }

    async fn shutdown_processes(&self) {
        self.manager.shutdown(STOP_GRACE_PERIOD).await;
    }

    async fn send_request(&self, method: &str, params: Option<JsonValue>) -> Result<JsonRpcResponse, TransportError> {
        let guard = self.state.lock().await;
        let state = guard.as_ref().ok_or_else(|| TransportError::Connect("not connected".to_string()))?;

        let id = next_request_id(&self.next_id);
        let request = JsonRpcRequest::call(id.clone(), method, params);
        let rx = self.outstanding.register(id.clone())?;
        write_request(&state.handle, &request).await?;
        drop(guard);

        rx.await.map_err(|_| TransportError::Disconnected { id })
    }

    async fn send_notification(&self, method: &str, params: Option<JsonValue>) -> Result<(), TransportError> {
        let guard = self.state.lock().await;
        let state = guard.as_ref().ok_or_else(|| TransportError::Connect("not connected".to_string()))?;
        let request = JsonRpcRequest::notification(method, params);
        write_request(&state.handle, &request).await
    }

    async fn send_raw(&self, payload: JsonValue) -> Result<JsonValue, TransportError> {
        let guard = self.state.lock().await;
        let state = guard.as_ref().ok_or_else(|| TransportError::Connect("not connected".to_string()))?;
        write_and_await_raw(&state.handle, &self.outstanding, payload).await
    }

    fn stream_request(
        &self,
        payload: JsonValue,
    ) -> std::pin::Pin<Box<dyn tokio_stream::Stream<Item = JsonValue> + Send + '_>> {
        let (tx, rx) = tokio::sync::mpsc::channel(32);
        match self.connected_handle() {
            Ok(handle) => {
                let outstanding = Arc::clone(&self.outstanding);
                tokio::spawn(async move {
                    match write_and_await_raw(&handle, &outstanding, payload).await {
                        Ok(value) => {
                            let _ = tx.send(value).await;
                        }
                        Err(err) => {
                            debug!(target: "mcpf.transport.stdio", %err, "stream_request failed");
                        }
                    }
                });
            }
            Err(err) => {
                debug!(target: "mcpf.transport.stdio", %err, "stream_request attempted while disconnected");
            }
        }
        Box::pin(ReceiverStream::new(rx))
    }

    async fn send_batch(&self, requests: Vec<JsonRpcRequest>) -> Result<Vec<JsonRpcResponse>, TransportError> {
        let guard = self.state.lock().await;
        let state = guard.as_ref().ok_or_else(|| TransportError::Connect("not connected".to_string()))?;

        let mut receivers = Vec::with_capacity(requests.len());
        for request in &requests {
            if let Some(id) = request.id.clone() {
                receivers.push(Some(self.outstanding.register(id)?));
            } else {
                receivers.push(None);
            }
        }

        let blob = codec::encode_requests(&requests)?;
        state.handle.write_line(blob.trim_end()).await.map_err(TransportError::Io)?;
        drop(guard);

        let mut responses = Vec::with_capacity(receivers.len());
        for (request, rx) in requests.iter().zip(receivers) {
            if let Some(rx) = rx {
                let id = request.id.clone().expect("notification has no receiver");
                responses.push(rx.await.map_err(|_| TransportError::Disconnected { id })?);
            }
        }
        Ok(responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_config() -> ProcessConfig {
        ProcessConfig::new("sh").with_args([
            "-c",
            "while IFS= read -r line; do id=$(printf '%s' \"$line\" | sed -n 's/.*\"id\":\\([0-9]*\\).*/\\1/p'); printf '{\"jsonrpc\":\"2.0\",\"id\":%s,\"result\":{}}\\n' \"$id\"; done",
        ])
    }

    #[tokio::test]
    async fn round_trips_a_request_through_a_shell_echo_server() {
        let transport = StdioTransport::new(echo_config());
        transport.connect().await.expect("connect");
        let response = transport.send_request("tools/list", None).await.expect("send_request");
        assert_eq!(response.id, RequestId::Number(1));
        transport.disconnect().await.expect("disconnect");
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let transport = StdioTransport::new(ProcessConfig::new("true"));
        transport.connect().await.expect("connect");
        transport.disconnect().await.expect("first disconnect");
        transport.disconnect().await.expect("second disconnect is a no-op");
    }
}
