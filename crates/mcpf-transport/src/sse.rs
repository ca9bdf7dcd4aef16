// SPDX-License-Identifier: MIT OR Apache-2.0
//! Server-Sent Events transport: client messages go out as HTTP POSTs,
//! replies and unsolicited server notifications arrive on a long-lived GET
//! stream and are demultiplexed by `id`.

use crate::error::TransportError;
use crate::outstanding::OutstandingMap;
use crate::sse_support::{classify_send_error, drain_complete_events, extract_id, is_terminal};
use crate::transport::Transport;
use async_trait::async_trait;
use mcpf_core::{JsonRpcRequest, JsonRpcResponse, JsonValue, RequestId};
use mcpf_safety::NetworkPolicy;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt as _;
use tracing::{debug, warn};

struct Inner {
    client: reqwest::Client,
    endpoint: url::Url,
    headers: HashMap<String, String>,
    next_id: AtomicI64,
    outstanding: Arc<OutstandingMap>,
    stream_subscribers: StdMutex<BTreeMap<RequestId, mpsc::Sender<JsonValue>>>,
    unsolicited_tx: mpsc::UnboundedSender<JsonValue>,
}

impl Inner {
    fn next_request_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn dispatch_event(&self, value: JsonValue) {
        let Some(id) = extract_id(&value) else {
            let _ = self.unsolicited_tx.send(value);
            return;
        };

        let claimed = {
            let mut subscribers = self.stream_subscribers.lock().expect("stream subscriber map poisoned");
            match subscribers.get(&id) {
                Some(tx) => {
                    let _ = tx.try_send(value.clone());
                    if is_terminal(&value) {
                        subscribers.remove(&id);
                    }
                    true
                }
                None => false,
            }
        };
        if claimed {
            return;
        }

        match serde_json::from_value::<JsonRpcResponse>(value) {
            Ok(response) => self.outstanding.complete(response),
            Err(err) => debug!(target: "mcpf.transport.sse", %err, "dropping event that is not a JSON-RPC response"),
        }
    }

    async fn post(&self, body: JsonValue) -> Result<(), TransportError> {
        let mut req = self
            .client
            .post(self.endpoint.as_str())
            .header("Content-Type", "application/json")
            .json(&body);
        for (key, value) in &self.headers {
            req = req.header(key.as_str(), value.as_str());
        }
        let response = req.send().await.map_err(classify_send_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::UnexpectedStatus { status: status.as_u16() });
        }
        Ok(())
    }
}

async fn run_reader(inner: Arc<Inner>, response: reqwest::Response) {
    let mut buffer = String::new();
    let mut byte_stream = response.bytes_stream();

    while let Some(chunk) = byte_stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => {
                warn!(target: "mcpf.transport.sse", %err, "sse byte stream error");
                break;
            }
        };
        let Ok(text) = std::str::from_utf8(&chunk) else { continue };
        buffer.push_str(text);
        drain_complete_events(&mut buffer, |value| inner.dispatch_event(value));
    }

    inner.outstanding.drain();
}

/// Speaks the SSE transport: POST for client-to-server, a long-lived GET
/// event stream for server-to-client, correlated by `id`.
pub struct SseTransport {
    inner: Arc<Inner>,
    reader: Mutex<Option<JoinHandle<()>>>,
    unsolicited_rx: Mutex<mpsc::UnboundedReceiver<JsonValue>>,
}

impl SseTransport {
    /// Build a transport whose GET stream and POST target are both
    /// `endpoint`, matching the single-endpoint shape most MCP servers
    /// expose for the SSE transport.
    pub fn new(
        endpoint: url::Url,
        headers: HashMap<String, String>,
        timeout: Duration,
        network_policy: NetworkPolicy,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(crate::sse_support::redirect_policy(network_policy))
            .build()
            .map_err(TransportError::Http)?;

        let (unsolicited_tx, unsolicited_rx) = mpsc::unbounded_channel();
        Ok(Self {
            inner: Arc::new(Inner {
                client,
                endpoint,
                headers,
                next_id: AtomicI64::new(1),
                outstanding: Arc::new(OutstandingMap::default()),
                stream_subscribers: StdMutex::new(BTreeMap::new()),
                unsolicited_tx,
            }),
            reader: Mutex::new(None),
            unsolicited_rx: Mutex::new(unsolicited_rx),
        })
    }

    /// Drain notifications the server pushed that carry no correlating id.
    pub async fn recv_unsolicited(&self) -> Option<JsonValue> {
        self.unsolicited_rx.lock().await.recv().await
    }
}

#[async_trait]
impl Transport for SseTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let mut guard = self.reader.lock().await;
        if guard.is_some() {
            return Ok(());
        }

        let mut req = self
            .inner
            .client
            .get(self.inner.endpoint.as_str())
            .header("Accept", "text/event-stream");
        for (key, value) in &self.inner.headers {
            req = req.header(key.as_str(), value.as_str());
        }
        let response = req.send().await.map_err(classify_send_error)?;
        if !response.status().is_success() {
            return Err(TransportError::UnexpectedStatus { status: response.status().as_u16() });
        }

        let inner = Arc::clone(&self.inner);
        *guard = Some(tokio::spawn(run_reader(inner, response)));
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let reader = self.reader.lock().await.take();
        self.inner.outstanding.drain();
        self.inner.stream_subscribers.lock().expect("stream subscriber map poisoned").clear();
        if let Some(reader) = reader {
            reader.abort();
        }
        Ok(())
    }

    async fn send_request(&self, method: &str, params: Option<JsonValue>) -> Result<JsonRpcResponse, TransportError> {
        let id = self.inner.next_request_id();
        let request = JsonRpcRequest::call(id.clone(), method, params);
        let rx = self.inner.outstanding.register(id.clone())?;
        self.inner.post(serde_json::to_value(&request)?).await?;
        rx.await.map_err(|_| TransportError::Disconnected { id })
    }

    async fn send_notification(&self, method: &str, params: Option<JsonValue>) -> Result<(), TransportError> {
        let request = JsonRpcRequest::notification(method, params);
        self.inner.post(serde_json::to_value(&request)?).await
    }

    async fn send_raw(&self, payload: JsonValue) -> Result<JsonValue, TransportError> {
        let id = extract_id(&payload);
        let rx = id.clone().map(|id| self.inner.outstanding.register(id)).transpose()?;
        self.inner.post(payload).await?;
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

    fn stream_request(
        &self,
        payload: JsonValue,
    ) -> std::pin::Pin<Box<dyn tokio_stream::Stream<Item = JsonValue> + Send + '_>> {
        let (tx, rx) = mpsc::channel(32);
        let id = extract_id(&payload);
        if let Some(id) = id {
            self.inner.stream_subscribers.lock().expect("stream subscriber map poisoned").insert(id, tx);
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                if let Err(err) = inner.post(payload).await {
                    debug!(target: "mcpf.transport.sse", %err, "stream_request post failed");
                }
            });
        }
        Box::pin(ReceiverStream::new(rx))
    }

    async fn send_batch(&self, requests: Vec<JsonRpcRequest>) -> Result<Vec<JsonRpcResponse>, TransportError> {
        let mut receivers = Vec::with_capacity(requests.len());
        for request in &requests {
            if let Some(id) = request.id.clone() {
                receivers.push(Some(self.inner.outstanding.register(id)?));
            } else {
                receivers.push(None);
            }
        }
        self.inner.post(serde_json::to_value(&requests)?).await?;

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
