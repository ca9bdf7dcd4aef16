// SPDX-License-Identifier: MIT OR Apache-2.0
//! Streamable HTTP transport: like the plain HTTP transport, but a single
//! POST's response body may itself be `text/event-stream`-framed, carrying
//! a progress sequence followed by a terminal result for that one request.

use crate::error::TransportError;
use crate::outstanding::OutstandingMap;
use crate::sse_support::{classify_send_error, drain_complete_events, extract_id, is_terminal};
use crate::transport::Transport;
use async_trait::async_trait;
use mcpf_core::{JsonRpcRequest, JsonRpcResponse, JsonValue, RequestId};
use mcpf_safety::NetworkPolicy;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt as _;
use tracing::debug;

struct Inner {
    client: reqwest::Client,
    endpoint: url::Url,
    headers: HashMap<String, String>,
    session_id: RwLock<Option<String>>,
    next_id: AtomicI64,
    outstanding: Arc<OutstandingMap>,
}

/// One POST's outcome: a fully-read value, or a streamed response whose
/// events are dispatched by a background reader as they arrive.
enum PostOutcome {
    Value(JsonValue),
    Streaming,
}

impl Inner {
    fn next_request_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn run_stream_reader(
        &self,
        response: reqwest::Response,
        on_progress: Option<tokio::sync::mpsc::Sender<JsonValue>>,
    ) {
        let mut buffer = String::new();
        let mut byte_stream = response.bytes_stream();

        while let Some(chunk) = byte_stream.next().await {
            let Ok(chunk) = chunk else { break };
            let Ok(text) = std::str::from_utf8(&chunk) else { continue };
            buffer.push_str(text);
            drain_complete_events(&mut buffer, |value| {
                if is_terminal(&value) {
                    if let Some(id) = extract_id(&value) {
                        if let Ok(response) = serde_json::from_value::<JsonRpcResponse>(value.clone()) {
                            self.outstanding.complete(response);
                        } else {
                            self.outstanding.remove(&id);
                        }
                    }
                } else if let Some(tx) = &on_progress {
                    let _ = tx.try_send(value);
                }
            });
        }
    }
}

/// POST `body` to `inner`'s endpoint. If the response streams, spawn a
/// reader that dispatches every event to `inner.outstanding` (and to
/// `on_progress`, if given, for non-terminal events) and return
/// immediately; terminal/non-streaming replies are read out fully before
/// returning. A free function (not a method) so it can take its own `Arc`
/// clone into the spawned reader task without an `Arc<Self>` receiver.
async fn post(
    inner: &Arc<Inner>,
    body: JsonValue,
    on_progress: Option<tokio::sync::mpsc::Sender<JsonValue>>,
) -> Result<PostOutcome, TransportError> {
    let mut req = inner
        .client
        .post(inner.endpoint.as_str())
        .header("Content-Type", "application/json")
        .header("Accept", "application/json, text/event-stream")
        .json(&body);

    {
        let session_id = inner.session_id.read().await;
        if let Some(id) = session_id.as_deref() {
            req = req.header("MCP-Session-Id", id);
        }
    }
    for (key, value) in &inner.headers {
        req = req.header(key.as_str(), value.as_str());
    }

    let response = req.send().await.map_err(classify_send_error)?;
    let status = response.status();
    if status == reqwest::StatusCode::ACCEPTED {
        return Ok(PostOutcome::Value(JsonValue::Null));
    }
    if !status.is_success() {
        return Err(TransportError::UnexpectedStatus { status: status.as_u16() });
    }

    if let Some(new_session) = response
        .headers()
        .get("MCP-Session-Id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
    {
        let mut session_id = inner.session_id.write().await;
        if session_id.is_none() {
            *session_id = Some(new_session);
        }
    }

    let content_type = response
        .headers()
        .get("Content-Type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if content_type.contains("text/event-stream") {
        let reader_inner = Arc::clone(inner);
        tokio::spawn(async move {
            reader_inner.run_stream_reader(response, on_progress).await;
        });
        Ok(PostOutcome::Streaming)
    } else {
        let value = response.json::<JsonValue>().await.map_err(TransportError::Http)?;
        Ok(PostOutcome::Value(value))
    }
}

/// Speaks the streamable-HTTP transport: each POST's response is either a
/// direct JSON body or a single-request SSE stream of progress events
/// terminating in one final result.
pub struct StreamableHttpTransport {
    inner: Arc<Inner>,
}

impl StreamableHttpTransport {
    /// Build a transport targeting `endpoint`. `network_policy` is consulted
    /// on every redirect hop a POST encounters.
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

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                endpoint,
                headers,
                session_id: RwLock::new(None),
                next_id: AtomicI64::new(1),
                outstanding: Arc::new(OutstandingMap::default()),
            }),
        })
    }
}

#[async_trait]
impl Transport for StreamableHttpTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.inner.outstanding.drain();
        let session_id = self.inner.session_id.write().await.take();
        if let Some(session_id) = session_id {
            let result = self
                .inner
                .client
                .delete(self.inner.endpoint.as_str())
                .header("MCP-Session-Id", session_id)
                .send()
                .await;
            if let Err(err) = result {
                debug!(target: "mcpf.transport.streamable", %err, "session termination DELETE failed");
            }
        }
        Ok(())
    }

    async fn send_request(&self, method: &str, params: Option<JsonValue>) -> Result<JsonRpcResponse, TransportError> {
        let id = self.inner.next_request_id();
        let request = JsonRpcRequest::call(id.clone(), method, params);
        let rx = self.inner.outstanding.register(id.clone())?;
        match post(&self.inner, serde_json::to_value(&request)?, None).await? {
            PostOutcome::Value(value) => {
                self.inner.outstanding.remove(&id);
                if value.is_null() {
                    return Err(TransportError::Retryable("empty response body".to_string()));
                }
                Ok(serde_json::from_value(value)?)
            }
            PostOutcome::Streaming => rx.await.map_err(|_| TransportError::Disconnected { id }),
        }
    }

    async fn send_notification(&self, method: &str, params: Option<JsonValue>) -> Result<(), TransportError> {
        let request = JsonRpcRequest::notification(method, params);
        post(&self.inner, serde_json::to_value(&request)?, None).await?;
        Ok(())
    }

    async fn send_raw(&self, payload: JsonValue) -> Result<JsonValue, TransportError> {
        let id = extract_id(&payload);
        let rx = id.clone().map(|id| self.inner.outstanding.register(id)).transpose()?;
        match post(&self.inner, payload, None).await? {
            PostOutcome::Value(value) => {
                if let Some(id) = &id {
                    self.inner.outstanding.remove(id);
                }
                Ok(value)
            }
            PostOutcome::Streaming => match rx {
                Some(rx) => {
                    let response = rx
                        .await
                        .map_err(|_| TransportError::Disconnected { id: id.unwrap_or(RequestId::Number(0)) })?;
                    Ok(serde_json::to_value(response)?)
                }
                None => Ok(JsonValue::Null),
            },
        }
    }

    fn stream_request(
        &self,
        payload: JsonValue,
    ) -> std::pin::Pin<Box<dyn tokio_stream::Stream<Item = JsonValue> + Send + '_>> {
        let (tx, rx) = tokio::sync::mpsc::channel(32);
        let inner = Arc::clone(&self.inner);
        let id = extract_id(&payload);
        let registered = id.clone().and_then(|id| inner.outstanding.register(id).ok());

        tokio::spawn(async move {
            let progress_tx = tx.clone();
            match post(&inner, payload, Some(progress_tx)).await {
                Ok(PostOutcome::Value(value)) => {
                    let _ = tx.send(value).await;
                }
                Ok(PostOutcome::Streaming) => {
                    if let Some(rx) = registered {
                        if let Ok(response) = rx.await {
                            let _ = tx.send(serde_json::to_value(response).unwrap_or(JsonValue::Null)).await;
                        }
                    }
                }
                Err(err) => debug!(target: "mcpf.transport.streamable", %err, "stream_request failed"),
            }
        });
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

        match post(&self.inner, serde_json::to_value(&requests)?, None).await? {
            PostOutcome::Value(value) => {
                let array = value.as_array().cloned().unwrap_or_default();
                array.into_iter().map(serde_json::from_value).collect::<Result<_, _>>().map_err(TransportError::from)
            }
            PostOutcome::Streaming => {
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
    }
}
