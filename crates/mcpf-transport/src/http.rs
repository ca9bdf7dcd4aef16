// SPDX-License-Identifier: MIT OR Apache-2.0
//! Plain HTTP POST transport: one request per POST, reply read from the
//! response body (either `application/json` or a single-shot
//! `text/event-stream`).

use crate::error::TransportError;
use crate::sse_support::{classify_send_error, parse_event_block};
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
use tracing::debug;

struct Inner {
    client: reqwest::Client,
    endpoint: url::Url,
    headers: HashMap<String, String>,
    session_id: RwLock<Option<String>>,
    next_id: AtomicI64,
}

impl Inner {
    fn next_request_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn post(&self, body: JsonValue) -> Result<JsonValue, TransportError> {
        let mut req = self
            .client
            .post(self.endpoint.as_str())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json, text/event-stream")
            .json(&body);

        {
            let session_id = self.session_id.read().await;
            if let Some(id) = session_id.as_deref() {
                req = req.header("MCP-Session-Id", id);
            }
        }
        for (key, value) in &self.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        let response = req.send().await.map_err(classify_send_error)?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(TransportError::UnexpectedStatus { status: status.as_u16() });
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            let mut session_id = self.session_id.write().await;
            if session_id.is_some() {
                *session_id = None;
                return Err(TransportError::Disconnected { id: RequestId::Number(0) });
            }
            return Err(TransportError::UnexpectedStatus { status: status.as_u16() });
        }
        if status == reqwest::StatusCode::ACCEPTED {
            return Ok(JsonValue::Null);
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
            let mut session_id = self.session_id.write().await;
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
            let text = response.text().await.map_err(TransportError::Http)?;
            Ok(first_sse_data_value(&text).unwrap_or(JsonValue::Null))
        } else {
            response.json::<JsonValue>().await.map_err(TransportError::Http)
        }
    }
}

/// Parse the first non-ping `data:` payload out of a single-shot SSE body,
/// as `application/json` POST replies sometimes prefer a stream even for a
/// single envelope.
fn first_sse_data_value(body: &str) -> Option<JsonValue> {
    body.split("\n\n").find_map(parse_event_block)
}

/// Speaks plain HTTP POST to an MCP endpoint. Each request is one POST;
/// the reply is read synchronously from the response body.
pub struct HttpTransport {
    inner: Arc<Inner>,
}

impl HttpTransport {
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
            }),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
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
                debug!(target: "mcpf.transport.http", %err, "session termination DELETE failed");
            }
        }
        Ok(())
    }

    async fn send_request(&self, method: &str, params: Option<JsonValue>) -> Result<JsonRpcResponse, TransportError> {
        let id = self.inner.next_request_id();
        let request = JsonRpcRequest::call(id, method, params);
        let value = self.inner.post(serde_json::to_value(&request)?).await?;
        if value.is_null() {
            return Err(TransportError::Retryable("empty response body".to_string()));
        }
        Ok(serde_json::from_value(value)?)
    }

    async fn send_notification(&self, method: &str, params: Option<JsonValue>) -> Result<(), TransportError> {
        let request = JsonRpcRequest::notification(method, params);
        self.inner.post(serde_json::to_value(&request)?).await?;
        Ok(())
    }

    async fn send_raw(&self, payload: JsonValue) -> Result<JsonValue, TransportError> {
        self.inner.post(payload).await
    }

    fn stream_request(
        &self,
        payload: JsonValue,
    ) -> std::pin::Pin<Box<dyn tokio_stream::Stream<Item = JsonValue> + Send + '_>> {
        let (tx, rx) = tokio::sync::mpsc::channel(32);
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            match inner.post(payload).await {
                Ok(value) => {
                    let _ = tx.send(value).await;
                }
                Err(err) => debug!(target: "mcpf.transport.http", %err, "stream_request failed"),
            }
        });
        Box::pin(ReceiverStream::new(rx))
    }

    async fn send_batch(&self, requests: Vec<JsonRpcRequest>) -> Result<Vec<JsonRpcResponse>, TransportError> {
        let value = self.inner.post(serde_json::to_value(&requests)?).await?;
        let array = value.as_array().cloned().unwrap_or_default();
        array.into_iter().map(serde_json::from_value).collect::<Result<_, _>>().map_err(TransportError::from)
    }
}
