// SPDX-License-Identifier: MIT OR Apache-2.0
//! The uniform transport abstraction every wire shape implements.

use crate::error::TransportError;
use async_trait::async_trait;
use mcpf_core::{JsonRpcRequest, JsonRpcResponse, JsonValue, ToolDescriptor};
use std::pin::Pin;
use tokio_stream::Stream;

/// A uniform request/notification/stream abstraction over one MCP wire
/// shape (HTTP, SSE, stdio, or streamable-HTTP).
///
/// Implementations own their own connection state and outstanding-request
/// bookkeeping; callers only ever see the methods below.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish the underlying connection (a TCP/TLS handshake, a spawned
    /// child process, or a no-op for stateless HTTP).
    async fn connect(&self) -> Result<(), TransportError>;

    /// Tear down the connection. Every outstanding request receives
    /// [`TransportError::Disconnected`].
    async fn disconnect(&self) -> Result<(), TransportError>;

    /// Send a request and await its correlated reply.
    async fn send_request(
        &self,
        method: &str,
        params: Option<JsonValue>,
    ) -> Result<JsonRpcResponse, TransportError>;

    /// Send a fire-and-forget notification. No reply is awaited.
    async fn send_notification(
        &self,
        method: &str,
        params: Option<JsonValue>,
    ) -> Result<(), TransportError>;

    /// Send a pre-serialized JSON-RPC envelope verbatim and return whatever
    /// the transport receives back, without interpreting it as a
    /// [`JsonRpcResponse`]. Used by the protocol-level fuzzer to submit
    /// intentionally malformed envelopes.
    async fn send_raw(&self, payload: JsonValue) -> Result<JsonValue, TransportError>;

    /// Send `payload` and return a stream of every JSON fragment the server
    /// emits in reply (progress notifications followed by a terminal
    /// result), for methods that stream rather than reply once.
    fn stream_request(
        &self,
        payload: JsonValue,
    ) -> Pin<Box<dyn Stream<Item = JsonValue> + Send + '_>>;

    /// Send a JSON-RPC batch and collect the correlated responses, in
    /// request order.
    async fn send_batch(
        &self,
        requests: Vec<JsonRpcRequest>,
    ) -> Result<Vec<JsonRpcResponse>, TransportError>;

    /// Stop any process manager this transport owns, after
    /// [`disconnect`](Self::disconnect) has already torn down its tracked
    /// connection. Transports with no subprocess of their own (HTTP, SSE,
    /// streamable HTTP) no-op.
    async fn shutdown_processes(&self) {}

    /// Discover the tool catalog via `initialize` followed by `tools/list`.
    async fn get_tools(&self) -> Result<Vec<ToolDescriptor>, TransportError> {
        self.send_request("initialize", None).await?;
        let response = self.send_request("tools/list", None).await?;
        let result = response.result.unwrap_or(JsonValue::Null);
        let tools = result.get("tools").cloned().unwrap_or(JsonValue::Array(Vec::new()));
        parse_tool_descriptors(tools)
    }

    /// Invoke `tools/call` for `name` with `args`, returning the result
    /// value (or a [`TransportError`] built from a JSON-RPC error reply).
    async fn call_tool(&self, name: &str, args: JsonValue) -> Result<JsonValue, TransportError> {
        let params = serde_json::json!({ "name": name, "arguments": args });
        let response = self.send_request("tools/call", Some(params)).await?;
        match (response.result, response.error) {
            (Some(result), _) => Ok(result),
            (None, Some(error)) => Err(TransportError::Retryable(error.message)),
            (None, None) => Err(TransportError::Retryable("empty response".to_string())),
        }
    }
}

fn parse_tool_descriptors(tools: JsonValue) -> Result<Vec<ToolDescriptor>, TransportError> {
    let entries = match tools {
        JsonValue::Array(entries) => entries,
        other => return Err(TransportError::Encoding(serde_json::Error::io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("expected tools/list result.tools to be an array, got {other}"),
        )))),
    };

    entries
        .into_iter()
        .map(|entry| {
            let name = entry
                .get("name")
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_string();
            let description = entry.get("description").and_then(JsonValue::as_str).map(str::to_string);
            let input_schema = entry
                .get("inputSchema")
                .cloned()
                .map(serde_json::from_value)
                .transpose()?
                .unwrap_or_default();
            let mut descriptor = ToolDescriptor::new(name, input_schema);
            if let Some(description) = description {
                descriptor = descriptor.with_description(description);
            }
            Ok(descriptor)
        })
        .collect::<Result<Vec<_>, serde_json::Error>>()
        .map_err(TransportError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_tool_descriptors_from_tools_list_shape() {
        let tools = json!([
            { "name": "search", "description": "search docs", "inputSchema": { "type": "object" } },
            { "name": "fetch", "inputSchema": { "type": "object" } },
        ]);
        let parsed = parse_tool_descriptors(tools).expect("parse");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name, "search");
        assert_eq!(parsed[0].description.as_deref(), Some("search docs"));
        assert_eq!(parsed[1].description, None);
    }
}
