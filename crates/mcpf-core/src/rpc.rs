// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON-RPC 2.0 request/response envelopes, as specified by MCP.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON-RPC request identifier: a string or an integer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric identifier.
    Number(i64),
    /// String identifier.
    String(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        RequestId::String(s)
    }
}

/// A JSON-RPC 2.0 request. Notifications are requests with `id: None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Always `"2.0"`.
    pub jsonrpc: JsonRpcVersion,
    /// Absent for notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    /// The method name, e.g. `"tools/call"`.
    pub method: String,
    /// Method parameters, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Build a request expecting a correlated reply.
    pub fn call(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id: Some(id),
            method: method.into(),
            params,
        }
    }

    /// Build a fire-and-forget notification (no `id`).
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id: None,
            method: method.into(),
            params,
        }
    }

    /// True if this request carries no `id` (a notification).
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code. Reserved codes are in `-32768..=-32000`.
    pub code: i64,
    /// Short human-readable message.
    pub message: String,
    /// Optional structured detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// `-32700` Parse error.
    pub const PARSE_ERROR: i64 = -32700;
    /// `-32600` Invalid request.
    pub const INVALID_REQUEST: i64 = -32600;
    /// `-32601` Method not found.
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// `-32602` Invalid params.
    pub const INVALID_PARAMS: i64 = -32602;
    /// `-32603` Internal error.
    pub const INTERNAL_ERROR: i64 = -32603;

    /// True if `code` falls in the JSON-RPC reserved range `-32768..=-32000`.
    pub fn is_reserved_code(code: i64) -> bool {
        (-32768..=-32000).contains(&code)
    }
}

/// A JSON-RPC 2.0 response. Exactly one of `result`/`error` is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always `"2.0"`.
    pub jsonrpc: JsonRpcVersion,
    /// Echoes the request's `id`.
    pub id: RequestId,
    /// Present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Present on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Build a successful response.
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response.
    pub fn failure(id: RequestId, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id,
            result: None,
            error: Some(error),
        }
    }

    /// True exactly when `result` xor `error` is present — a well-formed envelope.
    pub fn is_well_formed(&self) -> bool {
        self.result.is_some() != self.error.is_some()
    }
}

/// A zero-sized marker type that serializes as the literal string `"2.0"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonRpcVersion;

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        s.serialize_str("2.0")
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(d)?;
        if s == "2.0" {
            Ok(JsonRpcVersion)
        } else {
            Err(serde::de::Error::custom(format!(
                "unsupported jsonrpc version: {s}"
            )))
        }
    }
}

/// An ordered batch of requests, correlated by `id` with a [`BatchResponse`].
pub type BatchRequest = Vec<JsonRpcRequest>;

/// An ordered batch of responses returned for a [`BatchRequest`].
pub type BatchResponse = Vec<JsonRpcResponse>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_has_no_id() {
        let req = JsonRpcRequest::notification("progress/cancel", None);
        assert!(req.is_notification());
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("id").is_none());
    }

    #[test]
    fn well_formed_response_checks_xor() {
        let ok = JsonRpcResponse::success(RequestId::Number(1), serde_json::json!({"ok": true}));
        assert!(ok.is_well_formed());

        let err = JsonRpcResponse::failure(
            RequestId::Number(1),
            JsonRpcError {
                code: JsonRpcError::INVALID_PARAMS,
                message: "bad params".into(),
                data: None,
            },
        );
        assert!(err.is_well_formed());

        let mut malformed = ok.clone();
        malformed.error = Some(JsonRpcError {
            code: JsonRpcError::INTERNAL_ERROR,
            message: "oops".into(),
            data: None,
        });
        assert!(!malformed.is_well_formed());
    }

    #[test]
    fn request_id_round_trips_both_variants() {
        let n: RequestId = serde_json::from_value(serde_json::json!(42)).unwrap();
        assert_eq!(n, RequestId::Number(42));
        let s: RequestId = serde_json::from_value(serde_json::json!("abc")).unwrap();
        assert_eq!(s, RequestId::String("abc".into()));
    }

    #[test]
    fn rejects_wrong_jsonrpc_version() {
        let parsed: Result<JsonRpcRequest, _> = serde_json::from_value(serde_json::json!({
            "jsonrpc": "1.0",
            "id": 1,
            "method": "tools/list",
        }));
        assert!(parsed.is_err());
    }
}
