// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-response structural checks: the JSON-RPC result/error exclusivity
//! rule, error object shape, id correlation, and schema conformance.
//!
//! Checks run against the raw response envelope rather than an
//! already-typed [`JsonRpcResponse`], since a hostile server is exactly the
//! case these checks exist to catch: a strict `serde` decode would simply
//! fail to parse, reporting none of the specifics a [`Finding`] captures.

use crate::schema_validate::CompiledSchema;
use mcpf_core::{Finding, FindingKind, JsonRpcError, JsonRpcRequest, JsonValue, RequestId};
use mcpf_protocol::batch::correlate_lenient;
use std::ops::RangeInclusive;

/// Checks one response, or a batch of responses, against the structural and
/// schema invariants every MCP reply must satisfy.
///
/// Stateless and cheap to share: construct one and reuse it across an
/// entire session.
#[derive(Debug, Default, Clone, Copy)]
pub struct InvariantChecker;

impl InvariantChecker {
    /// Construct a checker.
    pub fn new() -> Self {
        Self
    }

    /// Check one raw response envelope.
    ///
    /// `outstanding_id` is the id the request was registered under.
    /// `schema`, if supplied, is the declared result schema for the method
    /// or tool this response answers. `server_error_range`, if supplied,
    /// widens the accepted `error.code` range beyond the JSON-RPC reserved
    /// band to cover a server's own declared error codes.
    pub fn check_response(
        &self,
        outstanding_id: &RequestId,
        raw: &JsonValue,
        schema: Option<&CompiledSchema>,
        server_error_range: Option<&RangeInclusive<i64>>,
    ) -> Vec<Finding> {
        let mut findings = Vec::new();

        let result = raw.get("result");
        let error = raw.get("error");
        match (result, error) {
            (Some(_), Some(_)) => findings.push(Finding::new(
                FindingKind::NotExactlyOneOf,
                "result|error",
                "exactly one of result/error",
                "both present",
            )),
            (None, None) => findings.push(Finding::new(
                FindingKind::NotExactlyOneOf,
                "result|error",
                "exactly one of result/error",
                "neither present",
            )),
            _ => {}
        }

        if let Some(error) = error {
            self.check_error_shape(error, server_error_range, &mut findings);
        }

        self.check_id(outstanding_id, raw.get("id"), &mut findings);

        if let (Some(result), Some(schema)) = (result, schema) {
            for message in schema.errors(result) {
                findings.push(Finding::new(FindingKind::SchemaViolation, "result", "conforms to declared schema", message));
            }
        }

        findings
    }

    fn check_error_shape(
        &self,
        error: &JsonValue,
        server_error_range: Option<&RangeInclusive<i64>>,
        findings: &mut Vec<Finding>,
    ) {
        match error.get("code") {
            Some(JsonValue::Number(n)) if n.is_i64() || n.is_u64() => {
                let code = n.as_i64().unwrap_or(i64::MAX);
                let accepted = JsonRpcError::is_reserved_code(code)
                    || server_error_range.is_some_and(|range| range.contains(&code));
                if !accepted {
                    findings.push(Finding::new(
                        FindingKind::ErrorCodeType,
                        "error.code",
                        "a reserved JSON-RPC code or within the server-declared range",
                        code.to_string(),
                    ));
                }
            }
            other => findings.push(Finding::new(FindingKind::ErrorCodeType, "error.code", "integer", describe(other))),
        }

        match error.get("message") {
            Some(JsonValue::String(_)) => {}
            other => findings.push(Finding::new(FindingKind::ErrorMessageType, "error.message", "string", describe(other))),
        }
    }

    fn check_id(&self, outstanding_id: &RequestId, raw_id: Option<&JsonValue>, findings: &mut Vec<Finding>) {
        match raw_id.cloned().map(serde_json::from_value::<RequestId>) {
            Some(Ok(id)) if &id == outstanding_id => {}
            Some(Ok(id)) => findings.push(Finding::new(FindingKind::IdMismatch, "id", outstanding_id.to_string(), id.to_string())),
            _ => findings.push(Finding::new(FindingKind::IdMismatch, "id", outstanding_id.to_string(), describe(raw_id))),
        }
    }

    /// Check a raw batch response array: every element individually (with
    /// no schema or server error range — batch responses are checked for
    /// shape, not tool-specific conformance), plus the response id
    /// multi-set against the request id multi-set.
    pub fn check_batch(&self, requests: &[JsonRpcRequest], raw_responses: &JsonValue) -> Vec<Finding> {
        let mut findings = Vec::new();

        let Some(array) = raw_responses.as_array() else {
            findings.push(Finding::new(FindingKind::BatchIdMismatch, "batch", "a JSON array", describe(Some(raw_responses))));
            return findings;
        };

        for response in array {
            let Some(id) = response.get("id").cloned().and_then(|v| serde_json::from_value::<RequestId>(v).ok()) else {
                findings.push(Finding::new(FindingKind::IdMismatch, "batch[].id", "a request id", describe(response.get("id"))));
                continue;
            };
            findings.extend(self.check_response(&id, response, None, None));
        }

        if let Ok(parsed) = array.iter().cloned().map(serde_json::from_value).collect::<Result<Vec<_>, _>>() {
            for problem in correlate_lenient(requests, &parsed) {
                findings.push(Finding::new(FindingKind::BatchIdMismatch, "batch.ids", "request id multi-set", problem.to_string()));
            }
        }

        findings
    }
}

fn describe(value: Option<&JsonValue>) -> String {
    match value {
        None => "missing".to_string(),
        Some(JsonValue::Null) => "null".to_string(),
        Some(JsonValue::Bool(_)) => "boolean".to_string(),
        Some(JsonValue::Number(_)) => "number".to_string(),
        Some(JsonValue::String(_)) => "string".to_string(),
        Some(JsonValue::Array(_)) => "array".to_string(),
        Some(JsonValue::Object(_)) => "object".to_string(),
    }
}
