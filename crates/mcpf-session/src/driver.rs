// SPDX-License-Identifier: MIT OR Apache-2.0
//! The session driver: the one place that owns the full lifecycle of a
//! fuzzing run, from connecting a transport through to a [`SessionSummary`].

use crate::build::{build_safety_filter, build_transport};
use crate::error::SessionError;
use mcpf_config::FuzzConfig;
use mcpf_core::{Outcome, RequestId, RunRecord, SessionSummary, ToolDescriptor};
use mcpf_executor::{CancellationToken, Executor, ExecutorConfig, RetryPolicy};
use mcpf_invariant::InvariantChecker;
use mcpf_strategy::{Mode, StrategyManager};
use mcpf_transport::Transport;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Everything a completed session produced: the full per-case history, and
/// the tallies folded from it.
#[derive(Debug, Clone, Default)]
pub struct SessionOutcome {
    /// Every case dispatched this session, in dispatch order.
    pub records: Vec<RunRecord>,
    /// Per-target and session-wide tallies folded from `records`.
    pub summary: SessionSummary,
}

/// Drives one fuzzing session end to end: builds the transport and safety
/// collaborators from a [`FuzzConfig`], discovers tools if the mode calls
/// for it, pulls cases from a [`StrategyManager`] and dispatches them
/// through an [`Executor`], checks every response against the invariant
/// checker, and tears everything down in order.
pub struct SessionDriver {
    config: FuzzConfig,
    executor: Executor,
}

impl SessionDriver {
    /// Build a driver for `config`. Does not connect anything yet; call
    /// [`run`](Self::run) to actually execute the session.
    pub fn new(config: FuzzConfig) -> Self {
        let executor = Executor::new(ExecutorConfig {
            max_concurrency: config.max_concurrency,
            per_operation_timeout: Duration::from_secs_f64(config.timeout_s),
            retry: RetryPolicy {
                count: config.retry_count,
                ..RetryPolicy::default()
            },
        });
        Self { config, executor }
    }

    /// The session-wide cancellation token. Cloning it and calling
    /// [`CancellationToken::cancel`] (e.g. from a SIGINT handler installed
    /// before [`run`](Self::run) is awaited) stops the run at its next
    /// dispatch boundary.
    pub fn cancel_token(&self) -> CancellationToken {
        self.executor.cancel_token()
    }

    /// Run the full session lifecycle and return every record plus the
    /// final summary.
    ///
    /// Connecting, tool discovery, and command-blocker shim installation
    /// are the only steps that can abort the session outright; everything
    /// dispatched afterward is recorded as an [`Outcome`] on its
    /// [`RunRecord`] rather than surfaced as an `Err`.
    pub async fn run(&self) -> Result<SessionOutcome, SessionError> {
        let started = Instant::now();
        let built = build_transport(&self.config)?;
        let transport = built.transport;

        transport.connect().await?;
        info!(target: "mcpf.session", protocol = ?self.config.protocol, "connected transport");

        let tools = if matches!(self.config.mode, Mode::Tools | Mode::Both) {
            let discovered = transport.get_tools().await?;
            info!(target: "mcpf.session", count = discovered.len(), "discovered tools");
            discovered
        } else {
            Vec::new()
        };

        let outcome = self.drive(transport.as_ref(), &tools).await;

        self.executor.shutdown().await;
        if let Err(err) = transport.disconnect().await {
            warn!(target: "mcpf.session", error = %err, "transport disconnect reported an error");
        }
        transport.shutdown_processes().await;

        info!(
            target: "mcpf.session",
            cases = outcome.records.len(),
            exit_status = outcome.summary.exit_status(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "session finished"
        );

        Ok(outcome)
    }

    async fn drive(&self, transport: &dyn Transport, tools: &[ToolDescriptor]) -> SessionOutcome {
        let seed = self.config.seed.unwrap_or_else(fallback_seed);
        let mut manager = StrategyManager::new(self.config.mode, self.config.phase, tools, self.config.runs_per_tool, seed);
        let safety = build_safety_filter(&self.config);
        let checker = InvariantChecker::new();

        let mut records = Vec::new();

        loop {
            if self.executor.cancel_token().is_cancelled() {
                break;
            }
            let case = match manager.next_case() {
                Some(Ok(case)) => case,
                Some(Err(err)) => {
                    warn!(target: "mcpf.session", error = %err, "skipping a target after a generation failure");
                    continue;
                }
                None => break,
            };

            debug!(target: "mcpf.session.dispatch", fingerprint = %case.fingerprint(), "dispatching case");
            let dispatched = self.executor.dispatch(case, transport, &safety).await;
            let (outcome, findings) = check_invariants(&checker, &dispatched.outcome, dispatched.raw_response.as_ref());

            let record = RunRecord::new(dispatched.case, outcome, dispatched.duration).with_findings(findings);
            manager.record(&record);
            records.push(record);
        }

        SessionOutcome { records, summary: manager.summary().clone() }
    }
}

/// Run the invariant checker over a dispatched case's raw response, if it
/// has one, and promote `outcome` to [`Outcome::InvariantViolation`] when
/// findings turn up. A synthesized `Blocked` mock response never reached a
/// real server, so it's never checked. There is no declared result schema
/// anywhere in this workspace's data model, so schema conformance is never
/// checked — only the structural JSON-RPC invariants are.
fn check_invariants(
    checker: &InvariantChecker,
    outcome: &Outcome,
    raw_response: Option<&mcpf_core::JsonValue>,
) -> (Outcome, Vec<mcpf_core::Finding>) {
    if matches!(outcome, Outcome::Blocked { .. }) {
        return (outcome.clone(), Vec::new());
    }
    let Some(raw) = raw_response else {
        return (outcome.clone(), Vec::new());
    };

    let outstanding_id = raw
        .get("id")
        .cloned()
        .and_then(|value| serde_json::from_value::<RequestId>(value).ok())
        .unwrap_or(RequestId::Number(0));
    let findings = checker.check_response(&outstanding_id, raw, None, None);

    let promoted = match findings.first() {
        Some(finding) => Outcome::InvariantViolation { kind: finding.kind },
        None => outcome.clone(),
    };
    (promoted, findings)
}

fn fallback_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mcpf_config::{Endpoint, Protocol};
    use mcpf_core::{FindingKind, JsonRpcRequest, JsonRpcResponse, JsonSchema, JsonValue, PrimitiveType};
    use mcpf_strategy::PhaseSelection;
    use mcpf_transport::TransportError;
    use std::pin::Pin;
    use std::sync::Mutex;
    use tokio_stream::Stream;

    /// Hands back one scripted `send_raw` reply per call, in order.
    struct MockTransport {
        responses: Mutex<Vec<JsonValue>>,
    }

    impl MockTransport {
        fn new(responses: Vec<JsonValue>) -> Self {
            Self { responses: Mutex::new(responses) }
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn connect(&self) -> Result<(), TransportError> {
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), TransportError> {
            Ok(())
        }

        async fn send_request(
            &self,
            _method: &str,
            _params: Option<JsonValue>,
        ) -> Result<JsonRpcResponse, TransportError> {
            unimplemented!("the session driver dispatches via send_raw")
        }

        async fn send_notification(&self, _method: &str, _params: Option<JsonValue>) -> Result<(), TransportError> {
            Ok(())
        }

        async fn send_raw(&self, _payload: JsonValue) -> Result<JsonValue, TransportError> {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(TransportError::Retryable("scripted responses exhausted".into()));
            }
            Ok(responses.remove(0))
        }

        fn stream_request(&self, _payload: JsonValue) -> Pin<Box<dyn Stream<Item = JsonValue> + Send + '_>> {
            Box::pin(tokio_stream::iter(std::iter::empty()))
        }

        async fn send_batch(&self, _requests: Vec<JsonRpcRequest>) -> Result<Vec<JsonRpcResponse>, TransportError> {
            Ok(Vec::new())
        }
    }

    fn test_config(mode: Mode, runs_per_tool: usize) -> FuzzConfig {
        FuzzConfig {
            mode,
            phase: PhaseSelection::Realistic,
            protocol: Protocol::Http,
            endpoint: Endpoint::Network { url: "http://127.0.0.1:9999/mcp".parse().unwrap() },
            runs_per_tool,
            max_concurrency: 4,
            timeout_s: 1.0,
            retry_count: 0,
            safety_enabled: true,
            fs_root: std::env::temp_dir(),
            sandbox_paths: true,
            network_policy: Default::default(),
            seed: Some(7),
            auth_headers: Default::default(),
        }
    }

    #[tokio::test]
    async fn protocol_only_session_dispatches_every_catalog_method_once() {
        let method_count = mcpf_protocol::catalog().len();
        let responses = (0..method_count)
            .map(|i| serde_json::json!({ "jsonrpc": "2.0", "id": i + 1, "result": {} }))
            .collect();
        let transport = MockTransport::new(responses);
        let driver = SessionDriver::new(test_config(Mode::Protocol, 1));

        let outcome = driver.drive(&transport, &[]).await;

        assert_eq!(outcome.records.len(), method_count);
        assert!(outcome.records.iter().all(|r| matches!(r.outcome, Outcome::Success { .. })));
        assert_eq!(outcome.summary.exit_status(), 0);
    }

    #[tokio::test]
    async fn a_response_with_both_result_and_error_is_promoted_to_an_invariant_violation() {
        let transport = MockTransport::new(vec![serde_json::json!({
            "jsonrpc": "2.0", "id": 1, "result": {}, "error": { "code": -32600, "message": "bad" }
        })]);
        let tools = vec![ToolDescriptor::new("echo", JsonSchema::of_type(PrimitiveType::String))];
        let driver = SessionDriver::new(test_config(Mode::Tools, 1));

        let outcome = driver.drive(&transport, &tools).await;

        assert_eq!(outcome.records.len(), 1);
        match &outcome.records[0].outcome {
            Outcome::InvariantViolation { kind } => assert_eq!(*kind, FindingKind::NotExactlyOneOf),
            other => panic!("expected an invariant violation, got {other:?}"),
        }
        assert_eq!(outcome.records[0].invariant_findings.len(), 1);
        assert_eq!(outcome.summary.exit_status(), 1);
    }

    #[test]
    fn a_blocked_outcome_is_never_invariant_checked() {
        let checker = InvariantChecker::new();
        // A synthesized mock response for a blocked case could itself look
        // malformed; that must never surface as an invariant violation.
        let mock = serde_json::json!({ "jsonrpc": "2.0", "id": 1, "result": { "blocked": true } });
        let blocked = Outcome::Blocked { reason: "dangerous substring".to_string() };

        let (outcome, findings) = check_invariants(&checker, &blocked, Some(&mock));

        assert!(matches!(outcome, Outcome::Blocked { .. }));
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn cancelling_before_drive_yields_no_records() {
        let transport = MockTransport::new(vec![]);
        let driver = SessionDriver::new(test_config(Mode::Protocol, 1));
        driver.cancel_token().cancel();

        let outcome = driver.drive(&transport, &[]).await;

        assert!(outcome.records.is_empty());
    }
}
