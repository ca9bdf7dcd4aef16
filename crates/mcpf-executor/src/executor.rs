// SPDX-License-Identifier: MIT OR Apache-2.0
//! Bounded-concurrency dispatch of generated test cases: consults the
//! safety filter, races the transport against a per-operation timeout,
//! retries transient failures with backoff, and classifies the result.

use crate::cancel::CancellationToken;
use crate::retry::{compute_delay, RetryPolicy};
use mcpf_core::{FuzzTarget, JsonRpcRequest, JsonValue, Outcome, RequestId, TestCase, TransportErrorKind};
use mcpf_safety::{Decision, SafetyFilter};
use mcpf_transport::{Transport, TransportError};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// The knobs an [`Executor`] is built with.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of cases dispatched concurrently.
    pub max_concurrency: usize,
    /// Wall-clock budget for one case, including all of its retries.
    pub per_operation_timeout: Duration,
    /// Retry-with-backoff policy for `Retryable`/`Timeout` transport errors.
    pub retry: RetryPolicy,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            per_operation_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// The result of dispatching one [`TestCase`], before invariant checking.
///
/// `raw_response` carries the untyped JSON-RPC envelope the transport
/// returned, when one was received, so the invariant checker can run its
/// structural and schema checks against it.
#[derive(Debug, Clone)]
pub struct Dispatched {
    /// The case that was dispatched.
    pub case: TestCase,
    /// How it concluded, at the transport/safety layer.
    pub outcome: Outcome,
    /// Wall-clock time spent dispatching this case, including retries.
    pub duration: Duration,
    /// The raw response envelope, if the transport returned one.
    pub raw_response: Option<JsonValue>,
}

/// Bounded-concurrency task pool that dispatches [`TestCase`]s against a
/// [`Transport`], enforcing the safety filter and a retry-with-backoff
/// policy around transient transport failures.
pub struct Executor {
    semaphore: Arc<Semaphore>,
    max_concurrency: u32,
    timeout: Duration,
    retry: RetryPolicy,
    cancel: CancellationToken,
    next_id: AtomicI64,
}

impl Executor {
    /// Build an executor from `config`, with a fresh, uncancelled token.
    pub fn new(config: ExecutorConfig) -> Self {
        let max_concurrency = config.max_concurrency.max(1) as u32;
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency as usize)),
            max_concurrency,
            timeout: config.per_operation_timeout,
            retry: config.retry,
            cancel: CancellationToken::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// The cancellation token this executor observes. Cloning it and
    /// calling [`CancellationToken::cancel`] stops the executor from
    /// accepting new work and unblocks any in-flight retries/sleeps.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Dispatch one case: consult the safety filter, then send and await a
    /// reply, retrying transient failures with backoff, bounded by the
    /// executor's concurrency semaphore and per-operation timeout.
    pub async fn dispatch(
        &self,
        case: TestCase,
        transport: &dyn Transport,
        safety: &SafetyFilter,
    ) -> Dispatched {
        let start = Instant::now();

        let permit = tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                return Dispatched {
                    case,
                    outcome: Outcome::TransportError { kind: TransportErrorKind::Cancelled },
                    duration: start.elapsed(),
                    raw_response: None,
                };
            }
            acquired = self.semaphore.acquire() => {
                match acquired {
                    Ok(permit) => permit,
                    Err(_closed) => {
                        return Dispatched {
                            case,
                            outcome: Outcome::TransportError { kind: TransportErrorKind::Cancelled },
                            duration: start.elapsed(),
                            raw_response: None,
                        };
                    }
                }
            }
        };

        let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (method, params) = envelope_for(&case);

        let params = match safety.check(&method, &params) {
            Decision::Block(reason) => {
                drop(permit);
                let mock = serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": { "blocked": true, "reason": reason },
                });
                return Dispatched {
                    case,
                    outcome: Outcome::Blocked { reason },
                    duration: start.elapsed(),
                    raw_response: Some(mock),
                };
            }
            Decision::Allow(params) | Decision::Sanitize(params) => params,
        };

        let request = JsonRpcRequest::call(id, method, Some(params));
        let envelope = match serde_json::to_value(&request) {
            Ok(value) => value,
            Err(_err) => {
                drop(permit);
                return Dispatched {
                    case,
                    outcome: Outcome::TransportError { kind: TransportErrorKind::Encoding },
                    duration: start.elapsed(),
                    raw_response: None,
                };
            }
        };

        let result = self.send_with_retry(&envelope, transport, case.seed).await;
        drop(permit);

        let (outcome, raw_response) = match result {
            Ok(raw) => (classify(&raw), Some(raw)),
            Err(TransportError::Timeout) => (Outcome::Timeout, None),
            Err(err) => (Outcome::TransportError { kind: err.kind() }, None),
        };

        Dispatched { case, outcome, duration: start.elapsed(), raw_response }
    }

    /// Dispatch every case concurrently, bounded by the executor's
    /// semaphore, and return the results in input order. A single slow
    /// case does not delay collection of the others beyond that bound.
    pub async fn dispatch_batch(
        &self,
        cases: Vec<TestCase>,
        transport: &dyn Transport,
        safety: &SafetyFilter,
    ) -> Vec<Dispatched> {
        let futures = cases.into_iter().map(|case| self.dispatch(case, transport, safety));
        futures::future::join_all(futures).await
    }

    /// Stop accepting new work and wait for every in-flight dispatch to
    /// finish before returning. Idempotent; no orphan tasks survive it.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        if let Ok(permits) = self.semaphore.acquire_many(self.max_concurrency).await {
            permits.forget();
        }
    }

    async fn send_with_retry(
        &self,
        envelope: &JsonValue,
        transport: &dyn Transport,
        seed: u64,
    ) -> Result<JsonValue, TransportError> {
        let mut attempt = 0u32;
        loop {
            let attempted = tokio::select! {
                biased;
                () = self.cancel.cancelled() => Err(TransportError::Cancelled),
                outcome = tokio::time::timeout(self.timeout, transport.send_raw(envelope.clone())) => {
                    outcome.unwrap_or(Err(TransportError::Timeout))
                }
            };

            let err = match attempted {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let retryable = matches!(
                err.kind(),
                TransportErrorKind::Retryable | TransportErrorKind::Timeout
            );
            if !retryable || attempt >= self.retry.count {
                return Err(err);
            }

            let delay = compute_delay(&self.retry, attempt, seed);
            warn!(
                target: "mcpf.executor.retry",
                error = %err,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "retryable transport failure, backing off"
            );

            tokio::select! {
                () = self.cancel.cancelled() => return Err(TransportError::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
            debug!(target: "mcpf.executor.retry", attempt, "retrying");
        }
    }
}

/// The JSON-RPC method and params a case's target maps to.
fn envelope_for(case: &TestCase) -> (String, JsonValue) {
    match &case.target {
        FuzzTarget::Tool { name } => {
            ("tools/call".to_string(), serde_json::json!({ "name": name, "arguments": case.args }))
        }
        FuzzTarget::ProtocolMethod { method } => (method.clone(), case.args.clone()),
    }
}

/// Classify a raw JSON-RPC response envelope into a terminal [`Outcome`].
/// A malformed envelope (neither or both of `result`/`error`) is still
/// reported `Success`; the invariant checker is the layer that flags the
/// malformation, not the executor.
fn classify(raw: &JsonValue) -> Outcome {
    match raw.get("error") {
        Some(error) if raw.get("result").is_none() => {
            let code = error.get("code").and_then(JsonValue::as_i64).unwrap_or(0);
            let msg = error.get("message").and_then(JsonValue::as_str).unwrap_or("").to_string();
            Outcome::ProtocolError { code, msg }
        }
        _ => Outcome::Success { response: raw.clone() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mcpf_core::{FuzzTarget, JsonRpcResponse, Phase};
    use std::pin::Pin;
    use std::sync::Mutex;
    use tokio_stream::Stream;

    #[derive(Clone)]
    enum Step {
        Success(JsonValue),
        Retryable,
        Connect,
    }

    struct ScriptedTransport {
        calls: Mutex<u32>,
        script: Vec<Step>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Step>) -> Self {
            Self { calls: Mutex::new(0), script }
        }

        fn call_count(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
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
            unimplemented!("executor dispatches via send_raw")
        }

        async fn send_notification(
            &self,
            _method: &str,
            _params: Option<JsonValue>,
        ) -> Result<(), TransportError> {
            Ok(())
        }

        async fn send_raw(&self, _payload: JsonValue) -> Result<JsonValue, TransportError> {
            let mut calls = self.calls.lock().unwrap();
            let index = *calls as usize;
            *calls += 1;
            match self.script.get(index).cloned() {
                Some(Step::Success(value)) => Ok(value),
                Some(Step::Retryable) => Err(TransportError::Retryable("flaky".into())),
                Some(Step::Connect) => Err(TransportError::Connect("refused".into())),
                None => Err(TransportError::Retryable("exhausted script".into())),
            }
        }

        fn stream_request(
            &self,
            _payload: JsonValue,
        ) -> Pin<Box<dyn Stream<Item = JsonValue> + Send + '_>> {
            Box::pin(tokio_stream::iter(std::iter::empty()))
        }

        async fn send_batch(
            &self,
            _requests: Vec<mcpf_core::JsonRpcRequest>,
        ) -> Result<Vec<JsonRpcResponse>, TransportError> {
            Ok(Vec::new())
        }
    }

    fn tool_case(seed: u64) -> TestCase {
        TestCase {
            target: FuzzTarget::Tool { name: "echo".to_string() },
            phase: Phase::Realistic,
            args: serde_json::json!({ "text": "hi" }),
            seed,
            violates_schema: false,
        }
    }

    fn fast_executor() -> Executor {
        Executor::new(ExecutorConfig {
            max_concurrency: 4,
            per_operation_timeout: Duration::from_millis(200),
            retry: RetryPolicy {
                count: 2,
                base_delay: Duration::from_millis(1),
                backoff: 1.0,
                jitter: 0.0,
            },
        })
    }

    #[tokio::test]
    async fn successful_response_classifies_as_success() {
        let transport = ScriptedTransport::new(vec![Step::Success(serde_json::json!({
            "jsonrpc": "2.0", "id": 1, "result": { "ok": true }
        }))]);
        let executor = fast_executor();
        let dispatched = executor.dispatch(tool_case(1), &transport, &SafetyFilter::default()).await;
        assert!(matches!(dispatched.outcome, Outcome::Success { .. }));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn error_envelope_classifies_as_protocol_error() {
        let transport = ScriptedTransport::new(vec![Step::Success(serde_json::json!({
            "jsonrpc": "2.0", "id": 1, "error": { "code": -32602, "message": "bad params" }
        }))]);
        let executor = fast_executor();
        let dispatched = executor.dispatch(tool_case(2), &transport, &SafetyFilter::default()).await;
        match dispatched.outcome {
            Outcome::ProtocolError { code, msg } => {
                assert_eq!(code, -32602);
                assert_eq!(msg, "bad params");
            }
            other => panic!("expected ProtocolError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn retryable_failure_is_retried_until_success() {
        let transport = ScriptedTransport::new(vec![
            Step::Retryable,
            Step::Success(serde_json::json!({ "jsonrpc": "2.0", "id": 1, "result": {} })),
        ]);
        let executor = fast_executor();
        let dispatched = executor.dispatch(tool_case(3), &transport, &SafetyFilter::default()).await;
        assert!(matches!(dispatched.outcome, Outcome::Success { .. }));
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn retries_are_exhausted_into_a_transport_error() {
        let transport = ScriptedTransport::new(vec![Step::Retryable, Step::Retryable, Step::Retryable]);
        let executor = fast_executor();
        let dispatched = executor.dispatch(tool_case(4), &transport, &SafetyFilter::default()).await;
        assert!(matches!(
            dispatched.outcome,
            Outcome::TransportError { kind: TransportErrorKind::Retryable }
        ));
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test]
    async fn non_retryable_failure_stops_after_one_attempt() {
        let transport = ScriptedTransport::new(vec![Step::Connect]);
        let executor = fast_executor();
        let dispatched = executor.dispatch(tool_case(5), &transport, &SafetyFilter::default()).await;
        assert!(matches!(
            dispatched.outcome,
            Outcome::TransportError { kind: TransportErrorKind::Connect }
        ));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn dangerous_args_are_blocked_before_reaching_the_transport() {
        let transport = ScriptedTransport::new(vec![]);
        let executor = fast_executor();
        let mut case = tool_case(6);
        case.args = serde_json::json!({ "cmd": "rm -rf / --no-preserve-root" });
        let dispatched = executor.dispatch(case, &transport, &SafetyFilter::default()).await;
        assert!(matches!(dispatched.outcome, Outcome::Blocked { .. }));
        assert_eq!(transport.call_count(), 0);
        let raw = dispatched.raw_response.expect("mock response");
        assert_eq!(raw["result"]["blocked"], serde_json::json!(true));
    }

    #[tokio::test]
    async fn dispatch_batch_preserves_input_order() {
        let transport = ScriptedTransport::new(vec![
            Step::Success(serde_json::json!({ "jsonrpc": "2.0", "id": 1, "result": { "n": 1 } })),
            Step::Success(serde_json::json!({ "jsonrpc": "2.0", "id": 2, "result": { "n": 2 } })),
            Step::Success(serde_json::json!({ "jsonrpc": "2.0", "id": 3, "result": { "n": 3 } })),
        ]);
        let executor = fast_executor();
        let cases = vec![tool_case(10), tool_case(11), tool_case(12)];
        let results = executor.dispatch_batch(cases, &transport, &SafetyFilter::default()).await;
        assert_eq!(results.len(), 3);
        for (index, dispatched) in results.iter().enumerate() {
            assert_eq!(dispatched.case.seed, 10 + index as u64);
        }
    }

    #[tokio::test]
    async fn cancel_token_short_circuits_pending_dispatch() {
        let transport = ScriptedTransport::new(vec![Step::Success(serde_json::json!({ "jsonrpc": "2.0", "id": 1, "result": {} }))]);
        let executor = fast_executor();
        executor.cancel_token().cancel();
        let dispatched = executor.dispatch(tool_case(7), &transport, &SafetyFilter::default()).await;
        assert!(matches!(
            dispatched.outcome,
            Outcome::TransportError { kind: TransportErrorKind::Cancelled }
        ));
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn tool_name_helper_still_works_with_synthesized_cases() {
        let case = tool_case(1);
        assert_eq!(case.tool_name(), Some("echo"));
    }
}
