// SPDX-License-Identifier: MIT OR Apache-2.0
//! Results of a fuzzing session: per-case records and the terminal summary.

use crate::duration::duration_millis;
use crate::outcome::{Finding, Outcome};
use crate::testcase::TestCase;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// The result of dispatching one [`TestCase`], including any invariant
/// findings observed along the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// The case that was dispatched.
    pub case: TestCase,
    /// How it concluded.
    pub outcome: Outcome,
    /// Wall-clock time spent dispatching this case.
    #[serde(serialize_with = "duration_millis")]
    pub duration: Duration,
    /// Structural/schema findings observed on the response, if any.
    #[serde(default)]
    pub invariant_findings: Vec<Finding>,
}

impl RunRecord {
    /// Construct a run record with no findings.
    pub fn new(case: TestCase, outcome: Outcome, duration: Duration) -> Self {
        Self {
            case,
            outcome,
            duration,
            invariant_findings: Vec::new(),
        }
    }

    /// Attach invariant findings to this record.
    pub fn with_findings(mut self, findings: Vec<Finding>) -> Self {
        self.invariant_findings = findings;
        self
    }
}

/// Per-target tally of outcomes, keyed by tool name or protocol method.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetStats {
    /// Number of cases dispatched.
    pub total: u64,
    /// Number that succeeded.
    pub succeeded: u64,
    /// Number that were blocked by the safety filter.
    pub blocked: u64,
    /// Number that timed out.
    pub timed_out: u64,
    /// Number with a protocol-level error response.
    pub protocol_errors: u64,
    /// Number with an un-retried transport error.
    pub transport_errors: u64,
    /// Number of invariant findings observed across all cases.
    pub invariant_findings: u64,
}

impl TargetStats {
    /// Fold one [`RunRecord`] into this tally.
    pub fn record(&mut self, record: &RunRecord) {
        self.total += 1;
        self.invariant_findings += record.invariant_findings.len() as u64;
        match &record.outcome {
            Outcome::Success { .. } => self.succeeded += 1,
            Outcome::Blocked { .. } => self.blocked += 1,
            Outcome::Timeout => self.timed_out += 1,
            Outcome::ProtocolError { .. } => self.protocol_errors += 1,
            Outcome::TransportError { .. } => self.transport_errors += 1,
            Outcome::InvariantViolation { .. } => {}
        }
    }
}

/// Terminal summary emitted by the Session Driver once all cases have run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Per-tool outcome tallies, keyed by tool name.
    pub tool_stats: BTreeMap<String, TargetStats>,
    /// Per-method outcome tallies, keyed by protocol method name.
    pub protocol_stats: BTreeMap<String, TargetStats>,
    /// Total cases blocked by the safety filter across the session.
    pub blocked_count: u64,
    /// Total invariant findings across the session.
    pub invariant_violations: u64,
    /// Total wall-clock session duration.
    #[serde(serialize_with = "duration_millis")]
    pub duration: Duration,
}

impl SessionSummary {
    /// Fold one [`RunRecord`] into the appropriate per-target tally and the
    /// session-wide totals.
    pub fn record(&mut self, record: &RunRecord) {
        self.invariant_violations += record.invariant_findings.len() as u64;
        if matches!(record.outcome, Outcome::Blocked { .. }) {
            self.blocked_count += 1;
        }
        let stats = match &record.case.target {
            crate::testcase::FuzzTarget::Tool { name } => self.tool_stats.entry(name.clone()),
            crate::testcase::FuzzTarget::ProtocolMethod { method } => {
                self.protocol_stats.entry(method.clone())
            }
        };
        stats.or_default().record(record);
    }

    /// Exit status per §6: 1 if any invariant violation or un-retried
    /// transport error was observed, 0 otherwise.
    pub fn exit_status(&self) -> i32 {
        let any_failure = self
            .tool_stats
            .values()
            .chain(self.protocol_stats.values())
            .any(|s| s.transport_errors > 0)
            || self.invariant_violations > 0;
        if any_failure { 1 } else { 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testcase::{FuzzTarget, Phase};

    fn case(tool: &str) -> TestCase {
        TestCase {
            target: FuzzTarget::Tool { name: tool.into() },
            phase: Phase::Realistic,
            args: serde_json::json!({}),
            seed: 1,
            violates_schema: false,
        }
    }

    #[test]
    fn summary_tallies_success_and_blocked() {
        let mut summary = SessionSummary::default();
        summary.record(&RunRecord::new(
            case("echo"),
            Outcome::Success {
                response: serde_json::json!({}),
            },
            Duration::from_millis(5),
        ));
        summary.record(&RunRecord::new(
            case("echo"),
            Outcome::Blocked {
                reason: "command pattern".into(),
            },
            Duration::from_millis(1),
        ));

        let stats = &summary.tool_stats["echo"];
        assert_eq!(stats.total, 2);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.blocked, 1);
        assert_eq!(summary.blocked_count, 1);
        assert_eq!(summary.exit_status(), 0);
    }

    #[test]
    fn transport_error_sets_failing_exit_status() {
        let mut summary = SessionSummary::default();
        summary.record(&RunRecord::new(
            case("echo"),
            Outcome::TransportError {
                kind: crate::outcome::TransportErrorKind::Disconnected,
            },
            Duration::from_millis(1),
        ));
        assert_eq!(summary.exit_status(), 1);
    }
}
