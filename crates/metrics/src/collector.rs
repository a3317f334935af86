use std::time::{Duration, Instant};

use prometheus::{Encoder, Registry, TextEncoder};
use swapflow_executor::{ExecutionOutcome, StepState};
use swapflow_types::{Routing, StepKind};

use crate::metrics::SwapMetrics;

pub const DEFAULT_NAMESPACE: &str = "swapflow";

/// Metrics collector for the swap pipeline
pub struct MetricsCollector {
    registry: Registry,
    metrics: SwapMetrics,
}

impl MetricsCollector {
    /// Create a collector with its own registry and the default namespace
    pub fn new() -> Result<Self, MetricsError> {
        Self::with_namespace(DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(namespace: &str) -> Result<Self, MetricsError> {
        Self::with_registry(Registry::new(), namespace)
    }

    /// Register on an existing registry, e.g. one shared with other components
    pub fn with_registry(registry: Registry, namespace: &str) -> Result<Self, MetricsError> {
        let metrics = SwapMetrics::register(&registry, namespace)?;
        Ok(Self { registry, metrics })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PLANNING
    // ═══════════════════════════════════════════════════════════════════════════

    /// Record a successful plan
    pub fn record_plan(&self, routing: Routing, kinds: &[StepKind]) {
        self.metrics
            .plans
            .with_label_values(&[routing.as_str(), "ok"])
            .inc();

        for kind in kinds {
            self.metrics
                .planned_steps
                .with_label_values(&[kind.as_str()])
                .inc();
        }
    }

    /// Record a context the planner refused
    pub fn record_plan_rejected(&self, routing: Routing) {
        self.metrics
            .plans
            .with_label_values(&[routing.as_str(), "rejected"])
            .inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EXECUTION
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_attempt_started(&self) {
        self.metrics.active_attempts.inc();
    }

    /// Start timing an attempt. The returned timer records the outcome on
    /// [`AttemptTimer::finish`], or counts the attempt as abandoned if dropped first.
    pub fn start_attempt(&self) -> AttemptTimer<'_> {
        self.record_attempt_started();
        AttemptTimer {
            collector: self,
            started: Instant::now(),
            finished: false,
        }
    }

    /// Record an attempt whose future was dropped before producing an outcome
    pub fn record_attempt_abandoned(&self, duration: Duration) {
        self.metrics.active_attempts.dec();
        self.metrics
            .attempt_duration
            .observe(duration.as_secs_f64());
        self.metrics.outcomes.with_label_values(&["abandoned"]).inc();
    }

    /// Record a finished attempt. Pair with [`record_attempt_started`].
    ///
    /// [`record_attempt_started`]: MetricsCollector::record_attempt_started
    pub fn record_outcome(&self, outcome: &ExecutionOutcome, duration: Duration) {
        self.metrics.active_attempts.dec();
        self.metrics
            .attempt_duration
            .observe(duration.as_secs_f64());

        // Steps that never left Pending were not attempted
        for record in outcome.steps() {
            if record.state != StepState::Pending {
                self.metrics
                    .steps
                    .with_label_values(&[record.kind.as_str(), record.state.as_str()])
                    .inc();
            }
        }

        match outcome {
            ExecutionOutcome::Completed { .. } => {
                self.metrics.outcomes.with_label_values(&["completed"]).inc();
            }
            ExecutionOutcome::Failed {
                step_kind, failure, ..
            } => {
                self.metrics.outcomes.with_label_values(&["failed"]).inc();
                self.metrics
                    .failures
                    .with_label_values(&[step_kind.as_str(), failure.kind.as_str()])
                    .inc();
            }
        }
    }

    /// Count a warn/error log event that carried a `failure_kind` field
    pub fn record_failure_event(&self, failure_kind: &str) {
        self.metrics
            .failure_events
            .with_label_values(&[failure_kind])
            .inc();
    }

    pub fn metrics(&self) -> &SwapMetrics {
        &self.metrics
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EXPORT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Export metrics in Prometheus text format
    pub fn export_metrics(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::EncodingError(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::EncodingError(e.to_string()))
    }
}

/// In-flight attempt registered with a [`MetricsCollector`]
pub struct AttemptTimer<'a> {
    collector: &'a MetricsCollector,
    started: Instant,
    finished: bool,
}

impl AttemptTimer<'_> {
    pub fn finish(mut self, outcome: &ExecutionOutcome) {
        self.finished = true;
        self.collector
            .record_outcome(outcome, self.started.elapsed());
    }
}

impl Drop for AttemptTimer<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.collector
                .record_attempt_abandoned(self.started.elapsed());
        }
    }
}

/// Metrics error types
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("encoding error: {0}")]
    EncodingError(String),
    #[error("registry error: {0}")]
    Registry(#[from] prometheus::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use swapflow_executor::{
        classify, AttemptId, StepError, StepRecord, StepResult, TerminalResult,
    };
    use swapflow_types::{CapabilityError, B256};

    fn record(index: usize, kind: StepKind, state: StepState) -> StepRecord {
        StepRecord {
            index,
            kind,
            state,
            nonce: None,
            result: None,
        }
    }

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().unwrap();
        assert!(collector.export_metrics().is_ok());
    }

    #[test]
    fn test_record_plan_metrics() {
        let collector = MetricsCollector::new().unwrap();

        collector.record_plan(Routing::DirectSwap, &[StepKind::Approve, StepKind::Swap]);
        collector.record_plan_rejected(Routing::OffChainOrder);

        let m = collector.metrics();
        assert_eq!(
            m.plans.with_label_values(&["direct_swap", "ok"]).get(),
            1
        );
        assert_eq!(
            m.plans
                .with_label_values(&["off_chain_order", "rejected"])
                .get(),
            1
        );
        assert_eq!(m.planned_steps.with_label_values(&["approve"]).get(), 1);

        let text = collector.export_metrics().unwrap();
        assert!(text.contains("swapflow_plans_total"));
        assert!(text.contains("swapflow_planned_steps_total"));
    }

    #[test]
    fn test_record_completed_outcome() {
        let collector = MetricsCollector::new().unwrap();
        collector.record_attempt_started();

        let mut swap = record(0, StepKind::Swap, StepState::Confirmed);
        swap.result = Some(StepResult::Transaction {
            hash: B256::ZERO,
            nonce: 0,
            block_number: None,
        });
        let outcome = ExecutionOutcome::Completed {
            attempt_id: AttemptId::new(),
            result: TerminalResult::Transaction { hash: B256::ZERO },
            steps: vec![swap],
        };
        collector.record_outcome(&outcome, Duration::from_secs(3));

        let m = collector.metrics();
        assert_eq!(m.active_attempts.get(), 0);
        assert_eq!(m.outcomes.with_label_values(&["completed"]).get(), 1);
        assert_eq!(
            m.steps.with_label_values(&["swap", "confirmed"]).get(),
            1
        );
        assert_eq!(m.attempt_duration.get_sample_count(), 1);
    }

    #[test]
    fn test_record_failed_outcome_skips_unattempted_steps() {
        let collector = MetricsCollector::new().unwrap();
        collector.record_attempt_started();

        let error = StepError::Capability(CapabilityError::UserRejected);
        let outcome = ExecutionOutcome::Failed {
            attempt_id: AttemptId::new(),
            step_index: 0,
            step_kind: StepKind::Approve,
            failure: classify(StepKind::Approve, &error),
            steps: vec![
                record(0, StepKind::Approve, StepState::Failed),
                record(1, StepKind::Swap, StepState::Pending),
            ],
        };
        collector.record_outcome(&outcome, Duration::from_millis(800));

        let m = collector.metrics();
        assert_eq!(m.outcomes.with_label_values(&["failed"]).get(), 1);
        assert_eq!(
            m.failures
                .with_label_values(&["approve", "user_cancelled"])
                .get(),
            1
        );
        assert_eq!(m.steps.with_label_values(&["approve", "failed"]).get(), 1);
        assert_eq!(m.steps.with_label_values(&["swap", "pending"]).get(), 0);
    }

    #[test]
    fn test_dropped_timer_releases_active_gauge() {
        let collector = MetricsCollector::new().unwrap();

        let timer = collector.start_attempt();
        assert_eq!(collector.metrics().active_attempts.get(), 1);
        drop(timer);

        let m = collector.metrics();
        assert_eq!(m.active_attempts.get(), 0);
        assert_eq!(m.outcomes.with_label_values(&["abandoned"]).get(), 1);
        assert_eq!(m.outcomes.with_label_values(&["failed"]).get(), 0);
    }

    #[test]
    fn test_finished_timer_records_outcome_once() {
        let collector = MetricsCollector::new().unwrap();
        let outcome = ExecutionOutcome::Completed {
            attempt_id: AttemptId::new(),
            result: TerminalResult::Transaction { hash: B256::ZERO },
            steps: Vec::new(),
        };

        collector.start_attempt().finish(&outcome);

        let m = collector.metrics();
        assert_eq!(m.active_attempts.get(), 0);
        assert_eq!(m.outcomes.with_label_values(&["completed"]).get(), 1);
        assert_eq!(m.outcomes.with_label_values(&["abandoned"]).get(), 0);
    }

    #[test]
    fn test_custom_namespace() {
        let collector = MetricsCollector::with_namespace("wallet").unwrap();
        collector.record_failure_event("deadline_expired");

        let text = collector.export_metrics().unwrap();
        assert!(text.contains("wallet_failure_log_events_total"));
        assert!(!text.contains("swapflow_"));
    }
}
