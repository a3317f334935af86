//! Transaction step planning and execution for non-custodial swap flows.
//!
//! A quoting service hands over a [`SwapExecutionContext`]; [`plan`] turns it into
//! [`OrderedSteps`] and the [`ExecutionCoordinator`] walks those steps against the
//! wallet's [`Signer`] and the network's [`Submitter`]. [`SwapPipeline`] wires both
//! together with configuration and metrics.

use std::sync::Arc;
use tracing::info;

pub use swapflow_config::{self as config, AppConfig, ConfigLoader, ExecutorMode};
pub use swapflow_executor::{
    classify, AttemptId, CancellationToken, ClassifiedFailure, Clock, CoordinatorConfig,
    ExecutionCoordinator, ExecutionMode, ExecutionOutcome, FailureKind, ManualClock,
    MessageCategory, NonceRegistry, OrderId, PendingNonceSource, Retryability, SignedOrder,
    Signer, StepError, StepRecord, StepResult, StepState, Submitter, SystemClock,
    TerminalResult,
};
pub use swapflow_metrics::{
    init_tracing, AttemptTimer, MetricsCollector, MetricsError, TracingError,
};
pub use swapflow_planner::{plan, OrderedSteps, PlanError};
pub use swapflow_types as types;
pub use swapflow_types::{Routing, Step, StepKind, SwapExecutionContext};

/// Coordinator settings from the `[executor]` section
pub fn coordinator_config(config: &AppConfig) -> CoordinatorConfig {
    let mode = match config.executor.mode {
        ExecutorMode::Sequential => ExecutionMode::Sequential,
        ExecutorMode::Pipelined => ExecutionMode::Pipelined,
    };

    CoordinatorConfig::default()
        .with_mode(mode)
        .with_deadline_buffer(config.executor.deadline_buffer_secs)
}

/// Coordinator settings for one chain: the `[executor]` section plus that chain's
/// inclusion timeout when the chain is configured
pub fn coordinator_config_for_chain(config: &AppConfig, chain_id: u64) -> CoordinatorConfig {
    let coordinator = coordinator_config(config);
    match config.chain(chain_id) {
        Some(chain) => coordinator.with_inclusion_timeout(chain.inclusion_timeout()),
        None => coordinator,
    }
}

/// Collector for the `[metrics]` section, or `None` when metrics are disabled
pub fn metrics_collector(
    config: &AppConfig,
) -> Result<Option<Arc<MetricsCollector>>, MetricsError> {
    if !config.metrics.enabled {
        return Ok(None);
    }
    MetricsCollector::with_namespace(&config.metrics.namespace).map(|c| Some(Arc::new(c)))
}

/// Install the global tracing subscriber from the `[logging]` section
pub fn init_logging(
    config: &AppConfig,
    collector: Option<Arc<MetricsCollector>>,
) -> Result<(), TracingError> {
    init_tracing(&config.logging.level, config.logging.json, collector)
}

/// Plan-then-execute entry point
pub struct SwapPipeline {
    coordinator: ExecutionCoordinator,
    metrics: Option<Arc<MetricsCollector>>,
}

impl SwapPipeline {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            coordinator: ExecutionCoordinator::new(config),
            metrics: None,
        }
    }

    /// Pipeline for `config` without a chain-specific inclusion timeout
    pub fn from_config(config: &AppConfig) -> Result<Self, MetricsError> {
        Self::configured(coordinator_config(config), config)
    }

    /// Pipeline for `config` executing on `chain_id`
    pub fn for_chain(config: &AppConfig, chain_id: u64) -> Result<Self, MetricsError> {
        Self::configured(coordinator_config_for_chain(config, chain_id), config)
    }

    fn configured(
        coordinator: CoordinatorConfig,
        config: &AppConfig,
    ) -> Result<Self, MetricsError> {
        let pipeline = Self::new(coordinator);
        Ok(match metrics_collector(config)? {
            Some(metrics) => pipeline.with_metrics(metrics),
            None => pipeline,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.coordinator = self.coordinator.with_clock(clock);
        self
    }

    pub fn coordinator(&self) -> &ExecutionCoordinator {
        &self.coordinator
    }

    pub fn metrics(&self) -> Option<&Arc<MetricsCollector>> {
        self.metrics.as_ref()
    }

    /// Plan a freshly quoted context
    pub fn plan(&self, context: &SwapExecutionContext) -> Result<OrderedSteps, PlanError> {
        let planned = plan(context);

        if let Some(metrics) = &self.metrics {
            match &planned {
                Ok(steps) => metrics.record_plan(context.routing, &steps.kinds()),
                Err(_) => metrics.record_plan_rejected(context.routing),
            }
        }

        planned
    }

    /// Execute planned steps once. Retrying means planning again from a new context.
    pub async fn execute<S, B>(
        &self,
        steps: &OrderedSteps,
        signer: &S,
        submitter: &B,
        cancel: &CancellationToken,
    ) -> ExecutionOutcome
    where
        S: Signer + ?Sized,
        B: Submitter + ?Sized,
    {
        // Dropping this future mid-attempt still settles the active gauge
        let timer = self.metrics.as_deref().map(MetricsCollector::start_attempt);

        let outcome = self
            .coordinator
            .execute(steps, signer, submitter, cancel)
            .await;

        if let Some(timer) = timer {
            timer.finish(&outcome);
        }

        outcome
    }

    /// Plan and execute in one call
    pub async fn run<S, B>(
        &self,
        context: &SwapExecutionContext,
        signer: &S,
        submitter: &B,
        cancel: &CancellationToken,
    ) -> Result<ExecutionOutcome, PlanError>
    where
        S: Signer + ?Sized,
        B: Submitter + ?Sized,
    {
        let steps = self.plan(context)?;
        info!(routing = %context.routing, steps = ?steps.kinds(), "Planned swap");

        Ok(self.execute(&steps, signer, submitter, cancel).await)
    }
}

impl Default for SwapPipeline {
    fn default() -> Self {
        Self::new(CoordinatorConfig::default())
    }
}
