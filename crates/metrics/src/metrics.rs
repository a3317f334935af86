use prometheus::{Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry};

use crate::MetricsError;

/// Prometheus metric families for the swap pipeline, registered on one registry
#[derive(Clone)]
pub struct SwapMetrics {
    // ═══════════════════════════════════════════════════════════════════════════
    // PLANNING
    // ═══════════════════════════════════════════════════════════════════════════
    /// Plans by routing and result (`ok` / `rejected`)
    pub plans: IntCounterVec,

    /// Planned steps by kind
    pub planned_steps: IntCounterVec,

    // ═══════════════════════════════════════════════════════════════════════════
    // EXECUTION
    // ═══════════════════════════════════════════════════════════════════════════
    /// Executed steps by kind and final state
    pub steps: IntCounterVec,

    /// Classified failures by step kind and failure kind
    pub failures: IntCounterVec,

    /// Attempts by outcome (`completed` / `failed` / `abandoned`)
    pub outcomes: IntCounterVec,

    /// Attempts currently executing
    pub active_attempts: IntGauge,

    /// Wall time of a whole attempt, including time spent waiting on the wallet
    pub attempt_duration: Histogram,

    // ═══════════════════════════════════════════════════════════════════════════
    // LOGGING
    // ═══════════════════════════════════════════════════════════════════════════
    /// Warn/error log events carrying a `failure_kind` field
    pub failure_events: IntCounterVec,
}

impl SwapMetrics {
    pub fn register(registry: &Registry, namespace: &str) -> Result<Self, MetricsError> {
        let opts = |name: &str, help: &str| Opts::new(name, help).namespace(namespace);

        let metrics = Self {
            plans: IntCounterVec::new(
                opts("plans_total", "Total plans by routing and result"),
                &["routing", "result"],
            )?,
            planned_steps: IntCounterVec::new(
                opts("planned_steps_total", "Total planned steps by kind"),
                &["step"],
            )?,
            steps: IntCounterVec::new(
                opts("steps_total", "Total executed steps by kind and final state"),
                &["step", "state"],
            )?,
            failures: IntCounterVec::new(
                opts("failures_total", "Total classified failures"),
                &["step", "failure_kind"],
            )?,
            outcomes: IntCounterVec::new(
                opts("attempts_total", "Total execution attempts by outcome"),
                &["outcome"],
            )?,
            active_attempts: IntGauge::with_opts(opts(
                "attempts_active",
                "Execution attempts currently in flight",
            ))?,
            attempt_duration: Histogram::with_opts(
                HistogramOpts::new(
                    "attempt_duration_seconds",
                    "Execution attempt duration in seconds",
                )
                .namespace(namespace)
                .buckets(vec![0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 180.0, 600.0]),
            )?,
            failure_events: IntCounterVec::new(
                opts(
                    "failure_log_events_total",
                    "Warn and error log events by failure kind",
                ),
                &["failure_kind"],
            )?,
        };

        registry.register(Box::new(metrics.plans.clone()))?;
        registry.register(Box::new(metrics.planned_steps.clone()))?;
        registry.register(Box::new(metrics.steps.clone()))?;
        registry.register(Box::new(metrics.failures.clone()))?;
        registry.register(Box::new(metrics.outcomes.clone()))?;
        registry.register(Box::new(metrics.active_attempts.clone()))?;
        registry.register(Box::new(metrics.attempt_duration.clone()))?;
        registry.register(Box::new(metrics.failure_events.clone()))?;

        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_registration_fails() {
        let registry = Registry::new();
        assert!(SwapMetrics::register(&registry, "swapflow").is_ok());
        assert!(matches!(
            SwapMetrics::register(&registry, "swapflow"),
            Err(MetricsError::Registry(_))
        ));
        // A different namespace is a different family
        assert!(SwapMetrics::register(&registry, "other").is_ok());
    }
}
