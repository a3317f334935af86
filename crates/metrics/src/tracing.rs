use std::sync::Arc;
use ::tracing::{field::Visit, Event, Level, Subscriber};
use tracing_subscriber::{
    fmt,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::collector::MetricsCollector;

const DEFAULT_FILTER: &str = "info,swapflow=debug";

/// Install the global subscriber: env filter, JSON or human-readable output, and
/// optionally a [`MetricsLayer`].
///
/// `RUST_LOG` takes precedence over `filter` when set.
pub fn init_tracing(
    filter: &str,
    json: bool,
    collector: Option<Arc<MetricsCollector>>,
) -> Result<(), TracingError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(env_filter) => env_filter,
        Err(_) if filter.is_empty() => EnvFilter::new(DEFAULT_FILTER),
        Err(_) => EnvFilter::try_new(filter)
            .map_err(|e| TracingError::InvalidFilter(e.to_string()))?,
    };

    let json_layer = json.then(|| {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .json()
    });
    let text_layer = (!json).then(|| fmt::layer().with_target(true));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(collector.map(MetricsLayer::new))
        .try_init()
        .map_err(|e| TracingError::InitError(e.to_string()))?;

    Ok(())
}

/// Tracing layer that counts warn/error events carrying a `failure_kind` field
pub struct MetricsLayer {
    collector: Arc<MetricsCollector>,
}

impl MetricsLayer {
    pub fn new(collector: Arc<MetricsCollector>) -> Self {
        Self { collector }
    }
}

impl<S> Layer<S> for MetricsLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() > Level::WARN {
            return;
        }

        let mut visitor = FailureKindVisitor::default();
        event.record(&mut visitor);

        if let Some(failure_kind) = visitor.failure_kind {
            self.collector.record_failure_event(&failure_kind);
        }
    }
}

#[derive(Default)]
struct FailureKindVisitor {
    failure_kind: Option<String>,
}

impl Visit for FailureKindVisitor {
    fn record_debug(&mut self, field: &::tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "failure_kind" {
            self.failure_kind = Some(format!("{value:?}").trim_matches('"').to_string());
        }
    }

    fn record_str(&mut self, field: &::tracing::field::Field, value: &str) {
        if field.name() == "failure_kind" {
            self.failure_kind = Some(value.to_string());
        }
    }
}

/// Tracing error types
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("tracing initialization error: {0}")]
    InitError(String),

    #[error("invalid log filter: {0}")]
    InvalidFilter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_layer(collector: &Arc<MetricsCollector>, f: impl FnOnce()) {
        let subscriber =
            tracing_subscriber::registry().with(MetricsLayer::new(collector.clone()));
        ::tracing::subscriber::with_default(subscriber, f);
    }

    #[test]
    fn test_counts_warn_events_with_failure_kind() {
        let collector = Arc::new(MetricsCollector::new().unwrap());

        with_layer(&collector, || {
            ::tracing::warn!(failure_kind = "deadline_expired", "Step failed");
            ::tracing::error!(failure_kind = "unknown", "Step failed");
            ::tracing::warn!(failure_kind = "deadline_expired", "Step failed");
        });

        let events = &collector.metrics().failure_events;
        assert_eq!(events.with_label_values(&["deadline_expired"]).get(), 2);
        assert_eq!(events.with_label_values(&["unknown"]).get(), 1);
    }

    #[test]
    fn test_ignores_info_and_unlabelled_events() {
        let collector = Arc::new(MetricsCollector::new().unwrap());

        with_layer(&collector, || {
            ::tracing::info!(failure_kind = "user_cancelled", "not a failure");
            ::tracing::warn!("no failure kind");
        });

        assert_eq!(
            collector
                .metrics()
                .failure_events
                .with_label_values(&["user_cancelled"])
                .get(),
            0
        );
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        // RUST_LOG must be unset for the filter argument to be consulted
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let result = init_tracing("info,swapflow=loud", false, None);
        assert!(matches!(result, Err(TracingError::InvalidFilter(_))));
    }
}
