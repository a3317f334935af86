//! Metrics and logging for the swapflow pipeline
//!
//! # Features
//!
//! - Prometheus counters for plans, executed steps, classified failures and outcomes
//! - Tracing subscriber setup with env filter and JSON or text output
//! - A tracing layer that counts logged failures by `failure_kind`
//!
//! # Example
//!
//! ```no_run
//! use swapflow_metrics::{init_tracing, MetricsCollector};
//! use std::sync::Arc;
//!
//! let collector = Arc::new(MetricsCollector::new().unwrap());
//! init_tracing("info", true, Some(collector.clone())).unwrap();
//!
//! println!("{}", collector.export_metrics().unwrap());
//! ```

pub mod collector;
pub mod metrics;
pub mod tracing;

pub use collector::{AttemptTimer, MetricsCollector, MetricsError, DEFAULT_NAMESPACE};
pub use metrics::SwapMetrics;
pub use self::tracing::{init_tracing, MetricsLayer, TracingError};
