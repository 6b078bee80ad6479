//! Observability: runtime scan counters and sink abstractions.
//!
//! Logging goes through `tracing` at the call sites; this module owns the
//! counters side.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport, MAX_TRACKED_SCANS, ScanCounters};
pub use sink::{MetricsEvent, MetricsSink, metrics_report, metrics_reset_all};
