//! Metrics sink boundary.
//!
//! Scan logic never touches `obs::metrics` directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
use crate::obs::metrics;

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent<'a> {
    IteratorBuilt { scan_id: &'a str, resumed: bool },
    RowScanned { scan_id: &'a str },
    ScanFinished { scan_id: &'a str },
    CheckpointSaved { scan_id: &'a str, auto: bool },
    CheckpointSaveFailed { scan_id: &'a str, auto: bool },
    Reset { scan_id: &'a str },
}

///
/// MetricsSink
///

pub trait MetricsSink: Send + Sync {
    fn record(&self, event: MetricsEvent<'_>);
}

/// GlobalMetricsSink
/// Default process-wide sink that writes into global metrics state.
/// Used whenever a scanner has no sink of its own.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::IteratorBuilt { resumed, .. } => {
                m.ops.iterators_built = m.ops.iterators_built.saturating_add(1);
                if resumed {
                    m.ops.iterators_resumed = m.ops.iterators_resumed.saturating_add(1);
                }
            }

            MetricsEvent::RowScanned { scan_id } => {
                m.ops.rows_scanned = m.ops.rows_scanned.saturating_add(1);
                if let Some(entry) = m.scan_mut(scan_id) {
                    entry.rows_scanned = entry.rows_scanned.saturating_add(1);
                }
            }

            MetricsEvent::ScanFinished { .. } => {
                m.ops.scans_finished = m.ops.scans_finished.saturating_add(1);
            }

            MetricsEvent::CheckpointSaved { scan_id, auto } => {
                m.ops.checkpoints_saved = m.ops.checkpoints_saved.saturating_add(1);
                if auto {
                    m.ops.auto_saves = m.ops.auto_saves.saturating_add(1);
                }
                if let Some(entry) = m.scan_mut(scan_id) {
                    entry.checkpoints_saved = entry.checkpoints_saved.saturating_add(1);
                }
            }

            MetricsEvent::CheckpointSaveFailed { scan_id, .. } => {
                m.ops.checkpoint_save_failures = m.ops.checkpoint_save_failures.saturating_add(1);
                if let Some(entry) = m.scan_mut(scan_id) {
                    entry.checkpoint_save_failures =
                        entry.checkpoint_save_failures.saturating_add(1);
                }
            }

            MetricsEvent::Reset { .. } => {
                m.ops.resets = m.ops.resets.saturating_add(1);
            }
        });
    }
}

pub(crate) static GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

/// Snapshot the current global metrics state.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all global metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters(scan_id: &str) -> Option<metrics::ScanCounters> {
        metrics_report()
            .scans
            .into_iter()
            .find(|(id, _)| id == scan_id)
            .map(|(_, counters)| counters)
    }

    #[test]
    fn global_sink_counts_per_scan() {
        // unique id: other tests record into the same global state
        let scan_id = "obs_global_sink_counts_per_scan";

        GLOBAL_METRICS_SINK.record(MetricsEvent::RowScanned { scan_id });
        GLOBAL_METRICS_SINK.record(MetricsEvent::RowScanned { scan_id });
        GLOBAL_METRICS_SINK.record(MetricsEvent::CheckpointSaved {
            scan_id,
            auto: true,
        });
        GLOBAL_METRICS_SINK.record(MetricsEvent::CheckpointSaveFailed {
            scan_id,
            auto: false,
        });

        let counters = counters(scan_id).expect("scan counters");
        assert_eq!(counters.rows_scanned, 2);
        assert_eq!(counters.checkpoints_saved, 1);
        assert_eq!(counters.checkpoint_save_failures, 1);

        let ops = metrics_report().ops;
        assert!(ops.rows_scanned >= 2);
        assert!(ops.auto_saves >= 1);
    }
}
