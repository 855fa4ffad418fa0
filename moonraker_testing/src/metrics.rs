//! Metric snapshot queries for tests.
//!
//! Install a [`DebuggingRecorder`](metrics_util::debugging::DebuggingRecorder)
//! with `metrics::set_default_local_recorder` on a current-thread runtime so
//! that every task spawned by the session records into it.

use metrics_util::{
    MetricKind,
    debugging::{DebugValue, Snapshotter},
};

/// Sum of every counter named `name` whose labels include `label`, if given.
#[must_use]
pub fn counter_value(snapshotter: &Snapshotter, name: &str, label: Option<(&str, &str)>) -> u64 {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter(|(key, _, _, _)| {
            key.kind() == MetricKind::Counter
                && key.key().name() == name
                && label.is_none_or(|(k, v)| {
                    key.key().labels().any(|l| l.key() == k && l.value() == v)
                })
        })
        .filter_map(|(_, _, _, value)| match value {
            DebugValue::Counter(n) => Some(n),
            _ => None,
        })
        .sum()
}

/// Current value of the gauge named `name`, if it was ever touched.
#[must_use]
pub fn gauge_value(snapshotter: &Snapshotter, name: &str) -> Option<f64> {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .find_map(|(key, _, _, value)| match value {
            DebugValue::Gauge(g) if key.key().name() == name => Some(g.0),
            _ => None,
        })
}
