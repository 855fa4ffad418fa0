//! Metric helpers for `moonraker_rpc`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. With the `metrics` feature
//! disabled every helper compiles to a no-op.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the counter tracking completed calls, labelled by outcome.
pub const CALLS_TOTAL: &str = "moonraker_rpc_calls_total";
/// Name of the counter tracking frames, labelled by direction.
pub const FRAMES_TOTAL: &str = "moonraker_rpc_frames_total";
/// Name of the counter tracking received notifications.
pub const NOTIFICATIONS_TOTAL: &str = "moonraker_rpc_notifications_total";
/// Name of the counter tracking errors, labelled by kind.
pub const ERRORS_TOTAL: &str = "moonraker_rpc_errors_total";
/// Name of the gauge tracking calls awaiting a response.
pub const PENDING_CALLS: &str = "moonraker_rpc_pending_calls";

/// Direction of frame processing.
#[derive(Clone, Copy, Debug)]
pub enum Direction {
    /// Frames read from the server.
    Inbound,
    /// Frames written to the server.
    Outbound,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Record a frame for the given direction.
pub fn inc_frames(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_TOTAL, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record a completed call; `outcome` is `"ok"` or an error kind.
pub fn inc_calls(outcome: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(CALLS_TOTAL, "outcome" => outcome).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = outcome;
}

/// Record a received notification.
pub fn inc_notifications() {
    #[cfg(feature = "metrics")]
    counter!(NOTIFICATIONS_TOTAL).increment(1);
}

/// Record an error occurrence of the given kind.
pub fn inc_errors(kind: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(ERRORS_TOTAL, "kind" => kind).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}

/// Increment the pending calls gauge.
pub fn inc_pending() {
    #[cfg(feature = "metrics")]
    gauge!(PENDING_CALLS).increment(1.0);
}

/// Decrement the pending calls gauge.
pub fn dec_pending() {
    #[cfg(feature = "metrics")]
    gauge!(PENDING_CALLS).decrement(1.0);
}
