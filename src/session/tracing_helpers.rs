//! Span and timing helpers for session operations.
//!
//! Keeps level selection and timing out of the call path.

use std::time::Instant;

use tracing::{Level, Span};

use super::tracing_config::TracingConfig;

/// Create a tracing span at a dynamically selected level.
///
/// Each branch calls the corresponding `tracing::<level>_span!` macro so the
/// span metadata stays static while the level is chosen at runtime.
macro_rules! dynamic_span {
    ($level:expr, $name:expr $(, $($field:tt)*)?) => {
        match $level {
            Level::ERROR => tracing::error_span!($name $(, $($field)*)?),
            Level::WARN  => tracing::warn_span!($name $(, $($field)*)?),
            Level::INFO  => tracing::info_span!($name $(, $($field)*)?),
            Level::DEBUG => tracing::debug_span!($name $(, $($field)*)?),
            Level::TRACE => tracing::trace_span!($name $(, $($field)*)?),
        }
    };
}

/// Create a span for opening a session; `peer` is the WebSocket URL.
#[expect(
    clippy::cognitive_complexity,
    reason = "complexity from dynamic_span! macro expansion"
)]
pub(crate) fn connect_span(config: &TracingConfig, url: &str) -> Span {
    dynamic_span!(config.connect_level, "session.connect", peer = url)
}

/// Create a span for one RPC call.
///
/// `request_id` is recorded once the call is registered and `result` once it
/// completes, both via [`Span::record`].
#[expect(
    clippy::cognitive_complexity,
    reason = "complexity from dynamic_span! macro expansion"
)]
pub(crate) fn call_span(config: &TracingConfig, method: &str) -> Span {
    dynamic_span!(
        config.call_level,
        "session.call",
        method = method,
        request_id = tracing::field::Empty,
        result = tracing::field::Empty
    )
}

/// Create a span covering session teardown.
#[expect(
    clippy::cognitive_complexity,
    reason = "complexity from dynamic_span! macro expansion"
)]
pub(crate) fn close_span(config: &TracingConfig, peer: &str) -> Span {
    dynamic_span!(config.close_level, "session.close", peer = peer)
}

/// Record elapsed time if timing was enabled for this operation.
pub(crate) fn emit_timing_event(start: Option<Instant>) {
    if let Some(start) = start {
        let elapsed_us = start.elapsed().as_micros();
        tracing::debug!(elapsed_us = elapsed_us, "operation.timing");
    }
}
