#![cfg(feature = "metrics")]
//! Tests for `moonraker_rpc` metrics.
//!
//! Counters and gauges are captured with
//! `metrics_util::debugging::DebuggingRecorder` installed as the local
//! recorder of a current-thread runtime, so the session's background tasks
//! record into it too.

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use moonraker_rpc::{
    SessionBuilder,
    metrics::{self as rpc_metrics, Direction},
};
use moonraker_testing::{counter_value, gauge_value, session_pair};
use rstest::rstest;
use serde_json::{Value, json};

fn debugging_recorder_setup() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

#[rstest]
#[case(Direction::Inbound, "inbound")]
#[case(Direction::Outbound, "outbound")]
fn frame_metric_is_labelled_by_direction(#[case] direction: Direction, #[case] label: &str) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || rpc_metrics::inc_frames(direction));
    assert_eq!(
        counter_value(&snapshotter, rpc_metrics::FRAMES_TOTAL, Some(("direction", label))),
        1
    );
}

#[test]
fn pending_gauge_tracks_increments_and_decrements() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        rpc_metrics::inc_pending();
        rpc_metrics::inc_pending();
        rpc_metrics::dec_pending();
    });
    let metrics = snapshotter.snapshot().into_vec();
    assert!(
        metrics.iter().any(|(key, _, _, value)| {
            key.key().name() == rpc_metrics::PENDING_CALLS
                && matches!(value, DebugValue::Gauge(g) if (g.0 - 1.0).abs() < f64::EPSILON)
        }),
        "expected pending gauge == 1, got {metrics:#?}"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn session_records_call_outcomes_and_frames() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    let _guard = metrics::set_default_local_recorder(&recorder);

    let (session, mut peer) = session_pair(SessionBuilder::new()).await;
    let (ok, remote, ()) = tokio::join!(
        session.call::<_, Value>("server.info", ()),
        session.call::<_, Value>("printer.print.start", json!({ "filename": "x" })),
        async {
            let requests = peer.next_requests(2).await;
            peer.send_text("[]").await;
            peer.notify("notify_klippy_ready", Value::Null).await;
            for request in requests {
                if request.method() == "server.info" {
                    peer.reply(request.id(), json!("ok")).await;
                } else {
                    peer.reply_error(request.id(), 400, "bad").await;
                }
            }
        }
    );
    ok.expect("ok call");
    remote.expect_err("remote error");

    assert_eq!(
        counter_value(&snapshotter, rpc_metrics::CALLS_TOTAL, Some(("outcome", "ok"))),
        1
    );
    assert_eq!(
        counter_value(&snapshotter, rpc_metrics::CALLS_TOTAL, Some(("outcome", "remote"))),
        1
    );
    assert_eq!(
        counter_value(&snapshotter, rpc_metrics::FRAMES_TOTAL, Some(("direction", "outbound"))),
        2
    );
    assert_eq!(
        counter_value(&snapshotter, rpc_metrics::FRAMES_TOTAL, Some(("direction", "inbound"))),
        4
    );
    assert_eq!(counter_value(&snapshotter, rpc_metrics::NOTIFICATIONS_TOTAL, None), 1);
    assert_eq!(
        counter_value(&snapshotter, rpc_metrics::ERRORS_TOTAL, Some(("kind", "malformed_frame"))),
        1
    );
    assert_eq!(gauge_value(&snapshotter, rpc_metrics::PENDING_CALLS), Some(0.0));
}
