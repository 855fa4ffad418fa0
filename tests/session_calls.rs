//! Integration tests for request/response correlation.
//!
//! Each test drives a real session against a scripted peer over an
//! in-memory WebSocket and checks that every caller receives exactly its own
//! outcome.

use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use moonraker_rpc::{RemoteError, RpcError, SessionBuilder, TransportError};
use moonraker_testing::session_pair;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing_test::traced_test;

const WAIT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn concurrent_calls_answered_in_reverse_receive_their_own_results() {
    let (session, mut peer) = session_pair(SessionBuilder::new()).await;
    let calls: Vec<_> = (0..8_u64)
        .map(|n| {
            let session = session.clone();
            tokio::spawn(async move {
                let result: Value = session
                    .call("server.echo", json!({ "n": n }))
                    .await
                    .expect("call succeeds");
                (n, result)
            })
        })
        .collect();

    let requests = peer.next_requests(8).await;
    let ids: HashSet<u64> = requests.iter().map(|r| r.id()).collect();
    assert_eq!(ids.len(), 8, "identifiers must be unique");
    assert_eq!(session.pending_calls(), 8);

    for request in requests.iter().rev() {
        let n = request.params().expect("params")["n"].clone();
        peer.reply(request.id(), json!({ "echo": n })).await;
    }
    for call in calls {
        let (n, result) = call.await.expect("task joins");
        assert_eq!(result, json!({ "echo": n }));
    }
    assert_eq!(session.pending_calls(), 0);
}

#[tokio::test]
async fn fast_call_completes_while_slow_call_waits() {
    let (session, mut peer) = session_pair(SessionBuilder::new()).await;
    let slow = tokio::spawn({
        let session = session.clone();
        async move { session.call::<_, Value>("slow", ()).await }
    });
    let slow_request = peer.next_request().await;
    let fast = tokio::spawn({
        let session = session.clone();
        async move { session.call::<_, Value>("fast", ()).await }
    });
    let fast_request = peer.next_request().await;

    peer.reply(fast_request.id(), json!("fast")).await;
    let fast = tokio::time::timeout(WAIT, fast)
        .await
        .expect("fast call is not blocked")
        .expect("task joins")
        .expect("fast call succeeds");
    assert_eq!(fast, json!("fast"));
    assert!(!slow.is_finished());

    peer.reply(slow_request.id(), json!("slow")).await;
    let slow = slow.await.expect("task joins").expect("slow call succeeds");
    assert_eq!(slow, json!("slow"));
}

#[tokio::test]
async fn remote_error_preserves_code_and_message() {
    let (session, mut peer) = session_pair(SessionBuilder::new()).await;
    let (result, ()) = tokio::join!(
        session.call::<_, Value>("printer.print.start", json!({ "filename": "missing.gcode" })),
        async {
            let request = peer.next_request().await;
            peer.reply_error(request.id(), 400, "File not found").await;
        }
    );
    let Err(RpcError::Remote(err)) = result else {
        panic!("expected a remote error, got {result:?}");
    };
    assert_eq!(
        err,
        RemoteError {
            code: 400,
            message: "File not found".into(),
            data: None,
        }
    );
    assert!(!session.is_closed());
}

#[derive(Debug, Deserialize)]
struct Klippy {
    klippy_state: String,
}

#[tokio::test]
async fn decode_mismatch_leaves_session_usable() {
    let (session, mut peer) = session_pair(SessionBuilder::new()).await;
    let (result, ()) = tokio::join!(session.call::<_, Klippy>("server.info", ()), async {
        let request = peer.next_request().await;
        peer.reply(request.id(), json!(42)).await;
    });
    let Err(RpcError::Decode(err)) = result else {
        panic!("expected a decode error, got {result:?}");
    };
    assert_eq!(err.method, "server.info");

    let (result, ()) = tokio::join!(session.call::<_, Klippy>("server.info", ()), async {
        let request = peer.next_request().await;
        peer.reply(request.id(), json!({ "klippy_state": "ready" }))
            .await;
    });
    assert_eq!(result.expect("second call succeeds").klippy_state, "ready");
}

#[tokio::test]
async fn unit_params_are_omitted_and_absent_result_is_accepted() {
    let (session, mut peer) = session_pair(SessionBuilder::new()).await;
    let (result, ()) = tokio::join!(session.call::<_, ()>("printer.emergency_stop", ()), async {
        let request = peer.next_request().await;
        assert_eq!(request.method(), "printer.emergency_stop");
        assert!(request.params().is_none(), "unit params must be omitted");
        peer.send_text(format!(r#"{{"jsonrpc":"2.0","id":{}}}"#, request.id()))
            .await;
    });
    result.expect("empty result decodes as unit");
}

#[tokio::test]
#[traced_test]
async fn response_with_unknown_id_is_dropped() {
    let (session, mut peer) = session_pair(SessionBuilder::new()).await;
    let (result, ()) = tokio::join!(session.call::<_, Value>("server.info", ()), async {
        let request = peer.next_request().await;
        peer.reply(request.id() + 1000, json!("stray")).await;
        peer.reply(request.id(), json!("mine")).await;
    });
    assert_eq!(result.expect("call succeeds"), json!("mine"));
    assert!(logs_contain("dropping response for unknown request id"));
}

#[tokio::test]
async fn timed_out_call_drops_its_late_response() {
    let (session, mut peer) = session_pair(SessionBuilder::new()).await;
    let (result, request) = tokio::join!(
        session.call_with_timeout::<_, Value>("machine.proc_stats", (), Duration::from_millis(50)),
        peer.next_request()
    );
    assert!(matches!(result, Err(RpcError::Timeout { ref method, .. }) if method == "machine.proc_stats"));
    assert_eq!(session.pending_calls(), 0);

    peer.reply(request.id(), json!("late")).await;
    let (result, ()) = tokio::join!(session.call::<_, Value>("server.info", ()), async {
        let request = peer.next_request().await;
        peer.reply(request.id(), json!("fresh")).await;
    });
    assert_eq!(result.expect("later call succeeds"), json!("fresh"));
}

#[tokio::test]
async fn builder_timeout_applies_to_every_call() {
    let builder = SessionBuilder::new().request_timeout(Some(Duration::from_millis(20)));
    let (session, mut peer) = session_pair(builder).await;
    let (result, _request) = tokio::join!(session.call::<_, Value>("server.info", ()), peer.next_request());
    assert!(matches!(result, Err(RpcError::Timeout { .. })));
    assert!(!session.is_closed(), "a timeout is not fatal");
}

#[tokio::test]
async fn malformed_frame_is_reported_and_session_survives() {
    let malformed = Arc::new(AtomicUsize::new(0));
    let builder = SessionBuilder::new().on_frame_error({
        let malformed = malformed.clone();
        move |_err| {
            malformed.fetch_add(1, Ordering::SeqCst);
        }
    });
    let (session, mut peer) = session_pair(builder).await;
    let (result, ()) = tokio::join!(session.call::<_, Value>("server.info", ()), async {
        let request = peer.next_request().await;
        peer.send_text("{not json").await;
        peer.send_text(r#"{"jsonrpc":"2.0","result":1,"id":"abc"}"#).await;
        peer.reply(request.id(), json!("ok")).await;
    });
    assert_eq!(result.expect("call succeeds"), json!("ok"));
    assert_eq!(malformed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn notify_sends_a_frame_without_id() {
    let (session, mut peer) = session_pair(SessionBuilder::new()).await;
    session
        .notify("client.ping", json!({ "seq": 1 }))
        .await
        .expect("notify succeeds");
    let request = peer.next_request().await;
    assert!(request.is_notification());
    assert_eq!(request.method(), "client.ping");
    assert_eq!(session.pending_calls(), 0);
}

#[tokio::test]
async fn calls_after_close_fail_immediately() {
    let (session, _peer) = session_pair(SessionBuilder::new()).await;
    session.close().await;
    let result = session.call::<_, Value>("server.info", ()).await;
    assert!(matches!(result, Err(RpcError::Transport(TransportError::Closed))));
    let result = session.notify("client.ping", ()).await;
    assert!(matches!(result, Err(RpcError::Transport(TransportError::Closed))));
}
