//! Integration tests for the typed Moonraker façade.
//!
//! The scripted peer checks that every wrapper names the right procedure
//! and sends the parameter names Moonraker expects.

use moonraker_rpc::{
    RpcError,
    SessionBuilder,
    api::{ClientIdentity, ConnectionId, HistoryOrder, HistoryQuery, ObjectQuery, PrinterObjects},
};
use moonraker_testing::{PeerRequest, ServerPeer, client_pair};
use serde_json::{Value, json};

/// Receive one request, check its method and answer with `result`.
async fn answer(peer: &mut ServerPeer, method: &str, result: Value) -> PeerRequest {
    let request = peer.next_request().await;
    assert_eq!(request.method(), method);
    peer.reply(request.id(), result).await;
    request
}

#[tokio::test]
async fn identify_returns_connection_id() {
    let (client, mut peer) = client_pair(SessionBuilder::new()).await;
    let identity = ClientIdentity::new("bot", "0.0.1", "bot", "https://example.com");
    let (result, request) = tokio::join!(
        client.identify(&identity),
        answer(&mut peer, "server.connection.identify", json!({ "connection_id": 1730 }))
    );
    assert_eq!(result.expect("identify succeeds"), ConnectionId::new(1730));
    assert_eq!(
        request.params(),
        Some(&json!({
            "client_name": "bot",
            "version": "0.0.1",
            "type": "bot",
            "url": "https://example.com",
        }))
    );
}

#[tokio::test]
async fn run_gcode_sends_script() {
    let (client, mut peer) = client_pair(SessionBuilder::new()).await;
    let (result, request) = tokio::join!(
        client.run_gcode("G28"),
        answer(&mut peer, "printer.gcode.script", json!("ok"))
    );
    result.expect("gcode accepted");
    assert_eq!(request.params(), Some(&json!({ "script": "G28" })));
}

#[tokio::test]
async fn list_objects_unwraps_names() {
    let (client, mut peer) = client_pair(SessionBuilder::new()).await;
    let (result, request) = tokio::join!(
        client.list_objects(),
        answer(
            &mut peer,
            "printer.objects.list",
            json!({ "objects": ["gcode", "toolhead", "extruder"] })
        )
    );
    assert_eq!(result.expect("objects"), ["gcode", "toolhead", "extruder"]);
    assert!(request.params().is_none());
}

#[tokio::test]
async fn query_objects_decodes_printer_objects() {
    let (client, mut peer) = client_pair(SessionBuilder::new()).await;
    let query = ObjectQuery::new()
        .object("print_stats")
        .fields("heater_bed", ["temperature"]);
    let (result, request) = tokio::join!(
        client.query_objects::<PrinterObjects>(&query),
        answer(
            &mut peer,
            "printer.objects.query",
            json!({
                "eventtime": 12.5,
                "status": {
                    "print_stats": {"state": "printing", "filename": "part.gcode"},
                    "heater_bed": {"temperature": 60.1},
                }
            })
        )
    );
    let status = result.expect("query succeeds");
    assert_eq!(
        request.params(),
        Some(&json!({ "objects": { "heater_bed": ["temperature"], "print_stats": null } }))
    );
    let stats = status.status.print_stats.expect("print_stats present");
    assert_eq!(stats.state, "printing");
    assert!(status.status.heater_bed.is_some());
}

#[tokio::test]
async fn server_info_decodes() {
    let (client, mut peer) = client_pair(SessionBuilder::new()).await;
    let (result, _) = tokio::join!(
        client.server_info(),
        answer(
            &mut peer,
            "server.info",
            json!({
                "klippy_connected": true,
                "klippy_state": "ready",
                "components": ["database", "file_manager"],
                "failed_components": [],
                "registered_directories": ["config", "gcodes"],
                "warnings": [],
                "websocket_count": 2,
                "moonraker_version": "v0.8.0",
                "api_version": [1, 0, 5],
                "api_version_string": "1.0.5",
            })
        )
    );
    let info = result.expect("server info");
    assert!(info.klippy_connected);
    assert_eq!(info.api_version, [1, 0, 5]);
    assert_eq!(info.registered_directories, ["config", "gcodes"]);
}

#[tokio::test]
async fn file_operations_send_moonraker_parameter_names() {
    let (client, mut peer) = client_pair(SessionBuilder::new()).await;
    let item = json!({ "item": { "path": "gcodes/a", "root": "gcodes" }, "action": "ok" });

    let (result, request) = tokio::join!(
        client.delete_directory("gcodes/old", true),
        answer(&mut peer, "server.files.delete_directory", item.clone())
    );
    result.expect("delete directory");
    assert_eq!(request.params(), Some(&json!({ "path": "gcodes/old", "force": true })));

    let (result, request) = tokio::join!(
        client.move_file("gcodes/a.gcode", "gcodes/b.gcode"),
        answer(&mut peer, "server.files.move", item.clone())
    );
    result.expect("move file");
    assert_eq!(
        request.params(),
        Some(&json!({ "source": "gcodes/a.gcode", "dest": "gcodes/b.gcode" }))
    );

    let (result, request) = tokio::join!(
        client.list_files("gcodes"),
        answer(
            &mut peer,
            "server.files.list",
            json!([{ "path": "a.gcode", "modified": 1.0, "size": 10, "permissions": "rw" }])
        )
    );
    assert_eq!(result.expect("list files")[0].path, "a.gcode");
    assert_eq!(request.params(), Some(&json!({ "root": "gcodes" })));
}

#[tokio::test]
async fn job_history_omits_unset_filters() {
    let (client, mut peer) = client_pair(SessionBuilder::new()).await;
    let query = HistoryQuery::default().limit(5).order(HistoryOrder::Asc);
    let (result, request) = tokio::join!(
        client.job_history(&query),
        answer(
            &mut peer,
            "server.history.list",
            json!({ "count": 1, "jobs": [{ "job_id": "000001", "filename": "a.gcode", "status": "completed" }] })
        )
    );
    let history = result.expect("history");
    assert_eq!(history.count, 1);
    assert_eq!(history.jobs[0].status, "completed");
    assert_eq!(request.params(), Some(&json!({ "limit": 5, "order": "asc" })));
}

#[tokio::test]
async fn job_queue_operations_return_queue_state() {
    let (client, mut peer) = client_pair(SessionBuilder::new()).await;
    let (result, request) = tokio::join!(
        client.queue_jobs(&["a.gcode", "b.gcode"]),
        answer(
            &mut peer,
            "server.job_queue.post_job",
            json!({
                "queued_jobs": [
                    { "filename": "a.gcode", "job_id": "0001", "time_added": 1.0, "time_in_queue": 0.5 },
                    { "filename": "b.gcode", "job_id": "0002", "time_added": 2.0, "time_in_queue": 0.1 },
                ],
                "queue_state": "ready",
            })
        )
    );
    let queue = result.expect("queue jobs");
    assert_eq!(queue.queued_jobs.len(), 2);
    assert_eq!(queue.queue_state, "ready");
    assert_eq!(
        request.params(),
        Some(&json!({ "filenames": ["a.gcode", "b.gcode"] }))
    );
}

#[tokio::test]
async fn service_control_surfaces_remote_errors() {
    let (client, mut peer) = client_pair(SessionBuilder::new()).await;
    let (result, ()) = tokio::join!(client.restart_service("bogus"), async {
        let request = peer.next_request().await;
        assert_eq!(request.method(), "machine.services.restart");
        assert_eq!(request.params(), Some(&json!({ "service": "bogus" })));
        peer.reply_error(request.id(), 400, "Invalid argument").await;
    });
    assert!(matches!(result, Err(RpcError::Remote(ref e)) if e.code == 400));
}
