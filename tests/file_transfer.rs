//! Integration tests for the HTTP file transfer sidecar against an
//! in-process server.

use std::io::Cursor;

use axum::{
    Json,
    Router,
    extract::{Multipart, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use moonraker_rpc::{FileTransfer, TransferError};
use serde_json::{Value, json};
use tokio::net::TcpListener;

async fn download(Path(path): Path<String>) -> Response {
    if path == "gcodes/missing.gcode" {
        return (StatusCode::NOT_FOUND, "missing").into_response();
    }
    format!("contents of {path}").into_response()
}

async fn upload(mut multipart: Multipart) -> Json<Value> {
    let mut filename = String::new();
    let mut size = 0;
    let mut print = String::new();
    while let Some(field) = multipart.next_field().await.expect("multipart field") {
        match field.name() {
            Some("file") => {
                filename = field.file_name().expect("file name").to_owned();
                size = field.bytes().await.expect("file bytes").len();
            }
            Some("print") => print = field.text().await.expect("print flag"),
            _ => {}
        }
    }
    Json(json!({
        "item": { "path": filename, "root": "gcodes", "size": size },
        "print_started": print == "true",
        "print_queued": false,
        "action": "create_file",
    }))
}

async fn serve() -> FileTransfer {
    let router = Router::new()
        .route("/server/files/upload", post(upload))
        .route("/server/files/{*path}", get(download));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, router).await.expect("serve") });
    FileTransfer::new(reqwest::Client::new(), &format!("http://{addr}")).expect("sidecar")
}

#[tokio::test]
async fn download_writes_body_and_counts_bytes() {
    let files = serve().await;
    let mut sink = Vec::new();
    let written = files
        .download("gcodes/my part.gcode", &mut sink)
        .await
        .expect("download succeeds");
    let expected = "contents of gcodes/my part.gcode";
    assert_eq!(sink, expected.as_bytes());
    assert_eq!(written, expected.len() as u64);
}

#[tokio::test]
async fn download_of_missing_file_reports_status() {
    let files = serve().await;
    let mut sink = Vec::new();
    let err = files
        .download("gcodes/missing.gcode", &mut sink)
        .await
        .expect_err("missing file");
    let TransferError::Status { status, body } = err else {
        panic!("expected a status error, got {err:?}");
    };
    assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
    assert_eq!(body, "missing");
    assert!(sink.is_empty());
}

#[tokio::test]
async fn upload_sends_file_part_and_print_flag() {
    let files = serve().await;
    let result = files
        .upload("part.gcode", b"G28\nG1 X10\n".to_vec(), true)
        .await
        .expect("upload succeeds");
    assert_eq!(result.item.path, "part.gcode");
    assert_eq!(result.item.size, Some(11));
    assert!(result.print_started);
}

#[tokio::test]
async fn upload_reader_streams_without_starting_print() {
    let files = serve().await;
    let result = files
        .upload_reader("streamed.gcode", Cursor::new(vec![b'G'; 4096]), false)
        .await
        .expect("upload succeeds");
    assert_eq!(result.item.size, Some(4096));
    assert!(!result.print_started);
    assert_eq!(result.action.as_deref(), Some("create_file"));
}
