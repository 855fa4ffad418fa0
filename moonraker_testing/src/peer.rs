//! Scripted server end of an in-memory WebSocket connection.

use futures::{SinkExt, StreamExt};
use moonraker_rpc::{FileTransfer, MoonrakerClient, Session, SessionBuilder};
use serde_json::{Value, json};
use tokio::io::{DuplexStream, duplex};
use tokio_tungstenite::{WebSocketStream, tungstenite::Message};

const DUPLEX_CAPACITY: usize = 64 * 1024;

/// Base URL handed to the sidecar of clients built by [`client_pair`]. No
/// HTTP server listens there.
const UNUSED_HTTP_BASE: &str = "http://127.0.0.1:9";

/// Perform a WebSocket handshake over an in-memory duplex stream.
///
/// Returns the client and server ends.
///
/// # Panics
///
/// Panics if either side of the handshake fails.
pub async fn ws_pair() -> (WebSocketStream<DuplexStream>, WebSocketStream<DuplexStream>) {
    let (client, server) = duplex(DUPLEX_CAPACITY);
    let (client, server) = tokio::join!(
        tokio_tungstenite::client_async("ws://moonraker.test/websocket", client),
        tokio_tungstenite::accept_async(server),
    );
    let (client, _response) = client.expect("client handshake");
    (client, server.expect("server handshake"))
}

/// Start a session built by `builder` against a fresh [`ServerPeer`].
pub async fn session_pair(builder: SessionBuilder) -> (Session, ServerPeer) {
    let (client, server) = ws_pair().await;
    let session = builder.attach(client, "moonraker.test");
    (session, ServerPeer { ws: server })
}

/// Like [`session_pair`], wrapped in a [`MoonrakerClient`].
///
/// # Panics
///
/// Panics if the placeholder sidecar cannot be built.
pub async fn client_pair(builder: SessionBuilder) -> (MoonrakerClient, ServerPeer) {
    let (session, peer) = session_pair(builder).await;
    let files = FileTransfer::new(reqwest::Client::new(), UNUSED_HTTP_BASE)
        .expect("placeholder sidecar url");
    (MoonrakerClient::from_parts(session, files), peer)
}

/// A request received by the peer, decoded from its JSON text.
#[derive(Clone, Debug, PartialEq)]
pub struct PeerRequest {
    pub raw: Value,
}

impl PeerRequest {
    /// Correlation id of the request.
    ///
    /// # Panics
    ///
    /// Panics if the request is a notification.
    #[must_use]
    pub fn id(&self) -> u64 { self.raw["id"].as_u64().expect("request carries an id") }

    #[must_use]
    pub fn is_notification(&self) -> bool { self.raw.get("id").is_none() }

    /// # Panics
    ///
    /// Panics if the request has no method name.
    #[must_use]
    pub fn method(&self) -> &str { self.raw["method"].as_str().expect("request method") }

    /// `params` member, or `None` if it was omitted.
    #[must_use]
    pub fn params(&self) -> Option<&Value> { self.raw.get("params") }
}

/// Server side of a session under test.
pub struct ServerPeer {
    ws: WebSocketStream<DuplexStream>,
}

impl ServerPeer {
    /// Wait for the next request or notification from the client.
    ///
    /// # Panics
    ///
    /// Panics if the connection ends or a frame is not valid JSON.
    pub async fn next_request(&mut self) -> PeerRequest {
        self.try_next_request()
            .await
            .expect("connection ended before a request arrived")
    }

    /// Wait for the next request, or `None` once the client disconnects.
    ///
    /// # Panics
    ///
    /// Panics if a frame is not valid JSON.
    pub async fn try_next_request(&mut self) -> Option<PeerRequest> {
        while let Some(message) = self.ws.next().await {
            match message.ok()? {
                Message::Text(text) => {
                    let raw = serde_json::from_str(text.as_str()).expect("request json");
                    return Some(PeerRequest { raw });
                }
                Message::Close(_) => return None,
                _ => {}
            }
        }
        None
    }

    /// Collect `n` requests in arrival order.
    pub async fn next_requests(&mut self, n: usize) -> Vec<PeerRequest> {
        let mut requests = Vec::with_capacity(n);
        for _ in 0..n {
            requests.push(self.next_request().await);
        }
        requests
    }

    /// Answer request `id` with `result`.
    pub async fn reply(&mut self, id: u64, result: Value) {
        self.send_value(&json!({"jsonrpc": "2.0", "result": result, "id": id}))
            .await;
    }

    /// Answer request `id` with an error object.
    pub async fn reply_error(&mut self, id: u64, code: i64, message: &str) {
        self.send_value(&json!({
            "jsonrpc": "2.0",
            "error": {"code": code, "message": message},
            "id": id,
        }))
        .await;
    }

    /// Push a notification to the client.
    pub async fn notify(&mut self, method: &str, params: Value) {
        self.send_value(&json!({"jsonrpc": "2.0", "method": method, "params": params}))
            .await;
    }

    /// Send `text` verbatim as one text message.
    ///
    /// # Panics
    ///
    /// Panics if the write fails.
    pub async fn send_text(&mut self, text: impl Into<String>) {
        self.ws
            .send(Message::text(text.into()))
            .await
            .expect("peer send");
    }

    /// Close the connection from the server side.
    pub async fn close(mut self) {
        // The client may already be gone.
        let _ = self.ws.close(None).await;
    }

    async fn send_value(&mut self, value: &Value) { self.send_text(value.to_string()).await; }
}
