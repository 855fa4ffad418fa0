//! Utilities for driving a [`Session`](moonraker_rpc::Session) against a
//! scripted Moonraker peer during tests.
//!
//! The peer runs on a `tokio::io::duplex` stream after a real WebSocket
//! handshake, so sessions under test exercise the same framing as against a
//! live server without opening sockets.
//!
//! ```rust
//! use moonraker_rpc::SessionBuilder;
//! use moonraker_testing::session_pair;
//! use serde_json::{Value, json};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (session, mut peer) = session_pair(SessionBuilder::new()).await;
//! let call = tokio::spawn(async move { session.call::<_, Value>("server.info", ()).await });
//! let request = peer.next_request().await;
//! peer.reply(request.id(), json!({"klippy_state": "ready"})).await;
//! assert_eq!(call.await.unwrap().unwrap()["klippy_state"], "ready");
//! # }
//! ```

pub mod metrics;
pub mod peer;

pub use metrics::{counter_value, gauge_value};
pub use peer::{PeerRequest, ServerPeer, client_pair, session_pair, ws_pair};
