//! JSON-RPC envelopes exchanged over the persistent connection.
//!
//! Outbound frames carry `{jsonrpc, method, params, id}`; inbound frames are
//! classified as responses or notifications purely on the presence of the
//! `id` member.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{error::RemoteError, notification::Notification};

const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC code used when a server error payload is not `{code, message}`.
pub const INTERNAL_ERROR: i64 = -32603;

/// Correlation identifier for an outbound call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl From<u64> for RequestId {
    fn from(value: u64) -> Self { Self(value) }
}

impl RequestId {
    /// Create a new [`RequestId`] with the provided value.
    #[must_use]
    pub fn new(id: u64) -> Self { Self(id) }

    /// Return the inner `u64` representation.
    #[must_use]
    pub fn as_u64(&self) -> u64 { self.0 }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// A message written to the server.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OutboundFrame {
    jsonrpc: &'static str,
    method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<RequestId>,
}

impl OutboundFrame {
    /// Build a call frame expecting a response correlated by `id`.
    #[must_use]
    pub fn call(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: method.into(),
            params,
            id: Some(id),
        }
    }

    /// Build a notification frame; the server sends no response.
    #[must_use]
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: method.into(),
            params,
            id: None,
        }
    }

    #[must_use]
    pub fn method(&self) -> &str { &self.method }

    #[must_use]
    pub fn id(&self) -> Option<RequestId> { self.id }

    /// Serialize the frame into the text payload of one WebSocket message.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the parameters cannot be rendered.
    pub fn to_text(&self) -> Result<String, serde_json::Error> { serde_json::to_string(self) }
}

/// A reply to a previously issued call.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub id: RequestId,
    pub outcome: Result<Value, RemoteError>,
}

/// A frame read from the server.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundFrame {
    Response(Response),
    Notification(Notification),
}

/// An inbound message that could not be classified.
///
/// These never close the session; the frame is dropped and reported.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame is not valid UTF-8")]
    InvalidUtf8(#[source] std::str::Utf8Error),
    #[error("frame is not valid JSON")]
    InvalidJson(#[source] serde_json::Error),
    #[error("frame is not a JSON object")]
    NotAnObject,
    #[error("response id {0} is not an unsigned integer")]
    InvalidId(Value),
    #[error("notification has no string `method`")]
    InvalidMethod,
    #[error("server-initiated request `{0}` is not supported")]
    UnsupportedMessage(String),
    #[error("unsupported jsonrpc version {0}")]
    UnsupportedVersion(Value),
}

impl InboundFrame {
    /// Classify and decode one text frame.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] if the text is not a JSON-RPC response or
    /// notification.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let value: Value = serde_json::from_str(text).map_err(FrameError::InvalidJson)?;
        let Value::Object(mut object) = value else {
            return Err(FrameError::NotAnObject);
        };
        // Moonraker always tags frames; an absent member is tolerated.
        match object.remove("jsonrpc") {
            None => {}
            Some(Value::String(version)) if version == JSONRPC_VERSION => {}
            Some(other) => return Err(FrameError::UnsupportedVersion(other)),
        }
        match object.remove("id") {
            Some(id) => parse_response(id, object).map(Self::Response),
            None => parse_notification(object).map(Self::Notification),
        }
    }

    /// Decode a binary frame carrying UTF-8 JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] if the bytes are not UTF-8 or do not parse.
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        let text = std::str::from_utf8(bytes).map_err(FrameError::InvalidUtf8)?;
        Self::parse(text)
    }
}

fn parse_response(id: Value, mut object: Map<String, Value>) -> Result<Response, FrameError> {
    let Some(raw) = id.as_u64() else {
        return Err(FrameError::InvalidId(id));
    };
    if let Some(Value::String(method)) = object.remove("method") {
        return Err(FrameError::UnsupportedMessage(method));
    }
    let outcome = match object.remove("error") {
        None | Some(Value::Null) => Ok(object.remove("result").unwrap_or(Value::Null)),
        Some(error) => Err(parse_remote_error(error)),
    };
    Ok(Response {
        id: RequestId(raw),
        outcome,
    })
}

fn parse_remote_error(error: Value) -> RemoteError {
    match serde_json::from_value::<RemoteError>(error.clone()) {
        Ok(remote) => remote,
        Err(_) => RemoteError {
            code: INTERNAL_ERROR,
            message: "malformed error payload".to_owned(),
            data: Some(error),
        },
    }
}

fn parse_notification(mut object: Map<String, Value>) -> Result<Notification, FrameError> {
    let Some(Value::String(method)) = object.remove("method") else {
        return Err(FrameError::InvalidMethod);
    };
    let params = object.remove("params").unwrap_or(Value::Null);
    Ok(Notification::new(method, params))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[test]
    fn call_frame_omits_absent_params() {
        let frame = OutboundFrame::call(RequestId::new(7), "printer.info", None);
        let text = frame.to_text().expect("serialize frame");
        assert_eq!(text, r#"{"jsonrpc":"2.0","method":"printer.info","id":7}"#);
    }

    #[test]
    fn notification_frame_has_no_id() {
        let frame = OutboundFrame::notification("client.ping", Some(json!({"a": 1})));
        let value: Value = serde_json::from_str(&frame.to_text().expect("serialize frame"))
            .expect("frame is json");
        assert!(value.get("id").is_none());
        assert_eq!(value["params"], json!({"a": 1}));
    }

    #[test]
    fn frame_with_id_is_a_response() {
        let frame = InboundFrame::parse(r#"{"jsonrpc":"2.0","result":{"connection_id":5},"id":3}"#)
            .expect("valid response");
        assert_eq!(
            frame,
            InboundFrame::Response(Response {
                id: RequestId::new(3),
                outcome: Ok(json!({"connection_id": 5})),
            })
        );
    }

    #[test]
    fn frame_without_id_is_a_notification() {
        let frame = InboundFrame::parse(
            r#"{"jsonrpc":"2.0","method":"notify_status_update","params":[{"toolhead":{}},1.5]}"#,
        )
        .expect("valid notification");
        let InboundFrame::Notification(notification) = frame else {
            panic!("expected notification");
        };
        assert_eq!(notification.method(), "notify_status_update");
        assert_eq!(notification.params(), &json!([{"toolhead": {}}, 1.5]));
    }

    #[test]
    fn error_response_preserves_code_and_message() {
        let frame = InboundFrame::parse(
            r#"{"jsonrpc":"2.0","error":{"code":-32601,"message":"Method not found"},"id":9}"#,
        )
        .expect("valid error response");
        let InboundFrame::Response(response) = frame else {
            panic!("expected response");
        };
        let err = response.outcome.expect_err("error outcome");
        assert_eq!(err.code, -32601);
        assert_eq!(err.message, "Method not found");
    }

    #[test]
    fn absent_result_is_null() {
        let frame = InboundFrame::parse(r#"{"jsonrpc":"2.0","id":1}"#).expect("valid response");
        let InboundFrame::Response(response) = frame else {
            panic!("expected response");
        };
        assert_eq!(response.outcome, Ok(Value::Null));
    }

    #[test]
    fn unstructured_error_payload_is_kept_as_data() {
        let frame = InboundFrame::parse(r#"{"error":"boom","id":2}"#).expect("valid response");
        let InboundFrame::Response(response) = frame else {
            panic!("expected response");
        };
        let err = response.outcome.expect_err("error outcome");
        assert_eq!(err.code, INTERNAL_ERROR);
        assert_eq!(err.data, Some(json!("boom")));
    }

    #[rstest]
    #[case("not json")]
    #[case("[1, 2, 3]")]
    #[case(r#"{"id":"abc","result":1}"#)]
    #[case(r#"{"id":null,"error":{"code":-32700,"message":"Parse error"}}"#)]
    #[case(r#"{"params":{}}"#)]
    #[case(r#"{"method":"server.ping","id":4}"#)]
    fn malformed_frames_are_rejected(#[case] text: &str) {
        assert!(InboundFrame::parse(text).is_err(), "{text} should be rejected");
    }

    #[rstest]
    #[case(r#"{"jsonrpc":"1.0","result":1,"id":1}"#)]
    #[case(r#"{"jsonrpc":2,"method":"notify_klippy_ready"}"#)]
    fn foreign_protocol_versions_are_rejected(#[case] text: &str) {
        assert!(matches!(
            InboundFrame::parse(text),
            Err(FrameError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn binary_frames_must_be_utf8() {
        assert!(matches!(
            InboundFrame::parse_bytes(&[0xff, 0xfe]),
            Err(FrameError::InvalidUtf8(_))
        ));
    }
}
