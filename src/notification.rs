//! Delivery of server-pushed notifications.
//!
//! The session reader hands every notification frame to a [`Dispatcher`],
//! which forwards it over an unbounded channel to a dedicated task. The task
//! invokes the caller's [`NotificationHandler`] once per frame, in arrival
//! order. The reader therefore never waits on the handler, so a slow handler
//! cannot delay responses to pending calls.

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use futures::{FutureExt, future::BoxFuture};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{Instrument, debug, error, warn};

use crate::{error::DecodeError, metrics};

/// A server-initiated message carrying no correlation identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    method: String,
    params: Value,
}

impl Notification {
    #[must_use]
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Name of the event, for example `notify_status_update`.
    #[must_use]
    pub fn method(&self) -> &str { &self.method }

    /// Raw parameters; `Value::Null` when the frame carried none.
    #[must_use]
    pub fn params(&self) -> &Value { &self.params }

    #[must_use]
    pub fn into_params(self) -> Value { self.params }

    /// Decode the parameters into a concrete shape.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] naming the notification method if the
    /// parameters do not match `T`.
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        T::deserialize(&self.params).map_err(|source| DecodeError {
            method: self.method.clone(),
            source,
        })
    }
}

/// Handler invoked for every notification received by a session.
///
/// The handler has no channel back to the server.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
///
/// use moonraker_rpc::NotificationHandler;
///
/// let handler: NotificationHandler = Arc::new(|notification| {
///     Box::pin(async move {
///         println!("{}", notification.method());
///     })
/// });
/// ```
pub type NotificationHandler = Arc<dyn Fn(Notification) -> BoxFuture<'static, ()> + Send + Sync>;

/// Publishes notifications from the reader to the handler task.
pub(crate) struct Dispatcher {
    tx: Option<mpsc::UnboundedSender<Notification>>,
}

impl Dispatcher {
    /// Start the delivery task for `handler`, if one was registered.
    pub(crate) fn spawn(handler: Option<NotificationHandler>) -> (Self, Option<JoinHandle<()>>) {
        let Some(handler) = handler else {
            return (Self { tx: None }, None);
        };
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(deliver(rx, handler).in_current_span());
        (Self { tx: Some(tx) }, Some(task))
    }

    /// Queue `notification` for delivery without waiting for the handler.
    pub(crate) fn dispatch(&self, notification: Notification) {
        metrics::inc_notifications();
        let Some(tx) = &self.tx else {
            debug!(
                method = notification.method(),
                "no notification handler registered; dropping"
            );
            return;
        };
        if let Err(mpsc::error::SendError(lost)) = tx.send(notification) {
            warn!(method = lost.method(), "notification task stopped; dropping");
        }
    }
}

async fn deliver(mut rx: mpsc::UnboundedReceiver<Notification>, handler: NotificationHandler) {
    while let Some(notification) = rx.recv().await {
        let method = notification.method().to_owned();
        if let Err(panic) = AssertUnwindSafe(handler(notification)).catch_unwind().await {
            error!(
                %method,
                panic = panic_message(panic.as_ref()),
                "notification handler panicked"
            );
        }
    }
    debug!("notification delivery finished");
}

/// Text carried by a `panic!` payload, if it has any.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}
