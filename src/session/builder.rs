//! Builder for configuring and establishing a session.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;
use tracing::Instrument;

use super::{
    Session,
    TracingConfig,
    hooks::SessionHooks,
    tracing_helpers::{connect_span, emit_timing_event},
};
use crate::{
    error::TransportError,
    frame::FrameError,
    notification::Notification,
    transport::{self, Transport},
};

/// Builder for [`Session`].
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
///
/// use moonraker_rpc::SessionBuilder;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), moonraker_rpc::TransportError> {
/// let session = SessionBuilder::new()
///     .request_timeout(Some(Duration::from_secs(10)))
///     .on_notification(|notification| async move {
///         println!("event: {}", notification.method());
///     })
///     .connect("ws://printer.local/websocket")
///     .await?;
/// session.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct SessionBuilder {
    pub(crate) request_timeout: Option<Duration>,
    pub(crate) tracing_config: TracingConfig,
    pub(crate) hooks: SessionHooks,
}

impl SessionBuilder {
    /// Create a builder with no request timeout and no hooks.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Default deadline applied to every call; `None` waits indefinitely.
    ///
    /// A call that exceeds its deadline fails with
    /// [`RpcError::Timeout`](crate::RpcError::Timeout); a response that
    /// arrives afterwards is logged and dropped.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Configure span levels and timing for session operations.
    #[must_use]
    pub fn tracing_config(mut self, config: TracingConfig) -> Self {
        self.tracing_config = config;
        self
    }

    /// Register the handler receiving every server notification.
    ///
    /// The handler runs on its own task, one notification at a time, in
    /// arrival order. Without a handler notifications are dropped.
    #[must_use]
    pub fn on_notification<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Notification) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.hooks.on_notification = Some(Arc::new(move |n| Box::pin(f(n))));
        self
    }

    /// Register a callback for inbound frames that could not be parsed.
    #[must_use]
    pub fn on_frame_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&FrameError) + Send + Sync + 'static,
    {
        self.hooks.on_frame_error = Some(Arc::new(f));
        self
    }

    /// Register a callback invoked once the session has terminated.
    ///
    /// The callback may call [`Session::close`] on a captured handle; it
    /// returns once teardown has finished.
    #[must_use]
    pub fn on_close<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.hooks.on_close = Some(Arc::new(move || Box::pin(f())));
        self
    }

    /// Open a WebSocket connection to `url` and start the session.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connect`] if the connection cannot be
    /// established.
    pub async fn connect(self, url: &str) -> Result<Session, TransportError> {
        let span = connect_span(&self.tracing_config, url);
        let start = self.tracing_config.connect_timing.then(std::time::Instant::now);
        let result = async {
            let (transport, reader) = transport::connect(url).await?;
            tracing::info!("connected");
            Ok::<_, TransportError>(Session::start(self, transport, reader))
        }
        .instrument(span)
        .await;
        emit_timing_event(start);
        result
    }

    /// Start a session over an already established WebSocket stream.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn attach<S>(self, stream: WebSocketStream<S>, peer: impl Into<String>) -> Session
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (transport, reader) = Transport::new(stream, peer);
        Session::start(self, transport, reader)
    }
}
