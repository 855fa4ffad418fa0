//! Correlation engine turning one connection into many concurrent calls.
//!
//! A [`Session`] assigns every outbound call a fresh [`RequestId`],
//! registers a pending record for it before the frame is written, and
//! suspends only the calling task until the background reader delivers the
//! matching response. The pending table is the single source of truth for
//! which caller receives a frame; its lock is never held across the wait.
//!
//! ```text
//!  caller ── call() ──► register id ──► Transport::send ──► wire
//!     ▲                                                      │
//!     └──── oneshot ◄── PendingCalls ◄── reader task ◄───────┘
//!                                          │
//!                                          └──► Dispatcher ──► handler
//! ```
//!
//! Session close is the only teardown path. It is safe to call concurrently
//! with in-flight calls and guarantees every pending call resolves.

mod builder;
mod hooks;
mod pending;
mod reader;
mod tracing_config;
mod tracing_helpers;

use std::{
    fmt,
    sync::{
        Arc,
        Mutex,
        PoisonError,
        atomic::{AtomicU8, Ordering},
    },
    time::{Duration, Instant},
};

pub use builder::SessionBuilder;
pub use hooks::{FrameErrorHandler, SessionCloseHandler};
use pending::PendingCalls;
use serde::{Serialize, de::DeserializeOwned, de::IgnoredAny};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{Instrument, Span, info, warn};
pub use tracing_config::TracingConfig;
use tracing_helpers::{call_span, close_span, emit_timing_event};

use crate::{
    error::{DecodeError, Result, RpcError, TransportError},
    frame::{OutboundFrame, RequestId},
    metrics,
    notification::Dispatcher,
    transport::{FrameReader, Transport},
};

/// Lifecycle of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    /// Calls may be issued.
    Open = 0,
    /// Teardown has started; new calls fail immediately.
    Closing = 1,
    /// The connection is released and every pending call has completed.
    Closed = 2,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Open,
            1 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// State shared between session handles and the reader task.
pub(crate) struct Shared {
    transport: Transport,
    pending: PendingCalls,
    state: AtomicU8,
    terminated: CancellationToken,
    on_close: Option<SessionCloseHandler>,
}

impl Shared {
    fn state(&self) -> SessionState { SessionState::from_u8(self.state.load(Ordering::Acquire)) }

    fn begin_closing(&self) {
        let _ = self.state.compare_exchange(
            SessionState::Open as u8,
            SessionState::Closing as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Release the transport and fail every pending call.
    ///
    /// Idempotent; the close hook fires only for the first caller.
    async fn terminate(&self) {
        self.begin_closing();
        self.transport.close().await;
        let failed = self.pending.fail_all();
        if failed > 0 {
            warn!(failed, "pending calls failed by session teardown");
        }
        if self.state.swap(SessionState::Closed as u8, Ordering::AcqRel)
            == SessionState::Closed as u8
        {
            return;
        }
        info!(peer = self.transport.peer(), "session closed");
        self.terminated.cancel();
        if let Some(hook) = &self.on_close {
            hook().await;
        }
    }
}

/// Parts owned by session handles only; dropping the last handle shuts the
/// transport down.
struct Owner {
    reader_task: Mutex<Option<JoinHandle<()>>>,
    request_timeout: Option<Duration>,
    tracing_config: TracingConfig,
    _shutdown: DropGuard,
}

/// Handle to an RPC session over one persistent connection.
///
/// Cloning is cheap; all clones share the connection and pending table.
/// Dropping the last clone closes the connection.
///
/// # Examples
///
/// ```no_run
/// use moonraker_rpc::{RpcError, Session};
/// use serde_json::Value;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), RpcError> {
/// let session = Session::builder()
///     .connect("ws://printer.local/websocket")
///     .await?;
/// let info: Value = session.call("server.info", ()).await?;
/// println!("{info}");
/// session.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    shared: Arc<Shared>,
    owner: Arc<Owner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("peer", &self.peer())
            .field("state", &self.state())
            .field("pending_calls", &self.pending_calls())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Start building a new session.
    #[must_use]
    pub fn builder() -> SessionBuilder { SessionBuilder::new() }

    pub(crate) fn start(builder: SessionBuilder, transport: Transport, reader: FrameReader) -> Self {
        let shutdown = transport.shutdown_token();
        let hooks = builder.hooks;
        let shared = Arc::new(Shared {
            transport,
            pending: PendingCalls::new(),
            state: AtomicU8::new(SessionState::Open as u8),
            terminated: CancellationToken::new(),
            on_close: hooks.on_close,
        });
        let (dispatcher, _delivery) = Dispatcher::spawn(hooks.on_notification);
        let task = tokio::spawn(
            reader::run(shared.clone(), reader, dispatcher, hooks.on_frame_error)
                .in_current_span(),
        );
        Self {
            shared,
            owner: Arc::new(Owner {
                reader_task: Mutex::new(Some(task)),
                request_timeout: builder.request_timeout,
                tracing_config: builder.tracing_config,
                _shutdown: shutdown.drop_guard(),
            }),
        }
    }

    /// Invoke `method` and decode its result as `R`.
    ///
    /// Parameters that serialize to `null`, such as `()`, are omitted from
    /// the request. An absent result decodes as `null`, so `()` is a valid
    /// result shape for operations that return nothing. The session's
    /// default request timeout applies.
    ///
    /// # Errors
    ///
    /// - [`RpcError::Transport`] if the session is closed or fails before the
    ///   response arrives.
    /// - [`RpcError::Remote`] if the server answers with an error.
    /// - [`RpcError::Decode`] if the result does not match `R`.
    /// - [`RpcError::Timeout`] if the default deadline expires.
    /// - [`RpcError::Encode`] if `params` cannot be serialized.
    pub async fn call<P, R>(&self, method: &str, params: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        self.call_with_deadline(method, params, self.owner.request_timeout)
            .await
    }

    /// Invoke `method` with an explicit deadline overriding the default.
    ///
    /// # Errors
    ///
    /// As [`Session::call`], with [`RpcError::Timeout`] once `timeout`
    /// elapses. The pending record is removed on expiry; a late response is
    /// logged and dropped.
    pub async fn call_with_timeout<P, R>(
        &self,
        method: &str,
        params: P,
        timeout: Duration,
    ) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        self.call_with_deadline(method, params, Some(timeout)).await
    }

    /// Invoke `method` and discard its result.
    ///
    /// Still waits for the response so remote errors surface.
    ///
    /// # Errors
    ///
    /// As [`Session::call`], except that decoding never fails.
    pub async fn call_discard<P: Serialize>(&self, method: &str, params: P) -> Result<()> {
        let _: IgnoredAny = self.call(method, params).await?;
        Ok(())
    }

    /// Send a notification; the server sends nothing back.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Transport`] if the session is closed or the write
    /// fails, and [`RpcError::Encode`] if `params` cannot be serialized.
    pub async fn notify<P: Serialize>(&self, method: &str, params: P) -> Result<()> {
        self.ensure_open()?;
        let params = encode_params(method, &params)?;
        self.shared
            .transport
            .send(&OutboundFrame::notification(method, params))
            .await
    }

    /// Close the connection and complete every pending call.
    ///
    /// Idempotent and safe to call while other tasks have calls in flight;
    /// those calls fail with [`TransportError::Closed`].
    pub async fn close(&self) {
        let config = &self.owner.tracing_config;
        let span = close_span(config, self.peer());
        let start = config.close_timing.then(Instant::now);
        async {
            self.shared.begin_closing();
            self.shared.transport.close().await;
            let task = {
                let mut slot = self
                    .owner
                    .reader_task
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                // An `on_close` hook runs on the reader task; joining it from
                // there would wait on itself.
                match slot.as_ref() {
                    Some(task) if Some(task.id()) == tokio::task::try_id() => None,
                    _ => slot.take(),
                }
            };
            if let Some(task) = task
                && let Err(e) = task.await
            {
                warn!(error = %e, "session reader task failed");
            }
            self.shared.terminate().await;
        }
        .instrument(span)
        .await;
        emit_timing_event(start);
    }

    /// Wait until the session has terminated for any reason.
    pub async fn closed(&self) { self.shared.terminated.cancelled().await; }

    #[must_use]
    pub fn state(&self) -> SessionState { self.shared.state() }

    #[must_use]
    pub fn is_closed(&self) -> bool { self.state() != SessionState::Open }

    /// Number of calls awaiting a response.
    #[must_use]
    pub fn pending_calls(&self) -> usize { self.shared.pending.len() }

    /// Identifiers of calls awaiting a response, for diagnostics.
    #[must_use]
    pub fn pending_ids(&self) -> Vec<RequestId> { self.shared.pending.ids() }

    /// URL or address of the remote end.
    #[must_use]
    pub fn peer(&self) -> &str { self.shared.transport.peer() }

    fn ensure_open(&self) -> Result<()> {
        if self.state() == SessionState::Open {
            Ok(())
        } else {
            Err(TransportError::Closed.into())
        }
    }

    async fn call_with_deadline<P, R>(
        &self,
        method: &str,
        params: P,
        deadline: Option<Duration>,
    ) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let config = &self.owner.tracing_config;
        let span = call_span(config, method);
        let start = config.call_timing.then(Instant::now);
        let result = async {
            let params = encode_params(method, &params)?;
            let value = self.round_trip(method, params, deadline).await?;
            decode_result(method, value)
        }
        .instrument(span.clone())
        .await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        span.record("result", outcome);
        metrics::inc_calls(outcome);
        emit_timing_event(start);
        result
    }

    async fn round_trip(
        &self,
        method: &str,
        params: Option<Value>,
        deadline: Option<Duration>,
    ) -> Result<Value> {
        self.ensure_open()?;
        let call = self.shared.pending.register()?;
        let id = call.id();
        Span::current().record("request_id", id.as_u64());
        self.shared
            .transport
            .send(&OutboundFrame::call(id, method, params))
            .await?;
        let Some(limit) = deadline else {
            return call.wait().await;
        };
        if let Ok(completion) = tokio::time::timeout(limit, call.wait()).await {
            completion
        } else {
            warn!(request_id = %id, ?limit, "call timed out");
            Err(RpcError::Timeout {
                method: method.to_owned(),
                elapsed: limit,
            })
        }
    }
}

fn encode_params<P: Serialize>(method: &str, params: &P) -> Result<Option<Value>> {
    match serde_json::to_value(params) {
        Ok(Value::Null) => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(source) => Err(RpcError::Encode {
            method: method.to_owned(),
            source,
        }),
    }
}

fn decode_result<R: DeserializeOwned>(method: &str, value: Value) -> Result<R> {
    serde_json::from_value(value).map_err(|source| {
        DecodeError {
            method: method.to_owned(),
            source,
        }
        .into()
    })
}
