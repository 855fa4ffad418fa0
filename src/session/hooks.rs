//! Session lifecycle hooks.
//!
//! Hooks are registered on the [`SessionBuilder`](super::SessionBuilder) and
//! fire from the background reader: notifications are forwarded to their own
//! delivery task, malformed frames are reported synchronously, and the close
//! hook runs once when the session terminates.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::{frame::FrameError, notification::NotificationHandler};

/// Handler invoked for every inbound frame the session had to drop.
///
/// Runs on the reader task, so it must return quickly.
///
/// # Examples
///
/// ```rust
/// use std::sync::{
///     Arc,
///     atomic::{AtomicUsize, Ordering},
/// };
///
/// use moonraker_rpc::session::FrameErrorHandler;
///
/// let counter = Arc::new(AtomicUsize::new(0));
/// let count = counter.clone();
/// let hook: FrameErrorHandler = Arc::new(move |_err| {
///     count.fetch_add(1, Ordering::Relaxed);
/// });
/// ```
pub type FrameErrorHandler = Arc<dyn Fn(&FrameError) + Send + Sync>;

/// Handler invoked once when the session has terminated.
///
/// Called after every pending call has been completed, whether the session
/// was closed locally or the connection failed.
pub type SessionCloseHandler = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Optional callbacks configured via the builder.
#[derive(Clone, Default)]
#[expect(
    clippy::struct_field_names,
    reason = "on_ prefix is idiomatic for callback fields"
)]
pub(crate) struct SessionHooks {
    pub(crate) on_notification: Option<NotificationHandler>,
    pub(crate) on_frame_error: Option<FrameErrorHandler>,
    pub(crate) on_close: Option<SessionCloseHandler>,
}
