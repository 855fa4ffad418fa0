//! Table of calls awaiting a response.
//!
//! Each outbound call registers a oneshot sender keyed by its
//! [`RequestId`] before the frame is written. The reader removes the entry
//! when the matching response arrives; session termination drains whatever
//! is left with a transport error. An entry is removed exactly once, so a
//! call is completed exactly once.

use std::sync::{
    PoisonError,
    RwLock,
    atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::{
    error::{RpcError, TransportError},
    frame::RequestId,
    metrics,
};

/// Value delivered to a waiting caller.
pub(crate) type Completion = Result<Value, RpcError>;

/// Concurrent registry of pending calls keyed by [`RequestId`].
pub(crate) struct PendingCalls {
    calls: DashMap<RequestId, oneshot::Sender<Completion>>,
    next_id: AtomicU64,
    /// Set once by [`PendingCalls::fail_all`]. Registration inserts under
    /// the read lock, so the drain observes every entry inserted before it.
    closed: RwLock<bool>,
}

impl PendingCalls {
    pub(crate) fn new() -> Self {
        Self {
            calls: DashMap::new(),
            next_id: AtomicU64::new(1),
            closed: RwLock::new(false),
        }
    }

    /// Allocate a fresh identifier and register a waiter for it.
    ///
    /// Identifiers increase monotonically from 1 and are never reused for
    /// the lifetime of the table.
    pub(crate) fn register(&self) -> Result<PendingCall<'_>, TransportError> {
        let closed = self.closed.read().unwrap_or_else(PoisonError::into_inner);
        if *closed {
            return Err(TransportError::Closed);
        }
        let id = RequestId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        self.calls.insert(id, tx);
        drop(closed);
        metrics::inc_pending();
        Ok(PendingCall {
            table: self,
            id,
            rx,
        })
    }

    /// Deliver `outcome` to the caller waiting on `id`.
    ///
    /// Returns false if no call with that identifier is pending.
    pub(crate) fn complete(&self, id: RequestId, outcome: Completion) -> bool {
        let Some((_, tx)) = self.calls.remove(&id) else {
            return false;
        };
        metrics::dec_pending();
        // The caller may have stopped waiting; nothing else to do then.
        let _ = tx.send(outcome);
        true
    }

    /// Forget the call registered under `id` without completing it.
    pub(crate) fn cancel(&self, id: RequestId) -> bool {
        if self.calls.remove(&id).is_some() {
            metrics::dec_pending();
            true
        } else {
            false
        }
    }

    /// Refuse new registrations and fail every pending call.
    ///
    /// Returns the number of calls completed with an error.
    pub(crate) fn fail_all(&self) -> usize {
        *self.closed.write().unwrap_or_else(PoisonError::into_inner) = true;
        let ids: Vec<RequestId> = self.calls.iter().map(|entry| *entry.key()).collect();
        ids.into_iter()
            .filter(|id| self.complete(*id, Err(TransportError::Closed.into())))
            .count()
    }

    pub(crate) fn len(&self) -> usize { self.calls.len() }

    /// Identifiers currently awaiting a response, in ascending order.
    pub(crate) fn ids(&self) -> Vec<RequestId> {
        let mut ids: Vec<RequestId> = self.calls.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable_by_key(RequestId::as_u64);
        ids
    }
}

/// A registered call; dropping it before completion removes the record.
pub(crate) struct PendingCall<'a> {
    table: &'a PendingCalls,
    id: RequestId,
    rx: oneshot::Receiver<Completion>,
}

impl PendingCall<'_> {
    pub(crate) fn id(&self) -> RequestId { self.id }

    /// Wait until the reader or the session teardown completes this call.
    pub(crate) async fn wait(mut self) -> Completion {
        (&mut self.rx)
            .await
            .unwrap_or_else(|_| Err(TransportError::Closed.into()))
    }
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) { self.table.cancel(self.id); }
}
