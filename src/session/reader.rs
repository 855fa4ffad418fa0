//! Background task draining the transport.
//!
//! A single reader makes every demultiplexing decision: responses complete
//! pending calls, notifications go to the dispatcher, malformed frames are
//! reported and dropped. When the connection ends the reader tears the
//! session down.

use std::sync::Arc;

use tracing::{debug, error, warn};

use super::{Shared, hooks::FrameErrorHandler};
use crate::{
    frame::InboundFrame,
    metrics,
    notification::Dispatcher,
    transport::{FrameReader, ReadError},
};

pub(super) async fn run(
    shared: Arc<Shared>,
    mut reader: FrameReader,
    dispatcher: Dispatcher,
    on_frame_error: Option<FrameErrorHandler>,
) {
    loop {
        match reader.next_frame().await {
            Some(Ok(InboundFrame::Response(response))) => {
                let id = response.id;
                let outcome = response.outcome.map_err(Into::into);
                if !shared.pending.complete(id, outcome) {
                    metrics::inc_errors("unmatched_response");
                    warn!(request_id = %id, "dropping response for unknown request id");
                }
            }
            Some(Ok(InboundFrame::Notification(notification))) => {
                dispatcher.dispatch(notification);
            }
            Some(Err(ReadError::Malformed(err))) => {
                metrics::inc_errors("malformed_frame");
                warn!(error = %err, "dropping malformed frame");
                if let Some(handler) = &on_frame_error {
                    handler(&err);
                }
            }
            Some(Err(ReadError::Fatal(err))) => {
                metrics::inc_errors("transport");
                error!(error = %err, peer = shared.transport.peer(), "connection failed");
                break;
            }
            None => {
                debug!(peer = shared.transport.peer(), "connection terminated");
                break;
            }
        }
    }
    drop(dispatcher);
    shared.terminate().await;
}
