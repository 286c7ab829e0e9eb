//! Worker task responsible for executing dequeued descriptors.
//!
//! Each worker loops: dequeue one envelope (up to `batch_size` descriptors
//! when more are queued), issue the remote call through the [`Directory`]
//! collaborator, and hand every contained reply to the response handler
//! before dequeueing again. A worker suspends only while awaiting the remote
//! reply or while the queue is empty.
//!
//! Workers never decide termination themselves: the loop ends when the queue
//! closes (global in-flight count hit zero) or the cancellation token fires.

use crate::{context::EngineContext, directory::Directory, handler};
use std::sync::Arc;

pub(crate) async fn worker_loop<D: Directory>(
    worker_id: usize,
    ctx: Arc<EngineContext<D>>,
    batch_size: usize,
) {
    tracing::trace!("Worker {worker_id} started");

    while let Some(envelope) = ctx.queue.pop_batch(batch_size, &ctx.cancel).await {
        tracing::trace!(
            batch = envelope.len(),
            "Worker {worker_id} dispatching envelope"
        );

        let replies = ctx.directory.fetch_batch(envelope).await;
        for (req, result) in replies {
            if let Err(fatal) = handler::handle_reply(&ctx, req, result).await {
                ctx.abort(fatal).await;
                return;
            }
        }
    }

    tracing::trace!("Worker {worker_id} stopped");
}
