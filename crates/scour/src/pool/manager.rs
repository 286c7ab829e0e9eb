//! Worker pool construction.
//!
//! The pool holds exactly `concurrency_level` concurrent executors, all
//! pulling from the same shared [`WorkQueue`]. Idle executors block on an
//! empty queue; they terminate only when the queue closes (in-flight counter
//! reached zero) or the fetch is cancelled. The pool itself is fire-and-
//! forget: worker lifetime is governed entirely by the queue and the shared
//! [`CancellationToken`] inside the context, and the result channel closes
//! on its own once the last worker drops its context handle.
//!
//! [`WorkQueue`]: crate::queue::WorkQueue
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

use crate::{context::EngineContext, directory::Directory, pool::worker::worker_loop};
use std::sync::Arc;

/// Spawns `concurrency_level` worker tasks onto the current runtime.
///
/// Each worker dequeues up to `batch_size` descriptors per pop (the batch
/// coalescer), dispatches them as one envelope, and hands every reply to the
/// response handler before looping back.
pub(crate) fn spawn_workers<D: Directory>(
    ctx: &Arc<EngineContext<D>>,
    concurrency_level: usize,
    batch_size: usize,
) {
    for worker_id in 0..concurrency_level {
        let ctx = Arc::clone(ctx);
        tokio::spawn(worker_loop(worker_id, ctx, batch_size));
    }
}
