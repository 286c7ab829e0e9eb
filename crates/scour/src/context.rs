//! Shared per-fetch state handed to every worker.
//!
//! One [`EngineContext`] exists per `fetch` invocation. It is created when
//! the fetch starts and dropped once the last worker (or deferred retry
//! task) releases its handle — which is also what closes the result channel
//! and ends the caller's stream.

use crate::{
    directory::Directory,
    error::{DirectoryError, Error},
    queue::WorkQueue,
    retry::RetryPolicy,
    stream::PartitionFailure,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Everything a worker needs: the collaborator, the queue, the result
/// channel, the failure log, the retry policy, and the cancellation token.
///
/// The queue, the failure log, and the channel are the only shared mutable
/// state in the engine; descriptors and items are immutable values.
pub(crate) struct EngineContext<D: Directory> {
    pub directory: Arc<D>,
    pub queue: WorkQueue,
    pub items: mpsc::Sender<Result<D::Entry, Error>>,
    pub failures: Arc<FailureLog>,
    pub retry: RetryPolicy,
    pub cancel: CancellationToken,
}

impl<D: Directory> EngineContext<D> {
    /// Aborts the whole fetch after an engine-invariant violation.
    ///
    /// Best-effort surfaces the error to the consumer, then tears down the
    /// queue and cancels every worker and pending retry.
    pub(crate) async fn abort(&self, fatal: Error) {
        tracing::error!(error = %fatal, "Aborting fetch");
        if self.items.send(Err(fatal)).await.is_err() {
            tracing::warn!("Consumer gone before fatal error could be surfaced");
        }
        self.queue.close();
        self.cancel.cancel();
    }
}

/// Append-only record of permanently failed partitions.
///
/// Written by workers, read by the caller through
/// [`FetchStream::report`](crate::FetchStream::report).
#[derive(Debug, Default)]
pub(crate) struct FailureLog {
    inner: parking_lot::Mutex<Vec<PartitionFailure>>,
}

impl FailureLog {
    pub(crate) fn record(&self, partition: usize, error: DirectoryError) {
        self.inner.lock().push(PartitionFailure { partition, error });
    }

    pub(crate) fn snapshot(&self) -> Vec<PartitionFailure> {
        self.inner.lock().clone()
    }
}
