//! The caller-facing result stream.
//!
//! [`FetchStream`] is a single-pass, lazily-consumable sequence over a
//! bounded channel that workers append to concurrently. Items become visible
//! as soon as their page completes — long before the whole fetch finishes —
//! which is the entire point of the engine. The stream ends cleanly once the
//! termination condition holds (in-flight counter zero, queue empty) and
//! every producer has released its channel handle.
//!
//! Consumption styles:
//!
//! - `Stream`: poll it with the usual `futures`/`tokio-stream` adapters.
//! - [`FetchStream::blocking_iter`]: a blocking `Iterator` for synchronous
//!   consumers on a dedicated thread.
//! - [`FetchStream::collect`]: eagerly materialize everything, equivalent to
//!   a synchronous "wait for all results" call.
//!
//! In-stream errors are reserved for fatal conditions (engine-invariant
//! violations): the item after the error is never produced. Per-partition
//! permanent failures do *not* terminate the stream; they are reported
//! out-of-band through [`FetchStream::report`].

use crate::{
    context::FailureLog,
    error::{DirectoryError, Error},
};
use core::{
    pin::Pin,
    task::{Context, Poll},
};
use futures::Stream;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// One permanently failed partition, attached to the fetch outcome.
#[derive(Clone, Debug)]
pub struct PartitionFailure {
    /// Index of the failed partition.
    pub partition: usize,
    /// The permanent (or retry-exhausted transient) error that sank it.
    pub error: DirectoryError,
}

/// Summary of a fetch: which partitions failed permanently.
///
/// An empty report means every partition ran to exhaustion and the item
/// sequence is the complete collection.
#[derive(Clone, Debug, Default)]
pub struct FetchReport {
    pub failures: Vec<PartitionFailure>,
}

impl FetchReport {
    /// Whether every partition completed without a permanent failure.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A lazy, consume-once sequence of fetched items.
///
/// Returned by [`Fetcher::fetch`](crate::Fetcher::fetch). Dropping the
/// stream early makes the engine abandon remaining work at its next
/// emission checkpoint.
#[derive(Debug)]
pub struct FetchStream<E> {
    rx: mpsc::Receiver<Result<E, Error>>,
    failures: Arc<FailureLog>,
    cancel: CancellationToken,
}

impl<E> FetchStream<E> {
    pub(crate) fn new(
        rx: mpsc::Receiver<Result<E, Error>>,
        failures: Arc<FailureLog>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            rx,
            failures,
            cancel,
        }
    }

    /// Requests prompt abandonment: workers stop at their next dequeue or
    /// emission checkpoint. Items already buffered remain consumable.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Snapshot of the partitions that have failed permanently so far.
    ///
    /// Only final once the stream has ended; while the fetch is still
    /// running the report may grow.
    pub fn report(&self) -> FetchReport {
        FetchReport {
            failures: self.failures.snapshot(),
        }
    }

    /// Eagerly drains the stream into a `Vec`, returning the items together
    /// with the final report.
    ///
    /// # Errors
    ///
    /// Returns the fatal error if the engine aborted the fetch.
    pub async fn collect(mut self) -> Result<(Vec<E>, FetchReport), Error> {
        let mut items = Vec::new();
        while let Some(next) = self.rx.recv().await {
            items.push(next?);
        }
        Ok((items, self.report()))
    }

    /// Converts the stream into a blocking iterator for synchronous
    /// consumers.
    ///
    /// Each `next()` blocks the calling thread until an item arrives or the
    /// engine terminates. Must not be used from within the async runtime;
    /// hand it to a dedicated consumer thread.
    pub fn blocking_iter(self) -> BlockingIter<E> {
        BlockingIter {
            rx: self.rx,
            failures: self.failures,
            cancel: self.cancel,
        }
    }
}

impl<E> Stream for FetchStream<E> {
    type Item = Result<E, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

/// Blocking iterator adapter over a [`FetchStream`].
pub struct BlockingIter<E> {
    rx: mpsc::Receiver<Result<E, Error>>,
    failures: Arc<FailureLog>,
    cancel: CancellationToken,
}

impl<E> BlockingIter<E> {
    /// See [`FetchStream::cancel`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// See [`FetchStream::report`].
    pub fn report(&self) -> FetchReport {
        FetchReport {
            failures: self.failures.snapshot(),
        }
    }
}

impl<E> Iterator for BlockingIter<E> {
    type Item = Result<E, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rx.blocking_recv()
    }
}
