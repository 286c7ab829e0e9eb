//! Shared work queue and completion accounting.
//!
//! The queue is a concurrent multiset of pending [`PageRequest`]s drained by
//! every worker. It is unbounded: inflow is naturally limited by the number
//! of outstanding remote calls, which the worker pool caps at the configured
//! concurrency level.
//!
//! Because finished pages can spawn new work (continuations), "queue empty"
//! alone does not mean "done". Completion is tracked by an atomic in-flight
//! counter covering every descriptor that is queued or currently executing:
//!
//! - incremented before every enqueue (initial, continuation, or retry);
//! - decremented only after a dequeued descriptor has been fully processed
//!   *and* any continuation it spawned has already been enqueued.
//!
//! The decrement-last discipline means the counter can never transiently
//! read zero while a continuation is in flight but not yet counted. The
//! counter reaching zero is exactly the engine's termination condition; it
//! closes the channel and blocked workers drain out. A negative counter is a
//! correctness bug and poisons the queue fatally.

use crate::{
    descriptor::{BatchEnvelope, PageRequest},
    error::{Error, Result},
};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio_util::sync::CancellationToken;

pub(crate) struct WorkQueue {
    tx: async_channel::Sender<PageRequest>,
    rx: async_channel::Receiver<PageRequest>,
    in_flight: AtomicI64,
}

impl WorkQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = async_channel::unbounded();
        Self {
            tx,
            rx,
            in_flight: AtomicI64::new(0),
        }
    }

    /// Number of descriptors queued or currently executing.
    pub(crate) fn in_flight(&self) -> i64 {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Enqueues a descriptor, counting it as in-flight first.
    ///
    /// Enqueueing onto a closed queue is a no-op: it can only happen after
    /// cancellation, when the remaining work is being abandoned anyway.
    pub(crate) fn push(&self, req: PageRequest) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        if let Err(_e) = self.tx.try_send(req) {
            // Closed mid-cancellation; the descriptor will never run, so it
            // must not be counted.
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            tracing::trace!("Discarding descriptor enqueued after close");
        }
    }

    /// Dequeues up to `max` descriptors as one envelope.
    ///
    /// The first descriptor is awaited; any further ones are taken only if
    /// already queued, so coalescing never delays a lone request. Returns
    /// `None` once the queue is closed (all work complete) or the token is
    /// cancelled.
    pub(crate) async fn pop_batch(
        &self,
        max: usize,
        cancel: &CancellationToken,
    ) -> Option<BatchEnvelope> {
        let first = tokio::select! {
            biased;
            () = cancel.cancelled() => return None,
            recv = self.rx.recv() => recv.ok()?,
        };

        let mut requests = vec![first];
        while requests.len() < max {
            match self.rx.try_recv() {
                Ok(req) => requests.push(req),
                Err(_) => break,
            }
        }
        Some(BatchEnvelope::new(requests))
    }

    /// Marks one dequeued descriptor as fully processed.
    ///
    /// Must be called exactly once per dequeued descriptor, after its
    /// continuation (if any) has been pushed. Closes the queue when the
    /// counter reaches zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolation`] if the counter would go
    /// negative. This is fatal for the whole fetch.
    pub(crate) fn complete_one(&self) -> Result<()> {
        let prev = self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if prev < 1 {
            return Err(Error::InvariantViolation {
                reason: format!("in-flight counter dropped below zero (was {prev})"),
            });
        }
        if prev == 1 {
            // Last descriptor done and nothing re-enqueued: terminate.
            self.close();
        }
        Ok(())
    }

    /// Closes the queue; blocked and future pops return `None`.
    pub(crate) fn close(&self) {
        self.tx.close();
    }
}
