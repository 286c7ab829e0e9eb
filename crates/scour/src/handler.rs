//! Response handling and pagination.
//!
//! This is the only place descriptors are created after initial
//! partitioning, which is what makes the fetch data-driven rather than a
//! predetermined request list. For every completed page the handler:
//!
//! 1. emits each entry to the result channel immediately (item-at-a-time,
//!    never buffered until the page is fully processed, to minimize
//!    time-to-first-result);
//! 2. enqueues exactly one continuation descriptor if the page carries a
//!    cursor;
//! 3. releases the descriptor's in-flight slot — strictly after step 2, so
//!    the termination counter can never transiently read zero while a
//!    continuation exists but is not yet counted.
//!
//! Transient failures re-enqueue the same logical descriptor after a
//! jittered backoff; the sleep happens on a spawned task so the worker that
//! hit the failure goes straight back to the queue. Permanent failures (or
//! an exhausted retry budget) abandon the partition: its failure is recorded
//! for the caller's report and every other partition continues unaffected.

use crate::{
    context::EngineContext,
    descriptor::{Page, PageRequest},
    directory::Directory,
    error::{DirectoryError, Result},
};
use std::sync::Arc;

/// Processes one reply from the remote collaborator.
///
/// # Errors
///
/// Returns an error only for engine-invariant violations, which the caller
/// must treat as fatal for the whole fetch.
pub(crate) async fn handle_reply<D: Directory>(
    ctx: &Arc<EngineContext<D>>,
    req: PageRequest,
    result: core::result::Result<Page<D::Entry>, DirectoryError>,
) -> Result<()> {
    match result {
        Ok(page) => handle_page(ctx, req, page).await,
        Err(err) if err.is_transient() && ctx.retry.should_retry(req.attempt) => {
            schedule_retry(ctx, req, err);
            Ok(())
        }
        Err(err) => {
            tracing::warn!(
                partition = req.partition,
                attempt = req.attempt,
                error = %err,
                "Partition abandoned"
            );
            ctx.failures.record(req.partition, err);
            ctx.queue.complete_one()
        }
    }
}

async fn handle_page<D: Directory>(
    ctx: &Arc<EngineContext<D>>,
    req: PageRequest,
    page: Page<D::Entry>,
) -> Result<()> {
    for entry in page.entries {
        // Cancellation checkpoint before every emission.
        if ctx.cancel.is_cancelled() {
            break;
        }
        if ctx.items.send(Ok(entry)).await.is_err() {
            // The consumer dropped the stream; abandon the rest promptly.
            tracing::debug!(partition = req.partition, "Consumer gone, cancelling fetch");
            ctx.cancel.cancel();
            break;
        }
    }

    if !ctx.cancel.is_cancelled() {
        if let Some(cursor) = page.cursor {
            ctx.queue.push(req.continuation(cursor));
        }
    }

    // Only after the continuation is counted.
    ctx.queue.complete_one()
}

/// Re-enqueues `req` after a backoff delay without stalling the worker.
///
/// The descriptor stays counted as in-flight for the entire wait: its slot
/// is released only after the bumped descriptor has been pushed, preserving
/// the termination invariant across the sleep.
fn schedule_retry<D: Directory>(ctx: &Arc<EngineContext<D>>, req: PageRequest, err: DirectoryError) {
    let delay = ctx.retry.delay_for(req.attempt);
    tracing::debug!(
        partition = req.partition,
        attempt = req.attempt,
        delay_ms = delay.as_millis() as u64,
        error = %err,
        "Transient failure, retrying"
    );

    let retry_req = req.retry();
    let ctx = Arc::clone(ctx);
    tokio::spawn(async move {
        tokio::select! {
            () = ctx.cancel.cancelled() => {}
            () = tokio::time::sleep(delay) => ctx.queue.push(retry_req),
        }
        if let Err(fatal) = ctx.queue.complete_one() {
            ctx.abort(fatal).await;
        }
    });
}
