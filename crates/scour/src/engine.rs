//! Engine assembly and the caller-facing contract.
//!
//! A [`Fetcher`] owns the remote collaborator and a validated
//! [`FetchConfig`]. Every [`Fetcher::fetch`] call is an independent engine
//! invocation: the partitioner seeds the shared queue with one initial
//! descriptor per partition, a pool of `concurrency_level` workers drains
//! it (following continuations as they are discovered), and results stream
//! to the caller through the returned [`FetchStream`].

use crate::{
    context::{EngineContext, FailureLog},
    directory::Directory,
    error::{Error, Result},
    partition::PartitionSpec,
    pool::manager::spawn_workers,
    queue::WorkQueue,
    retry::RetryPolicy,
    stream::FetchStream,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Tuning knobs for one fetch engine.
///
/// For read-only paginated fetches, disabling batching (`batch_size = 1`)
/// combined with a high `concurrency_level` empirically maximizes
/// throughput: coalescing amortizes per-call overhead but adds
/// serialization without reducing total round trips for GET-only
/// workloads.
#[derive(Clone, Debug)]
pub struct FetchConfig {
    /// Number of concurrent worker tasks (≥ 1).
    pub concurrency_level: usize,
    /// Maximum descriptors coalesced into one wire-level envelope (≥ 1;
    /// 1 disables coalescing).
    pub batch_size: usize,
    /// Page-size hint passed to the remote API on every request. Should be
    /// the maximum the API allows.
    pub page_size: usize,
    /// Retry policy for transient remote failures.
    pub retry: RetryPolicy,
    /// Capacity of the result channel between workers and the consumer.
    /// Lower values increase backpressure responsiveness; higher values
    /// let slow consumers lag further behind the fetch.
    pub stream_buffer: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency_level: 8,
            batch_size: 1,
            page_size: 999,
            retry: RetryPolicy::default(),
            stream_buffer: 256,
        }
    }
}

impl FetchConfig {
    /// Checks the caller-tunable bounds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency_level == 0 {
            return Err(Error::InvalidConfig {
                reason: "concurrency_level must be at least 1".into(),
            });
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig {
                reason: "batch_size must be at least 1".into(),
            });
        }
        if self.page_size == 0 {
            return Err(Error::InvalidConfig {
                reason: "page_size must be at least 1".into(),
            });
        }
        if self.stream_buffer == 0 {
            return Err(Error::InvalidConfig {
                reason: "stream_buffer must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// The concurrent, partitioned fetch engine.
///
/// Cheap to clone per fetch is not needed: one `Fetcher` can run any number
/// of sequential or overlapping fetches, each with its own queue, workers,
/// and stream.
pub struct Fetcher<D: Directory> {
    directory: Arc<D>,
    config: FetchConfig,
}

impl<D: Directory> Fetcher<D> {
    /// Builds a fetcher over `directory` with a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if any bound in `config` is
    /// violated.
    pub fn new(directory: D, config: FetchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            directory: Arc::new(directory),
            config,
        })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// The remote collaborator this fetcher drives.
    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Starts a partitioned fetch of the full collection described by
    /// `spec` and returns the lazily-consumable result sequence.
    ///
    /// Must be called within a Tokio runtime: the worker pool is spawned
    /// onto it immediately, and production begins before the stream is
    /// first polled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `spec` cannot produce a valid
    /// partition sequence.
    pub fn fetch(&self, spec: &PartitionSpec) -> Result<FetchStream<D::Entry>> {
        let partitions = spec.partitions()?;
        let (items_tx, items_rx) = mpsc::channel(self.config.stream_buffer);
        let failures = Arc::new(FailureLog::default());
        let cancel = CancellationToken::new();

        let ctx = Arc::new(EngineContext {
            directory: Arc::clone(&self.directory),
            queue: WorkQueue::new(),
            items: items_tx,
            failures: Arc::clone(&failures),
            retry: self.config.retry,
            cancel: cancel.clone(),
        });

        for partition in &partitions {
            ctx.queue.push(partition.initial_request(self.config.page_size));
        }

        tracing::debug!(
            seeded = ctx.queue.in_flight(),
            concurrency = self.config.concurrency_level,
            batch_size = self.config.batch_size,
            page_size = self.config.page_size,
            "Starting partitioned fetch"
        );

        spawn_workers(&ctx, self.config.concurrency_level, self.config.batch_size);

        Ok(FetchStream::new(items_rx, failures, cancel))
    }
}
