//! Request and response value types exchanged between the scheduler, the
//! worker pool, and the remote collaborator.
//!
//! These are plain immutable values: a [`PageRequest`] is created once (by the
//! partitioner, by the response handler for a continuation, or by the retry
//! layer with a bumped attempt count) and consumed exactly once by a worker.
//! None of them require synchronization.

use crate::partition::KeyRange;

/// An opaque continuation token from a paginated response.
///
/// The engine never inspects the contents; it is carried back verbatim on the
/// follow-up request for the same partition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A deferred request descriptor: one page-sized unit of remote work.
///
/// Initial descriptors are produced by the partitioner with no cursor;
/// continuation descriptors are produced by the response handler and carry
/// the cursor returned by the previous page. The `attempt` counter is zero
/// except on retry descriptors re-enqueued after a transient failure.
#[derive(Clone, Debug)]
pub struct PageRequest {
    /// Index of the partition this request belongs to.
    pub partition: usize,
    /// The sortable attribute the key space is partitioned on.
    pub attribute: String,
    /// Half-open key range filter for this partition.
    pub range: KeyRange,
    /// Page-size hint passed to the remote API.
    pub page_size: usize,
    /// Continuation token, absent on a partition's first page.
    pub cursor: Option<Cursor>,
    /// Retry attempt number (0 = first try).
    pub attempt: u32,
}

impl PageRequest {
    /// The follow-up descriptor for the next page of the same partition.
    ///
    /// Continuations restart the attempt counter: the retry budget applies
    /// per page, not per partition.
    pub fn continuation(&self, cursor: Cursor) -> Self {
        Self {
            partition: self.partition,
            attribute: self.attribute.clone(),
            range: self.range.clone(),
            page_size: self.page_size,
            cursor: Some(cursor),
            attempt: 0,
        }
    }

    /// The same logical request with the attempt counter bumped.
    pub fn retry(&self) -> Self {
        Self {
            attempt: self.attempt + 1,
            cursor: self.cursor.clone(),
            range: self.range.clone(),
            attribute: self.attribute.clone(),
            ..*self
        }
    }
}

/// A bounded group of descriptors dispatched together as one wire-level call.
///
/// Coalescing amortizes per-call overhead when the backend supports it. With
/// `batch_size == 1` every envelope holds a single descriptor and batching is
/// effectively disabled.
#[derive(Clone, Debug)]
pub struct BatchEnvelope {
    requests: Vec<PageRequest>,
}

impl BatchEnvelope {
    /// Wraps already-dequeued descriptors. The queue enforces the size bound.
    pub(crate) fn new(requests: Vec<PageRequest>) -> Self {
        debug_assert!(!requests.is_empty());
        Self { requests }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn requests(&self) -> &[PageRequest] {
        &self.requests
    }

    pub fn into_requests(self) -> Vec<PageRequest> {
        self.requests
    }
}

/// One page of results from the remote collaborator.
///
/// `cursor` is `Some` when more pages exist for the originating descriptor's
/// partition, `None` when that partition is exhausted.
#[derive(Clone, Debug)]
pub struct Page<E> {
    pub entries: Vec<E>,
    pub cursor: Option<Cursor>,
}

impl<E> Page<E> {
    /// A terminal page carrying no continuation.
    pub fn last(entries: Vec<E>) -> Self {
        Self {
            entries,
            cursor: None,
        }
    }

    /// A page followed by more results.
    pub fn with_cursor(entries: Vec<E>, cursor: Cursor) -> Self {
        Self {
            entries,
            cursor: Some(cursor),
        }
    }
}
