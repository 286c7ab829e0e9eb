//! The remote-call collaborator seam.
//!
//! The engine never talks to the network itself. Everything remote —
//! connection handling, authentication, request-shape construction, and
//! response-body parsing — sits behind [`Directory`], a single capability
//! interface taking a descriptor (or a batch envelope of them) and returning
//! parsed pages. This keeps the engine core fully testable against in-memory
//! fixtures.

use crate::{
    descriptor::{BatchEnvelope, Page, PageRequest},
    error::DirectoryError,
};
use async_trait::async_trait;

/// The outcome of one descriptor within a dispatched envelope: the
/// descriptor itself, paired with the page it produced or the error that
/// sank it.
pub type PageReply<E> = (PageRequest, Result<Page<E>, DirectoryError>);

/// A remote, paginated, directory-style API.
///
/// Implementations own the wire protocol end to end. The engine only
/// requires that a page request produces zero-or-more parsed entries plus an
/// optional continuation cursor, and that failures are classified as
/// transient or permanent via [`DirectoryError`].
#[async_trait]
pub trait Directory: Send + Sync + 'static {
    /// The parsed entity type this directory yields.
    type Entry: Send + 'static;

    /// Executes a single page request.
    ///
    /// # Errors
    ///
    /// Returns a [`DirectoryError`] carrying a transient/permanent
    /// classification. Transient errors are retried by the engine; permanent
    /// errors abandon the originating partition.
    async fn fetch_page(&self, req: &PageRequest) -> Result<Page<Self::Entry>, DirectoryError>;

    /// Executes every descriptor of a coalesced envelope.
    ///
    /// The default implementation fans the descriptors out as concurrent
    /// [`fetch_page`](Directory::fetch_page) calls, so coalescing never
    /// serializes round trips. Backends with a true wire-level batch
    /// operation should override this and issue one call for the whole
    /// envelope.
    ///
    /// One reply must be produced per descriptor; a failure of one
    /// descriptor must not swallow the replies of its envelope-mates.
    async fn fetch_batch(&self, envelope: BatchEnvelope) -> Vec<PageReply<Self::Entry>> {
        let requests = envelope.into_requests();
        let results =
            futures::future::join_all(requests.iter().map(|req| self.fetch_page(req))).await;
        requests.into_iter().zip(results).collect()
    }
}
