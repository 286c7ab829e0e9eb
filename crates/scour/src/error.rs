//! Error types for the fetch engine.
//!
//! This module defines the central `Error` enum, which captures all
//! recoverable and reportable error cases within the engine. Remote failures
//! carry a transient/permanent classification so the retry layer can decide
//! whether a descriptor is worth re-enqueueing.
//!
//! ## Error Cases
//! - `InvalidConfig`: The caller-supplied configuration was rejected up
//!   front.
//! - `InvariantViolation`: The engine's own accounting broke. Always fatal.
//!
//! Per-partition remote failures are deliberately *not* part of this enum:
//! they are isolated to the originating partition and reported out-of-band
//! through [`FetchReport`](crate::FetchReport), so one bad partition cannot
//! poison the whole fetch.

pub type Result<T> = core::result::Result<T, Error>;

/// Classification of a remote failure for retry decisions.
///
/// Transient failures (rate limiting, timeouts, 5xx-class responses) are
/// retried with backoff up to the configured attempt budget. Permanent
/// failures (auth, malformed queries, other 4xx-class responses) abandon the
/// originating partition without affecting its siblings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Worth retrying: the same request may succeed later.
    Transient,
    /// Not worth retrying: the request itself is rejected.
    Permanent,
}

/// A failure reported by the remote [`Directory`] collaborator.
///
/// [`Directory`]: crate::Directory
#[derive(Clone, Debug, thiserror::Error)]
#[error("{kind:?} directory error: {message}")]
pub struct DirectoryError {
    pub kind: ErrorKind,
    pub message: String,
}

impl DirectoryError {
    /// A retryable failure (rate limit, timeout, 5xx).
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Transient,
            message: message.into(),
        }
    }

    /// A non-retryable failure (auth, malformed query, other 4xx).
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Permanent,
            message: message.into(),
        }
    }

    /// Whether the retry layer may re-enqueue the originating descriptor.
    pub const fn is_transient(&self) -> bool {
        matches!(self.kind, ErrorKind::Transient)
    }
}

/// Unified error type for the fetch engine.
#[derive(Clone, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The caller-supplied configuration was invalid.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The engine's own bookkeeping broke (e.g., the in-flight counter went
    /// negative). Indicates a correctness bug, not an environmental
    /// condition; the fetch is aborted.
    #[error("Engine invariant violated: {reason}")]
    InvariantViolation { reason: String },
}
