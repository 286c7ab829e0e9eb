//! Worker pool draining the shared work queue.
//!
//! ## Structure
//!
//! - [`manager`] - pool construction and sizing.
//! - [`worker`] - the per-task dequeue/dispatch loop.

pub(crate) mod manager;
pub(crate) mod worker;
