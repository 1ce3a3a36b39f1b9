//! Error types for pipeline and pool coordination.
//!
//! [`Error`] covers failures of the plumbing itself: a raised cancellation
//! signal, a channel that closed underneath a producer, an invalid
//! configuration, or a shutdown that did not finish in time. Failures of an
//! individual job are not errors of the pool; they travel as
//! [`JobError`](crate::JobError) inside a [`JobResult`](crate::JobResult).
//!
//! ## Error Cases
//! - `Cancelled`: The shared cancellation token was raised.
//! - `ChannelError`: A queue was closed while a task still expected it open.
//! - `InvalidConfig`: A width, capacity or timeout was out of range.
//! - `ShutdownTimedOut`: Workers were still running when the shutdown
//!   deadline passed.

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for stream and pool coordination.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The cancellation token was raised before the operation completed.
    #[error("Operation cancelled")]
    Cancelled,

    /// Internal channel send/receive failure (e.g., all receivers dropped).
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// A configuration value was rejected.
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    /// Shutdown gave up waiting on workers that had not stopped yet.
    #[error("Shutdown timed out with {remaining} workers still active")]
    ShutdownTimedOut { remaining: usize },
}
