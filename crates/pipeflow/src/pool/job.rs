use core::time::Duration;

/// Why a single job failed.
///
/// Every variant is local to one job: it is reported in that job's
/// [`JobResult`] and never stops sibling workers or the pool.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum JobError {
    /// The call could not reach the remote side (connect, reset, DNS, ...).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The call did not finish within the per-job bound.
    #[error("Timed out after {0:?}")]
    TimedOut(Duration),

    /// The remote side answered with a non-success status.
    #[error("Unexpected status {status}")]
    Protocol { status: u16 },

    /// The payload could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The payload was well formed but marks the key as invalid.
    #[error("Rejected: {0}")]
    Domain(String),

    /// The processor panicked while handling the job.
    #[error("Processor panicked: {0}")]
    Panicked(String),
}

/// The outcome of one job, tagged with the job that produced it.
///
/// Failed jobs carry their key too, so they can be reported rather than
/// silently lost.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobResult<J, T> {
    pub job: J,
    pub outcome: Result<T, JobError>,
}

impl<J, T> JobResult<J, T> {
    pub const fn success(job: J, value: T) -> Self {
        Self {
            job,
            outcome: Ok(value),
        }
    }

    pub const fn failure(job: J, error: JobError) -> Self {
        Self {
            job,
            outcome: Err(error),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub const fn is_failure(&self) -> bool {
        self.outcome.is_err()
    }
}
