use super::JobError;
use core::future::Future;

/// The per-job capability a [`WorkerPool`](super::WorkerPool) invokes.
///
/// One processor is shared by every worker, so implementations must be
/// `Sync` and must not rely on exclusive access. A processor only reports
/// failure through its return value; the pool neither retries nor drops jobs
/// on its behalf.
pub trait Processor<J>: Send + Sync + 'static {
    type Output: Send + 'static;

    /// Handles one job.
    ///
    /// The pool bounds the returned future with
    /// [`PoolConfig::job_timeout`](super::PoolConfig::job_timeout), so the
    /// implementation does not need its own outer deadline.
    ///
    /// # Errors
    ///
    /// Returns the [`JobError`] describing why this job failed.
    fn process(&self, job: J) -> impl Future<Output = Result<Self::Output, JobError>> + Send;
}

/// A [`Processor`] backed by a closure returning a future.
///
/// Built with [`processor_fn`].
#[derive(Clone)]
pub struct FnProcessor<F> {
    f: F,
}

/// Wraps `f` as a [`Processor`].
///
/// ```
/// use pipeflow::{JobError, processor_fn};
///
/// let double = processor_fn(|n: u32| async move {
///     n.checked_mul(2)
///         .ok_or_else(|| JobError::Domain(format!("{n} overflows")))
/// });
/// # let _ = double;
/// ```
pub const fn processor_fn<J, F, Fut, T>(f: F) -> FnProcessor<F>
where
    F: Fn(J) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, JobError>> + Send,
    T: Send + 'static,
{
    FnProcessor { f }
}

impl<J, F, Fut, T> Processor<J> for FnProcessor<F>
where
    F: Fn(J) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, JobError>> + Send,
    T: Send + 'static,
{
    type Output = T;

    fn process(&self, job: J) -> impl Future<Output = Result<T, JobError>> + Send {
        (self.f)(job)
    }
}
