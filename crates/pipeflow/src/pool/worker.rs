use super::{BarrierGuard, JobError, JobResult, Processor};
use crate::stream::{Recv, SharedReceiver};
use core::{any::Any, panic::AssertUnwindSafe, time::Duration};
use futures::FutureExt;
use std::sync::Arc;
use tokio::{sync::mpsc, time::timeout};
use tokio_util::sync::CancellationToken;

/// Everything one worker task owns.
pub(crate) struct Worker<J, P: Processor<J>> {
    pub worker_id: usize,
    pub jobs: SharedReceiver<J>,
    pub results: mpsc::Sender<JobResult<J, P::Output>>,
    pub processor: Arc<P>,
    pub job_timeout: Duration,
    pub cancel: CancellationToken,
    pub guard: BarrierGuard,
}

/// Worker task pulling jobs from the shared queue until it is closed and
/// drained.
///
/// Each job produces exactly one [`JobResult`] on the result queue, whether
/// `process` succeeds, fails, times out or panics. The loop exits when:
/// - the job queue is closed and empty,
/// - `cancel` is raised (an in-flight job is abandoned without a result), or
/// - the result queue has no reader left.
///
/// The worker drops its result sender before its barrier guard, so the result
/// queue can only close after this worker has sent its last result.
pub(crate) async fn worker_loop<J, P>(worker: Worker<J, P>)
where
    J: Clone + Send + 'static,
    P: Processor<J>,
{
    let Worker {
        worker_id: _worker_id,
        mut jobs,
        results,
        processor,
        job_timeout,
        cancel,
        guard,
    } = worker;

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {_worker_id} started");

    loop {
        let job = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Worker {_worker_id} cancelled while idle");
                break;
            }
            job = jobs.recv() => match job {
                Some(job) => job,
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!("Worker {_worker_id} found job queue closed");
                    break;
                }
            },
        };

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Worker {_worker_id} abandoned in-flight job on cancel");
                break;
            }
            outcome = run_job(processor.as_ref(), job.clone(), job_timeout) => outcome,
        };

        #[cfg(feature = "tracing")]
        {
            if let Err(e) = &outcome {
                tracing::debug!("Worker {_worker_id} job failed: {e}");
            }
        }

        let result = JobResult { job, outcome };
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            sent = results.send(result) => {
                if sent.is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Worker {_worker_id} result queue closed");
                    break;
                }
            }
        }
    }

    drop(results);
    drop(guard);

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {_worker_id} stopped");
}

/// Runs one job under the per-job timeout, turning a panic into a failure.
async fn run_job<J, P>(processor: &P, job: J, job_timeout: Duration) -> Result<P::Output, JobError>
where
    P: Processor<J>,
{
    // Deferred into the future so a processor panicking before its first
    // poll is caught too.
    let call = AssertUnwindSafe(async move { processor.process(job).await }).catch_unwind();
    match timeout(job_timeout, call).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(panic)) => Err(JobError::Panicked(panic_message(panic.as_ref()))),
        Err(_) => Err(JobError::TimedOut(job_timeout)),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
