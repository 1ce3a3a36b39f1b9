use super::{JobResult, PoolConfig, Processor, WorkerPool};
use crate::{Error, Result};
use tokio_util::sync::CancellationToken;

/// Runs every job in `jobs` through a fresh [`WorkerPool`] and returns all
/// results.
///
/// Jobs are fed from a separate producer task while the caller's task
/// collects, so bounded queues smaller than the job count cannot deadlock.
/// Exactly one result is returned per job, in completion order.
///
/// If `cancel` is raised mid-run the producer stops, workers abandon what
/// they hold, and the results gathered so far are returned; check
/// `cancel.is_cancelled()` to tell a partial run from a complete one.
///
/// # Errors
///
/// - [`Error::InvalidConfig`] if `config` is invalid.
/// - [`Error::ChannelError`] if the producer task could not hand over its
///   jobs for any reason other than cancellation.
pub async fn run_pool<J, P, I>(
    config: PoolConfig,
    jobs: I,
    processor: P,
    cancel: CancellationToken,
) -> Result<Vec<JobResult<J, P::Output>>>
where
    J: Clone + Send + 'static,
    P: Processor<J>,
    I: IntoIterator<Item = J>,
    I::IntoIter: Send + 'static,
{
    let mut pool = WorkerPool::spawn(&config, processor, cancel)?;
    let queue = pool.job_queue()?;
    let jobs = jobs.into_iter();

    let producer = tokio::spawn(async move {
        let mut submitted = 0_usize;
        for job in jobs {
            queue.submit(job).await?;
            submitted += 1;
        }
        Ok::<_, Error>(submitted)
    });

    pool.close();
    let results = pool.collect().await;

    match producer.await {
        Ok(Ok(_submitted)) => {
            #[cfg(feature = "tracing")]
            tracing::debug!("Producer submitted {_submitted} jobs");
            Ok(results)
        }
        Ok(Err(Error::Cancelled)) => {
            #[cfg(feature = "tracing")]
            tracing::warn!("Run cancelled with {} results collected", results.len());
            Ok(results)
        }
        Ok(Err(e)) => Err(e),
        Err(e) => Err(Error::ChannelError {
            context: format!("Producer task failed: {e}"),
        }),
    }
}
