use super::telemetry::{increment_job_failures, increment_jobs_processed, record_job_duration};
use core::future::Future;
use pipeflow::{JobError, Processor};
use std::time::Instant;

/// Wraps a [`Processor`] and records job counts, failures and durations.
///
/// Jobs abandoned by the pool (timeout, cancellation) are not recorded: their
/// future is dropped before it finishes.
pub struct Metered<P> {
    inner: P,
}

impl<P> Metered<P> {
    pub const fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<J, P> Processor<J> for Metered<P>
where
    J: Send + 'static,
    P: Processor<J>,
{
    type Output = P::Output;

    fn process(&self, job: J) -> impl Future<Output = Result<P::Output, JobError>> + Send {
        async move {
            let start = Instant::now();
            let outcome = self.inner.process(job).await;

            record_job_duration(start.elapsed().as_secs_f64() * 1_000.0);
            increment_jobs_processed();
            if let Err(e) = &outcome {
                increment_job_failures(failure_kind(e));
            }

            outcome
        }
    }
}

/// Low-cardinality label for a failure.
pub const fn failure_kind(error: &JobError) -> &'static str {
    match error {
        JobError::Transport(_) => "transport",
        JobError::TimedOut(_) => "timed_out",
        JobError::Protocol { .. } => "protocol",
        JobError::Decode(_) => "decode",
        JobError::Domain(_) => "domain",
        JobError::Panicked(_) => "panicked",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use pipeflow::processor_fn;

    #[tokio::test]
    async fn passes_outcomes_through_unchanged() {
        let inner = processor_fn(|n: u32| async move {
            if n == 0 {
                Err(JobError::Domain("zero".to_string()))
            } else {
                Ok(n + 1)
            }
        });
        let metered = Metered::new(inner);

        assert_eq!(metered.process(1).await, Ok(2));
        assert_eq!(metered.process(0).await, Err(JobError::Domain("zero".to_string())));
    }

    #[test]
    fn failure_kinds_are_distinct() {
        let kinds = [
            failure_kind(&JobError::Transport(String::new())),
            failure_kind(&JobError::TimedOut(Duration::ZERO)),
            failure_kind(&JobError::Protocol { status: 500 }),
            failure_kind(&JobError::Decode(String::new())),
            failure_kind(&JobError::Domain(String::new())),
            failure_kind(&JobError::Panicked(String::new())),
        ];
        let unique: std::collections::HashSet<_> = kinds.iter().collect();
        assert_eq!(unique.len(), kinds.len());
    }
}
