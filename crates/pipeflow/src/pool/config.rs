use crate::{Error, Result};
use core::time::Duration;

/// Default bound on a single [`Processor::process`](super::Processor::process)
/// call.
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time [`WorkerPool::shutdown`](super::WorkerPool::shutdown) waits
/// for workers to acknowledge cancellation.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

/// Sizing and timing of a [`WorkerPool`](super::WorkerPool).
///
/// Queue capacities are explicit: the job queue bounds how far producers can
/// run ahead of the workers, and the result queue bounds how far workers can
/// run ahead of the collector. Both default to `worker_count`, which keeps at
/// most one queued job and one queued result per worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of concurrent workers.
    pub worker_count: usize,
    /// Capacity of the shared job queue.
    pub queue_capacity: usize,
    /// Capacity of the shared result queue.
    pub result_capacity: usize,
    /// Upper bound on one `process` call. A job that exceeds it yields a
    /// [`JobError::TimedOut`](super::JobError::TimedOut) result.
    pub job_timeout: Duration,
    /// How long [`WorkerPool::shutdown`](super::WorkerPool::shutdown) waits
    /// for workers to stop.
    pub shutdown_timeout: Duration,
}

impl PoolConfig {
    pub const fn new(worker_count: usize) -> Self {
        Self {
            worker_count,
            queue_capacity: worker_count,
            result_capacity: worker_count,
            job_timeout: DEFAULT_JOB_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    #[must_use]
    pub const fn with_result_capacity(mut self, capacity: usize) -> Self {
        self.result_capacity = capacity;
        self
    }

    #[must_use]
    pub const fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Checks that the pool can be built from this config.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the worker count or either queue
    /// capacity is zero, or if the job timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(invalid("worker_count must be greater than 0"));
        }
        // Tokio's bounded channels panic on a zero capacity.
        if self.queue_capacity == 0 {
            return Err(invalid("queue_capacity must be greater than 0"));
        }
        if self.result_capacity == 0 {
            return Err(invalid("result_capacity must be greater than 0"));
        }
        if self.job_timeout.is_zero() {
            return Err(invalid("job_timeout must be greater than 0"));
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(1)
    }
}

fn invalid(reason: &str) -> Error {
    Error::InvalidConfig {
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacities_default_to_worker_count() {
        let config = PoolConfig::new(4);
        assert_eq!(config.queue_capacity, 4);
        assert_eq!(config.result_capacity, 4);
        assert_eq!(config.job_timeout, DEFAULT_JOB_TIMEOUT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_overrides_capacities() {
        let config = PoolConfig::new(2)
            .with_queue_capacity(100)
            .with_result_capacity(7)
            .with_job_timeout(Duration::from_millis(250));
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.result_capacity, 7);
        assert_eq!(config.job_timeout, Duration::from_millis(250));
    }

    #[test]
    fn rejects_zero_sizes() {
        for config in [
            PoolConfig::new(0),
            PoolConfig::new(1).with_queue_capacity(0),
            PoolConfig::new(1).with_result_capacity(0),
            PoolConfig::new(1).with_job_timeout(Duration::ZERO),
        ] {
            assert!(matches!(
                config.validate(),
                Err(Error::InvalidConfig { .. })
            ));
        }
    }
}
