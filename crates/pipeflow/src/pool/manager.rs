//! Bounded worker pool with a shared job queue and a shared result queue.
//!
//! This module defines the [`WorkerPool`] struct, which starts a fixed number
//! of worker tasks before any job is submitted. Workers compete for jobs on a
//! single bounded queue (whichever worker is idle claims the next job), call
//! the shared [`Processor`], and push one [`JobResult`] per job onto a single
//! bounded result queue drained by one collector.
//!
//! No worker ever writes into another task's state: results only travel
//! through the result queue. A [`CompletionBarrier`] counts the running
//! workers; a closer task drops the last result sender once the barrier fires,
//! which is what ends the collector's loop.
//!
//! ## Lifecycle
//!
//! ```text
//! Filling --close()--> Draining --next_result()--> Collecting --None--> Done
//! ```

use super::{
    CompletionBarrier, JobResult, PoolConfig, Processor,
    worker::{Worker, worker_loop},
};
use crate::{Error, Result, stream::SharedReceiver};
use core::time::Duration;
use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinHandle, time::timeout};
use tokio_util::sync::CancellationToken;

/// Where a [`WorkerPool`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolState {
    /// The pool still holds its own job queue handle; jobs may be submitted.
    Filling,
    /// The pool's job handle is closed. Workers finish the queued jobs and
    /// exit once every other [`JobQueue`] handle is dropped too.
    Draining,
    /// The collector is reading results of a closed pool.
    Collecting,
    /// Every worker finished and the result queue is closed and drained.
    Done,
}

/// Producer handle for a pool's bounded job queue.
///
/// Cloneable so several producers can feed one pool. The queue closes once
/// every handle (including the pool's own, see [`WorkerPool::close`]) is
/// dropped.
pub struct JobQueue<J> {
    tx: mpsc::Sender<J>,
    cancel: CancellationToken,
}

impl<J> Clone for JobQueue<J> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<J: Send> JobQueue<J> {
    /// Enqueues one job, waiting while the queue is full.
    ///
    /// # Errors
    ///
    /// - [`Error::Cancelled`] if the pool's cancellation token is raised
    ///   before the job is accepted.
    /// - [`Error::ChannelError`] if every worker has already exited.
    pub async fn submit(&self, job: J) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Error::Cancelled),
            sent = self.tx.send(job) => sent.map_err(|_| Error::ChannelError {
                context: "Job queue closed".to_string(),
            }),
        }
    }

    /// Free slots left in the job queue.
    pub fn capacity(&self) -> usize {
        self.tx.capacity()
    }
}

/// A fixed-size pool of workers running a [`Processor`] over submitted jobs.
///
/// Created with [`WorkerPool::spawn`]. Submit jobs with
/// [`WorkerPool::submit`] or through [`JobQueue`] handles, then
/// [`close`](WorkerPool::close) the pool and drain it with
/// [`next_result`](WorkerPool::next_result) or
/// [`collect`](WorkerPool::collect).
///
/// Submitting and collecting must run concurrently once more jobs are
/// submitted than the two queues can hold; see [`run_pool`](super::run_pool)
/// for the composed form.
pub struct WorkerPool<J, T> {
    jobs: Option<JobQueue<J>>,
    results: mpsc::Receiver<JobResult<J, T>>,
    workers: Vec<JoinHandle<()>>,
    barrier: CompletionBarrier,
    cancel: CancellationToken,
    state: PoolState,
    shutdown_timeout: Duration,
}

impl<J, T> WorkerPool<J, T>
where
    J: Clone + Send + 'static,
    T: Send + 'static,
{
    /// Validates `config` and starts `config.worker_count` workers.
    ///
    /// The pool observes a child of `cancel`: raising `cancel` stops the pool,
    /// while [`WorkerPool::shutdown`] stops only this pool.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` fails
    /// [`PoolConfig::validate`].
    pub fn spawn<P>(config: &PoolConfig, processor: P, cancel: CancellationToken) -> Result<Self>
    where
        P: Processor<J, Output = T>,
    {
        config.validate()?;

        let cancel = cancel.child_token();
        let (job_tx, job_rx) = mpsc::channel(config.queue_capacity);
        let (result_tx, result_rx) = mpsc::channel(config.result_capacity);
        let jobs = SharedReceiver::new(job_rx);
        let processor = Arc::new(processor);
        let (barrier, guards) = CompletionBarrier::with_guards(config.worker_count);

        let workers: Vec<_> = guards
            .into_iter()
            .enumerate()
            .map(|(worker_id, guard)| {
                tokio::spawn(worker_loop(Worker {
                    worker_id,
                    jobs: jobs.clone(),
                    results: result_tx.clone(),
                    processor: Arc::clone(&processor),
                    job_timeout: config.job_timeout,
                    cancel: cancel.clone(),
                    guard,
                }))
            })
            .collect();

        // The closer owns the original result sender and only lets go of it
        // once every worker has dropped its clone and its guard.
        let closer = barrier.clone();
        tokio::spawn(async move {
            closer.wait().await;
            drop(result_tx);

            #[cfg(feature = "tracing")]
            tracing::debug!("All workers finished, result queue closed");
        });

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Started worker pool with {} workers (job queue {}, result queue {})",
            config.worker_count,
            config.queue_capacity,
            config.result_capacity
        );

        Ok(Self {
            jobs: Some(JobQueue {
                tx: job_tx,
                cancel: cancel.clone(),
            }),
            results: result_rx,
            workers,
            barrier,
            cancel,
            state: PoolState::Filling,
            shutdown_timeout: config.shutdown_timeout,
        })
    }

    pub const fn state(&self) -> PoolState {
        self.state
    }

    /// Number of workers the pool was started with.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Number of workers that have not exited yet.
    pub fn active_workers(&self) -> usize {
        self.barrier.active()
    }

    /// Returns a producer handle, e.g. to feed the pool from another task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelError`] if the pool was already closed.
    pub fn job_queue(&self) -> Result<JobQueue<J>> {
        self.jobs.clone().ok_or_else(|| Error::ChannelError {
            context: "Job queue already closed".to_string(),
        })
    }

    /// Enqueues one job through the pool's own handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelError`] if the pool was already closed, and
    /// otherwise the errors of [`JobQueue::submit`].
    pub async fn submit(&self, job: J) -> Result<()> {
        match &self.jobs {
            Some(queue) => queue.submit(job).await,
            None => Err(Error::ChannelError {
                context: "Job queue already closed".to_string(),
            }),
        }
    }

    /// Drops the pool's own job handle.
    ///
    /// The job queue closes once the remaining [`JobQueue`] handles are
    /// dropped as well; workers then drain what is queued and exit.
    pub fn close(&mut self) {
        if self.jobs.take().is_some() {
            #[cfg(feature = "tracing")]
            tracing::debug!("Job queue closed by pool");
            self.state = PoolState::Draining;
        }
    }

    /// Waits for the next result.
    ///
    /// Returns `None` once every worker has exited and all results were read.
    /// Results arrive in completion order, not submission order.
    pub async fn next_result(&mut self) -> Option<JobResult<J, T>> {
        if self.state == PoolState::Draining {
            self.state = PoolState::Collecting;
        }

        let result = self.results.recv().await;
        if result.is_none() {
            self.state = PoolState::Done;
        }
        result
    }

    /// Closes the pool and drains every remaining result.
    pub async fn collect(mut self) -> Vec<JobResult<J, T>> {
        self.close();

        let mut results = Vec::new();
        while let Some(result) = self.next_result().await {
            results.push(result);
        }

        #[cfg(feature = "tracing")]
        tracing::info!("Collected {} results", results.len());

        results
    }

    /// Stops the pool without draining it.
    ///
    /// - Closes the pool's job handle and raises the pool's cancellation
    ///   token, so idle workers exit and in-flight jobs are abandoned.
    /// - Waits up to [`PoolConfig::shutdown_timeout`] for every worker to
    ///   stop; stragglers are then aborted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShutdownTimedOut`] if some workers had to be aborted.
    pub async fn shutdown(mut self) -> Result<()> {
        #[cfg(feature = "tracing")]
        tracing::info!("Shutting down worker pool ({} active)", self.active_workers());

        self.close();
        self.cancel.cancel();

        match timeout(self.shutdown_timeout, self.barrier.wait()).await {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                tracing::info!("Worker pool shutdown complete");
                Ok(())
            }
            Err(_) => {
                let remaining = self.active_workers();
                #[cfg(feature = "tracing")]
                tracing::warn!("Worker pool shutdown timed out ({remaining} workers still active)");
                for worker in &self.workers {
                    worker.abort();
                }
                Err(Error::ShutdownTimedOut { remaining })
            }
        }
    }
}
