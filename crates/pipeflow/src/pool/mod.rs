//! Bounded worker pool: dispatch jobs to a fixed set of workers and collect
//! one tagged result per job.
//!
//! ## Structure
//!
//! - `manager` - [`WorkerPool`], [`JobQueue`] and the pool lifecycle.
//! - `worker` - the per-worker job loop.
//! - `barrier` - [`CompletionBarrier`], used to close the result queue.
//! - [`run_pool`] - spawn, feed, close and collect in one call.

mod barrier;
mod config;
mod job;
mod manager;
mod processor;
mod run;
mod worker;


pub use barrier::*;
pub use config::*;
pub use job::*;
pub use manager::*;
pub use processor::*;
pub use run::*;
