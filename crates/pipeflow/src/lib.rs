#![doc = include_str!("../README.md")]

mod error;
mod pool;
mod stream;

pub use crate::error::*;
pub use crate::pool::*;
pub use crate::stream::*;
// Re-exported so callers share one signal type with every stage and worker.
pub use tokio_util::sync::CancellationToken;
