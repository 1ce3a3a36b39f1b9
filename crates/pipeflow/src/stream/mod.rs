//! Cancellable stream stages.
//!
//! Every stage spawns one Tokio task, owns the sending half of a bounded
//! [`mpsc`](tokio::sync::mpsc) channel, and hands the receiving half back to
//! the caller. Stages compose by passing one stage's receiver into the next:
//!
//! ```text
//! generate -> fan_out (K x stage) -> fan_in -> take -> consumer
//! ```
//!
//! All stages race each blocking handoff against the shared
//! [`CancellationToken`](tokio_util::sync::CancellationToken), biased toward
//! the token, so a raised signal is observed at the next suspension point.
//! Dropping a receiver also stops the stage feeding it.
//!
//! Stages must be called from within a Tokio runtime.

mod fan_in;
mod fan_out;
mod generate;
mod recv;
mod stage;
mod take;


pub use fan_in::*;
pub use fan_out::*;
pub use generate::*;
pub use recv::*;
pub use stage::*;
pub use take::*;

/// Capacity of the channel each stage writes into.
///
/// A single slot makes every send a handoff: the producer cannot run more
/// than one value ahead of its consumer.
pub const STREAM_CAPACITY: usize = 1;
