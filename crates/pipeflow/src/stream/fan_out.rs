use super::{STREAM_CAPACITY, SharedReceiver, stage::run_stage};
use crate::{Error, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Spreads one slow stage across `width` concurrent instances.
///
/// All instances read from the same `input`; each value is claimed by exactly
/// one instance (never duplicated), so whichever instance is idle picks up the
/// next value. Each instance writes to its own output stream, returned in
/// instance order. There is no ordering guarantee across the outputs; merge
/// them back with [`fan_in`](super::fan_in).
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] if `width` is zero.
pub fn fan_out<T, U, F>(
    cancel: CancellationToken,
    input: mpsc::Receiver<T>,
    width: usize,
    f: F,
) -> Result<Vec<mpsc::Receiver<U>>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Option<U> + Send + Sync + 'static,
{
    if width == 0 {
        return Err(Error::InvalidConfig {
            reason: "fan-out width must be greater than 0".to_string(),
        });
    }

    #[cfg(feature = "tracing")]
    tracing::debug!("Fanning out across {width} stages");

    let shared = SharedReceiver::new(input);
    let f = Arc::new(f);
    let mut outputs = Vec::with_capacity(width);

    for _ in 0..width {
        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
        let f = Arc::clone(&f);
        tokio::spawn(run_stage(
            cancel.clone(),
            shared.clone(),
            tx,
            move |value| f(value),
        ));
        outputs.push(rx);
    }

    Ok(outputs)
}
