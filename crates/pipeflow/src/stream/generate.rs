use super::STREAM_CAPACITY;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Spawns a task producing an unbounded stream by repeatedly calling
/// `produce`.
///
/// The task first reserves a slot in the output channel and only then calls
/// `produce`, so values are never produced ahead of demand and the task is
/// parked (not spinning) while the consumer is busy.
///
/// The stream ends when:
/// - `cancel` is raised, or
/// - the returned receiver is dropped.
pub fn generate<T, F>(cancel: CancellationToken, mut produce: F) -> mpsc::Receiver<T>
where
    T: Send + 'static,
    F: FnMut() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel(STREAM_CAPACITY);

    tokio::spawn(async move {
        #[cfg(feature = "tracing")]
        tracing::trace!("Generator started");

        loop {
            let permit = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                permit = tx.reserve() => match permit {
                    Ok(permit) => permit,
                    // Consumer went away.
                    Err(_) => break,
                },
            };
            permit.send(produce());
        }

        #[cfg(feature = "tracing")]
        tracing::trace!("Generator stopped");
    });

    rx
}
