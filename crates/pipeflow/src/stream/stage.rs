use super::{Recv, STREAM_CAPACITY};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Spawns a filter/transform stage over `input`.
///
/// Each value read from `input` is passed to `f`. `Some(u)` is forwarded
/// downstream, `None` drops the value and the stage moves on to the next
/// input. Output order matches the order values were read.
///
/// `f` runs inline on the stage task. An expensive `f` makes this stage the
/// bottleneck of the pipeline; spread it over several tasks with
/// [`fan_out`](super::fan_out) rather than speeding up `f`.
///
/// The stage stops when `cancel` is raised, `input` is closed and drained,
/// or the returned receiver is dropped.
pub fn stage<T, U, R, F>(cancel: CancellationToken, input: R, f: F) -> mpsc::Receiver<U>
where
    T: Send + 'static,
    U: Send + 'static,
    R: Recv<T>,
    F: Fn(T) -> Option<U> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
    tokio::spawn(run_stage(cancel, input, tx, f));
    rx
}

pub(crate) async fn run_stage<T, U, R, F>(
    cancel: CancellationToken,
    mut input: R,
    tx: mpsc::Sender<U>,
    f: F,
) where
    R: Recv<T>,
    F: Fn(T) -> Option<U>,
{
    loop {
        let value = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            value = input.recv() => match value {
                Some(value) => value,
                None => break,
            },
        };

        let Some(out) = f(value) else {
            continue;
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            sent = tx.send(out) => {
                if sent.is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::trace!("Stage output dropped, stopping");
                    break;
                }
            }
        }
    }
}
