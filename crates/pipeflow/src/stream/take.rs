use super::{Recv, STREAM_CAPACITY};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Forwards at most `n` values from `input`, then closes.
///
/// Once `n` values are forwarded the task drops both `input` and its output
/// sender. Upstream stages notice the dropped input on their next send and
/// stop on their own, but `take` never raises `cancel` itself: callers raise
/// the shared signal once they are done so that stages with nothing left to
/// send are released too.
///
/// Fewer than `n` values are forwarded if `input` closes or `cancel` is
/// raised first; `take` never waits on values that will not arrive.
pub fn take<T, R>(cancel: CancellationToken, mut input: R, n: usize) -> mpsc::Receiver<T>
where
    T: Send + 'static,
    R: Recv<T>,
{
    let (tx, rx) = mpsc::channel(STREAM_CAPACITY);

    tokio::spawn(async move {
        let mut taken = 0;

        while taken < n {
            let value = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                value = input.recv() => match value {
                    Some(value) => value,
                    None => break,
                },
            };

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                sent = tx.send(value) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
            taken += 1;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Take finished after {taken} of {n} values");
    });

    rx
}
