use super::{Recv, STREAM_CAPACITY};
use futures::future::join_all;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Merges several streams into one.
///
/// One transfer task per source forwards values into the merged stream as
/// they arrive; interleaving across sources is unspecified. A closer task
/// joins every transfer task before dropping the last sender, so the merged
/// stream closes only after all sources have closed (or `cancel` stopped the
/// transfers). No value that a transfer task already accepted is lost to an
/// early close.
///
/// An empty `inputs` yields a stream that is closed immediately.
pub fn fan_in<T, R>(cancel: CancellationToken, inputs: Vec<R>) -> mpsc::Receiver<T>
where
    T: Send + 'static,
    R: Recv<T>,
{
    let (tx, rx) = mpsc::channel(STREAM_CAPACITY);

    #[cfg(feature = "tracing")]
    tracing::debug!("Fanning in {} sources", inputs.len());

    let transfers: Vec<_> = inputs
        .into_iter()
        .enumerate()
        .map(|(_source, input)| tokio::spawn(transfer(_source, cancel.clone(), input, tx.clone())))
        .collect();

    tokio::spawn(async move {
        let _joined = join_all(transfers).await;

        #[cfg(feature = "tracing")]
        {
            for e in _joined.iter().filter_map(|joined| joined.as_ref().err()) {
                tracing::error!("Fan-in transfer task failed: {e}");
            }
        }
        // Barrier reached: every transfer has finished with its sender.
        drop(tx);

        #[cfg(feature = "tracing")]
        tracing::trace!("Fan-in closed");
    });

    rx
}

async fn transfer<T, R>(
    _source: usize,
    cancel: CancellationToken,
    mut input: R,
    tx: mpsc::Sender<T>,
) where
    R: Recv<T>,
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

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            sent = tx.send(value) => {
                if sent.is_err() {
                    break;
                }
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Fan-in source {_source} finished");
}
