use core::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// The receiving side of a stream.
///
/// Implemented for a plain [`mpsc::Receiver`] (one reader) and for
/// [`SharedReceiver`] (many readers competing for the same values). Stages
/// are generic over this trait so the same stage body serves both a
/// stand-alone stage and one instance of a fan-out.
pub trait Recv<T>: Send + 'static {
    /// Waits for the next value, returning `None` once the stream is closed
    /// and empty.
    ///
    /// Must be cancel-safe: dropping the future before it resolves must not
    /// lose a value.
    fn recv(&mut self) -> impl Future<Output = Option<T>> + Send;
}

impl<T: Send + 'static> Recv<T> for mpsc::Receiver<T> {
    fn recv(&mut self) -> impl Future<Output = Option<T>> + Send {
        mpsc::Receiver::recv(self)
    }
}

/// A stream receiver that several tasks read from concurrently.
///
/// Each value is delivered to exactly one reader: whichever reader is idle
/// claims the next value. Cloning the handle adds another reader; the stream
/// is closed once the producer side is dropped and the buffer drained.
///
/// Readers queue on an async mutex around the inner receiver. Both the lock
/// and [`mpsc::Receiver::recv`] are cancel-safe, so a reader that loses a
/// `select!` race releases its place without consuming a value.
pub struct SharedReceiver<T> {
    inner: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> SharedReceiver<T> {
    pub fn new(rx: mpsc::Receiver<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(rx)),
        }
    }

    /// Number of handles currently reading from this stream.
    pub fn readers(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl<T> Clone for SharedReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> From<mpsc::Receiver<T>> for SharedReceiver<T> {
    fn from(rx: mpsc::Receiver<T>) -> Self {
        Self::new(rx)
    }
}

impl<T: Send + 'static> Recv<T> for SharedReceiver<T> {
    fn recv(&mut self) -> impl Future<Output = Option<T>> + Send {
        async move { self.inner.lock().await.recv().await }
    }
}
