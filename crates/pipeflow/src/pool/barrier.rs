use portable_atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Tracks how many tasks are still active and fires once all have finished.
///
/// Each task holds a [`BarrierGuard`] obtained from
/// [`CompletionBarrier::register`]. Dropping the last guard (normally or while
/// unwinding from a panic) fires the barrier exactly once, waking every
/// [`CompletionBarrier::wait`] caller.
///
/// Registration must happen before the tasks are released; a barrier with no
/// registered guards never fires on its own. Use
/// [`CompletionBarrier::with_guards`] to register a known number of tasks up
/// front.
#[derive(Clone, Debug)]
pub struct CompletionBarrier {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    active: AtomicUsize,
    done: CancellationToken,
}

/// Registration of one task with a [`CompletionBarrier`].
#[derive(Debug)]
#[must_use = "dropping the guard immediately marks the task as finished"]
pub struct BarrierGuard {
    inner: Arc<Inner>,
}

impl CompletionBarrier {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                active: AtomicUsize::new(0),
                done: CancellationToken::new(),
            }),
        }
    }

    /// Creates a barrier with `count` tasks registered, returning their
    /// guards. With `count == 0` the barrier fires immediately.
    pub fn with_guards(count: usize) -> (Self, Vec<BarrierGuard>) {
        let barrier = Self::new();
        let guards = (0..count).map(|_| barrier.register()).collect();
        if count == 0 {
            barrier.inner.done.cancel();
        }
        (barrier, guards)
    }

    /// Registers one more active task.
    pub fn register(&self) -> BarrierGuard {
        self.inner.active.fetch_add(1, Ordering::AcqRel);
        BarrierGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Number of tasks that have not finished yet.
    pub fn active(&self) -> usize {
        self.inner.active.load(Ordering::Acquire)
    }

    pub fn is_done(&self) -> bool {
        self.inner.done.is_cancelled()
    }

    /// Waits until every registered task has finished.
    pub async fn wait(&self) {
        self.inner.done.cancelled().await;
    }
}

impl Default for CompletionBarrier {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BarrierGuard {
    fn drop(&mut self) {
        // AcqRel: everything the task did before dropping its guard
        // happens-before whoever observes the barrier firing.
        if self.inner.active.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.done.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn fires_after_last_guard_drops() {
        let (barrier, mut guards) = CompletionBarrier::with_guards(3);
        assert_eq!(barrier.active(), 3);

        drop(guards.pop());
        drop(guards.pop());
        assert!(!barrier.is_done());
        assert!(
            timeout(Duration::from_millis(20), barrier.wait())
                .await
                .is_err()
        );

        guards.clear();
        assert!(barrier.is_done());
        assert!(
            timeout(Duration::from_millis(20), barrier.wait())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn zero_tasks_fire_immediately() {
        let (barrier, guards) = CompletionBarrier::with_guards(0);
        assert!(guards.is_empty());
        barrier.wait().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn fires_even_when_a_task_panics() {
        let (barrier, guards) = CompletionBarrier::with_guards(2);
        let handles: Vec<_> = guards
            .into_iter()
            .enumerate()
            .map(|(i, guard)| {
                tokio::spawn(async move {
                    let _guard = guard;
                    assert!(i != 1, "task {i} panics on purpose");
                })
            })
            .collect();

        let joined = futures::future::join_all(handles).await;
        assert_eq!(joined.iter().filter(|j| j.is_err()).count(), 1);
        assert!(
            timeout(Duration::from_secs(1), barrier.wait())
                .await
                .is_ok()
        );
    }
}
