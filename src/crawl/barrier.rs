// src/crawl/barrier.rs
// =============================================================================
// A counting completion barrier for work that discovers more work.
//
// The number of crawl tasks is not known up front: every fetched page can
// spawn more tasks. So instead of joining a fixed set of handles, each task
// is counted in before it is spawned (`add` / `register`) and counted out
// when it exits (`done`, or dropping its PendingGuard). The top-level caller
// awaits `wait()`, which resolves once the count is back at zero.
//
// Rules:
// - count a task in BEFORE spawning it, never from inside the task
// - every counted task must count itself out exactly once
// - one barrier per crawl; do not reuse it after `wait()` returned
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    pending: AtomicUsize,
    zero: Notify,
}

/// Cheap to clone; every clone refers to the same counter.
#[derive(Debug, Clone, Default)]
pub struct CompletionBarrier {
    inner: Arc<Inner>,
}

impl CompletionBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `n` more units of pending work.
    pub fn add(&self, n: usize) {
        self.inner.pending.fetch_add(n, Ordering::AcqRel);
    }

    /// Marks one unit of work as finished.
    ///
    /// # Panics
    ///
    /// Panics if called when no work is pending; that means some task was
    /// counted out twice and the barrier can no longer be trusted.
    pub fn done(&self) {
        let previous = self
            .inner
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));

        match previous {
            Ok(1) => self.inner.zero.notify_waiters(),
            Ok(_) => {}
            Err(_) => panic!("CompletionBarrier::done called with no pending work"),
        }
    }

    /// Registers one unit of work and returns a guard that marks it done
    /// when dropped, on every exit path including a panic.
    #[must_use = "dropping the guard immediately marks the work as done"]
    pub fn register(&self) -> PendingGuard {
        self.add(1);
        PendingGuard {
            barrier: self.clone(),
        }
    }

    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Waits until no work is pending.
    ///
    /// Returns immediately if the count is already zero.
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.zero.notified();
            tokio::pin!(notified);
            // Register interest before checking so a concurrent `done` that
            // hits zero between the check and the await still wakes us.
            notified.as_mut().enable();

            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// One unit of pending work on a [`CompletionBarrier`].
#[derive(Debug)]
pub struct PendingGuard {
    barrier: CompletionBarrier,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.barrier.done();
    }
}
