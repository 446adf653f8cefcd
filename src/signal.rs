// src/signal.rs

//! Cooperative cancellation shared by the pipeline runner and the change
//! watcher.
//!
//! The signal is a single flag with two states, clear and set. Readers may
//! either poll it with [`CancellationSignal::is_set`] or await
//! [`CancellationSignal::cancelled`]; both observe the same atomic state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    set: AtomicBool,
    notify: Notify,
}

/// Cloneable handle to one shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    inner: Arc<Inner>,
}

impl CancellationSignal {
    /// Create a fresh signal in the clear state.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.inner.set.load(Ordering::Acquire)
    }

    /// Set the signal.
    ///
    /// Returns `true` only for the call that performed the clear -> set
    /// transition; setting an already-set signal is a no-op returning `false`.
    pub fn set(&self) -> bool {
        let transitioned = self
            .inner
            .set
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if transitioned {
            self.inner.notify.notify_waiters();
        }
        transitioned
    }

    /// Reset the signal to clear.
    ///
    /// Only the supervisor calls this, and only once every reader that could
    /// treat the set state as its reason to stop has terminated.
    pub(crate) fn clear(&self) {
        self.inner.set.store(false, Ordering::Release);
    }

    /// Wait until the signal is set. Returns immediately if it already is.
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register as a waiter before re-checking the flag so a concurrent
        // `set` between the check and the await cannot be missed.
        notified.as_mut().enable();
        if self.is_set() {
            return;
        }
        notified.await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn starts_clear_and_transitions_once() {
        let signal = CancellationSignal::new();
        assert!(!signal.is_set());

        assert!(signal.set());
        assert!(signal.is_set());

        // Second set is a no-op.
        assert!(!signal.set());
        assert!(signal.is_set());
    }

    #[test]
    fn clones_share_state() {
        let a = CancellationSignal::new();
        let b = a.clone();
        b.set();
        assert!(a.is_set());

        a.clear();
        assert!(!b.is_set());
    }

    #[tokio::test]
    async fn cancelled_returns_immediately_when_already_set() {
        let signal = CancellationSignal::new();
        signal.set();
        tokio::time::timeout(Duration::from_millis(100), signal.cancelled())
            .await
            .expect("cancelled() should not block on a set signal");
    }

    #[tokio::test]
    async fn cancelled_wakes_all_waiters() {
        let signal = CancellationSignal::new();

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let s = signal.clone();
                tokio::spawn(async move { s.cancelled().await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(signal.set());

        for w in waiters {
            tokio::time::timeout(Duration::from_secs(1), w)
                .await
                .expect("waiter not woken")
                .expect("waiter panicked");
        }
    }
}
