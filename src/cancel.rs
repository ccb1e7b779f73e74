//! Cooperative cancellation for blocking cube operations.
//!
//! A [`CancelToken`] is a cloneable handle shared between the thread running
//! an operation and whoever may cancel it. Cancellation is a request, not a
//! preemption: a thread queued on a scheduling gate is woken and withdraws
//! cleanly, while a thread already admitted runs its body and release duties
//! to completion before reporting [`CubeError::Cancelled`](crate::CubeError::Cancelled).
//!
//! # Wakeup delivery
//!
//! A blocked thread registers a gate waker with its token before sleeping.
//! The waker acquires the scheduler lock before notifying the gate, so a
//! cancel can never slip between the sleeper's condition check and its wait.
//! The canceller never holds the watcher list lock while invoking a waker,
//! which keeps the lock order acyclic.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// A gate waker registered by a thread about to block.
pub(crate) type WakeFn = Arc<dyn Fn() + Send + Sync>;

/// Cloneable cancellation handle for a cube operation.
///
/// A fresh token is never cancelled; [`CancelToken::cancel`] is sticky and
/// affects every clone.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Default)]
struct CancelInner {
    requested: AtomicBool,
    next_watch_id: AtomicU64,
    watchers: Mutex<Vec<Watcher>>,
}

struct Watcher {
    id: u64,
    wake: WakeFn,
}

impl CancelToken {
    /// Creates a new, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation and wakes every thread of this token currently
    /// blocked on a scheduling gate.
    pub fn cancel(&self) {
        self.inner.requested.store(true, Ordering::SeqCst);
        let wakers: Vec<WakeFn> = self
            .inner
            .watchers
            .lock()
            .iter()
            .map(|watcher| Arc::clone(&watcher.wake))
            .collect();
        for wake in wakers {
            wake();
        }
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Registers a gate waker; the registration is removed when the returned
    /// guard drops.
    pub(crate) fn watch(&self, wake: WakeFn) -> WatchGuard<'_> {
        let id = self.inner.next_watch_id.fetch_add(1, Ordering::Relaxed);
        self.inner.watchers.lock().push(Watcher { id, wake });
        WatchGuard { token: self, id }
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("requested", &self.is_cancelled())
            .finish()
    }
}

/// Removes the watcher registration on drop.
pub(crate) struct WatchGuard<'a> {
    token: &'a CancelToken,
    id: u64,
}

impl Drop for WatchGuard<'_> {
    fn drop(&mut self) {
        self.token
            .inner
            .watchers
            .lock()
            .retain(|watcher| watcher.id != self.id);
    }
}
