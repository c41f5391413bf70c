use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::task::Waker;

/// A node in the cooperative cancellation tree.
///
/// Every scope owns a token; every task owns a child of the token of
/// whoever started it. Cancelling a token cancels its whole subtree and
/// wakes every waker registered on it, so suspended tasks get re-polled
/// and can observe the request at their next suspension point.
///
/// Cancellation is never pre-emptive: a task that does not reach a
/// suspension point keeps running.
#[derive(Clone, Default)]
pub(crate) struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    /// Set once, never cleared.
    cancelled: AtomicBool,

    /// Wakers of tasks suspended while holding this token.
    wakers: Mutex<Vec<Waker>>,

    /// Tokens derived from this one.
    children: Mutex<Vec<Weak<Inner>>>,
}

impl CancelToken {
    /// Creates a token that is cancelled whenever `self` is.
    ///
    /// A child created from an already cancelled token starts cancelled.
    pub(crate) fn child(&self) -> CancelToken {
        let child = CancelToken::default();

        {
            let mut children = self.inner.children.lock().unwrap();
            children.retain(|c| c.strong_count() > 0);
            children.push(Arc::downgrade(&child.inner));
        }

        if self.is_cancelled() {
            child.cancel();
        }

        child
    }

    /// Returns `true` once cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Requests cancellation of this token and all of its descendants.
    ///
    /// Idempotent: only the first call wakes anything.
    pub(crate) fn cancel(&self) {
        self.inner.cancel();
    }

    /// Registers a waker to be woken when the token is cancelled.
    ///
    /// If the token is already cancelled, the waker is woken immediately.
    /// Registering a waker equivalent to one already stored is a no-op.
    pub(crate) fn register(&self, waker: &Waker) {
        let mut wakers = self.inner.wakers.lock().unwrap();

        if self.is_cancelled() {
            drop(wakers);
            waker.wake_by_ref();
            return;
        }

        if !wakers.iter().any(|w| w.will_wake(waker)) {
            wakers.push(waker.clone());
        }
    }

    /// Drops every registered waker.
    ///
    /// Called when the owning task completes, so the token does not keep
    /// the task alive.
    pub(crate) fn clear(&self) {
        self.inner.wakers.lock().unwrap().clear();
    }
}

impl Inner {
    fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }

        let wakers = std::mem::take(&mut *self.wakers.lock().unwrap());
        for waker in wakers {
            waker.wake();
        }

        let children = std::mem::take(&mut *self.children.lock().unwrap());
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel();
        }
    }
}
