//! Portable poller for targets without `epoll`.

use std::io;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Wake-up handle: a flag guarded by a mutex plus a condition variable.
pub(crate) struct Waker {
    signalled: Mutex<bool>,
    condvar: Condvar,
}

impl Waker {
    /// Interrupts the reactor's current wait.
    pub(crate) fn wake(&self) {
        let mut signalled = self.signalled.lock().unwrap_or_else(|e| e.into_inner());
        *signalled = true;
        self.condvar.notify_one();
    }
}

/// Poller built on `Condvar::wait_timeout`.
pub(crate) struct CondvarPoller {
    waker: Arc<Waker>,
}

impl CondvarPoller {
    pub(crate) fn new() -> io::Result<Self> {
        Ok(Self {
            waker: Arc::new(Waker {
                signalled: Mutex::new(false),
                condvar: Condvar::new(),
            }),
        })
    }

    pub(crate) fn waker(&self) -> Arc<Waker> {
        self.waker.clone()
    }

    /// Blocks until the timeout expires or the waker fires.
    pub(crate) fn wait(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        let mut signalled = self
            .waker
            .signalled
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        if !*signalled {
            signalled = match timeout {
                Some(timeout) => {
                    self.waker
                        .condvar
                        .wait_timeout(signalled, timeout)
                        .unwrap_or_else(|e| e.into_inner())
                        .0
                }
                None => self
                    .waker
                    .condvar
                    .wait(signalled)
                    .unwrap_or_else(|e| e.into_inner()),
            };
        }

        *signalled = false;

        Ok(())
    }
}
