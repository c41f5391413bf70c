use crate::runtime::task::Runnable;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// How long an idle worker sleeps before looking for stealable work again.
///
/// Local queue pushes do not signal the condition variable, so parked
/// workers must wake up periodically to steal.
const PARK_TIMEOUT: Duration = Duration::from_millis(1);

/// Global run queue of one dispatcher.
///
/// Newly submitted tasks and tasks woken from outside a worker land here.
/// The injector also owns the dispatcher's lifecycle bookkeeping:
/// - the number of live (spawned, not yet completed) tasks,
/// - the shutdown flag,
/// - worker parking.
///
/// Workers exit once the dispatcher is shut down **and** every live task
/// has completed, which lets in-flight work drain after `shutdown`.
pub(crate) struct Injector {
    /// Queue holding globally injected tasks.
    queue: Mutex<VecDeque<Arc<dyn Runnable>>>,

    /// Wakes parked workers.
    condvar: Condvar,

    /// Set once `shutdown` is called.
    shutdown: AtomicBool,

    /// Tasks accepted and not yet completed.
    live: AtomicUsize,
}

impl Injector {
    pub(crate) fn new() -> Self {
        Injector {
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
            shutdown: AtomicBool::new(false),
            live: AtomicUsize::new(0),
        }
    }

    /// Signals shutdown and wakes all parked workers.
    ///
    /// New tasks are refused from now on; live ones keep running.
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.condvar.notify_all();
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Returns `true` once shut down with no live task left.
    pub(crate) fn is_terminated(&self) -> bool {
        self.is_shutdown() && self.live.load(Ordering::SeqCst) == 0
    }

    /// Reserves a slot for a new task.
    ///
    /// Returns `false` (and reserves nothing) if the dispatcher is shut
    /// down. The counter is bumped **before** checking the flag, so a
    /// worker can never observe zero live tasks while an accepted task is
    /// on its way to a queue.
    pub(crate) fn try_accept(&self) -> bool {
        self.live.fetch_add(1, Ordering::SeqCst);

        if self.is_shutdown() {
            self.task_finished();
            return false;
        }

        true
    }

    /// Releases the slot of a completed task.
    pub(crate) fn task_finished(&self) {
        if self.live.fetch_sub(1, Ordering::SeqCst) == 1 && self.is_shutdown() {
            self.condvar.notify_all();
        }
    }

    /// Number of live tasks.
    pub(crate) fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Pushes a task and wakes the parked workers.
    pub(crate) fn push(&self, task: Arc<dyn Runnable>) {
        self.queue.lock().unwrap().push_back(task);
        self.condvar.notify_all();
    }

    /// Parks the current worker until work arrives, the dispatcher
    /// terminates, or the park timeout elapses.
    pub(crate) fn park(&self) {
        let queue = self.queue.lock().unwrap();

        if !queue.is_empty() || self.is_terminated() {
            return;
        }

        let _ = self.condvar.wait_timeout(queue, PARK_TIMEOUT).unwrap();
    }

    /// Takes the oldest task from the global queue.
    pub(crate) fn steal(&self) -> Option<Arc<dyn Runnable>> {
        self.queue.lock().unwrap().pop_front()
    }
}
