use crate::runtime::context::{self, WorkerContext};
use crate::runtime::task::Runnable;
use crate::runtime::work_stealing::injector::Injector;
use crate::runtime::work_stealing::queue::LocalQueue;

use std::sync::Arc;

/// A worker thread of a dispatcher.
///
/// The lookup order for the next task is:
/// 1. Pop from the local queue
/// 2. Take from the dispatcher's injector
/// 3. Steal from sibling workers
/// 4. Park if no work is available
pub(crate) struct Worker {
    /// Id of the owning dispatcher.
    dispatcher: u64,

    /// Index of this worker in `locals`.
    index: usize,

    /// Local queues of every worker of the dispatcher.
    locals: Arc<Vec<Arc<LocalQueue>>>,

    injector: Arc<Injector>,
}

impl Worker {
    pub(crate) fn new(
        dispatcher: u64,
        index: usize,
        locals: Arc<Vec<Arc<LocalQueue>>>,
        injector: Arc<Injector>,
    ) -> Self {
        Self {
            dispatcher,
            index,
            locals,
            injector,
        }
    }

    /// Runs the worker loop until the dispatcher terminates.
    ///
    /// Shutdown alone does not stop the loop: the worker keeps draining
    /// until no live task is left on the dispatcher.
    pub(crate) fn run(&self) {
        context::set_worker(WorkerContext {
            dispatcher: self.dispatcher,
            index: self.index,
            locals: self.locals.clone(),
        });

        loop {
            if let Some(task) = self.next_task() {
                task.run();
                continue;
            }

            if self.injector.is_terminated() {
                break;
            }

            self.injector.park();
        }

        tracing::trace!(dispatcher = self.dispatcher, worker = self.index, "worker exited");
    }

    fn next_task(&self) -> Option<Arc<dyn Runnable>> {
        self.locals[self.index]
            .pop()
            .or_else(|| self.injector.steal())
            .or_else(|| self.try_steal())
    }

    /// Steals a batch from the first sibling that has work.
    ///
    /// Siblings are visited round-robin starting after this worker; the
    /// rest of the batch lands in this worker's own queue.
    fn try_steal(&self) -> Option<Arc<dyn Runnable>> {
        let len = self.locals.len();

        if len <= 1 {
            return None;
        }

        (1..len)
            .map(|i| (self.index + i) % len)
            .find_map(|victim| self.locals[victim].steal_into(&self.locals[self.index]))
    }
}
