use crate::runtime::task::{CancelToken, TaskId};
use crate::runtime::work_stealing::queue::LocalQueue;

use std::cell::RefCell;
use std::sync::Arc;
use std::task::Waker;

/// Identity of the worker thread currently executing.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    /// Id of the dispatcher owning this worker.
    pub(crate) dispatcher: u64,

    /// Index of this worker inside its dispatcher.
    pub(crate) index: usize,

    /// Local queues of every worker of the dispatcher.
    pub(crate) locals: Arc<Vec<Arc<LocalQueue>>>,
}

/// The task currently being polled on this thread.
#[derive(Clone)]
pub(crate) struct TaskContext {
    pub(crate) id: TaskId,
    pub(crate) cancel: CancelToken,
}

thread_local! {
    /// Set once for the whole lifetime of a worker thread.
    static CURRENT_WORKER: RefCell<Option<WorkerContext>> = const { RefCell::new(None) };

    /// Set for the duration of a single poll.
    static CURRENT_TASK: RefCell<Option<TaskContext>> = const { RefCell::new(None) };
}

/// Marks the current thread as a worker of a dispatcher.
pub(crate) fn set_worker(worker: WorkerContext) {
    CURRENT_WORKER.with(|w| *w.borrow_mut() = Some(worker));
}

/// Returns the worker identity of the current thread, if it is a worker.
pub(crate) fn current_worker() -> Option<WorkerContext> {
    CURRENT_WORKER.with(|w| w.borrow().clone())
}

/// Returns `true` if the current thread is a worker of `dispatcher`.
pub(crate) fn is_worker_of(dispatcher: u64) -> bool {
    CURRENT_WORKER.with(|w| {
        w.borrow()
            .as_ref()
            .is_some_and(|w| w.dispatcher == dispatcher)
    })
}

/// Runs `f` with `task` installed as the current task.
///
/// The previous value is restored afterwards, so nested polls (a task
/// polled from inside another poll) see the correct task.
pub(crate) fn enter_task<R>(task: TaskContext, f: impl FnOnce() -> R) -> R {
    let prev = CURRENT_TASK.with(|t| t.replace(Some(task)));

    let out = f();

    CURRENT_TASK.with(|t| t.replace(prev));

    out
}

/// Returns the cancellation token of the task being polled, if any.
pub(crate) fn current_cancel_token() -> Option<CancelToken> {
    CURRENT_TASK.with(|t| t.borrow().as_ref().map(|t| t.cancel.clone()))
}

/// Returns the id of the task being polled, if any.
pub(crate) fn current_task_id() -> Option<TaskId> {
    CURRENT_TASK.with(|t| t.borrow().as_ref().map(|t| t.id))
}

/// Returns `true` if the current task has been asked to cancel.
///
/// Always `false` outside of a task.
pub(crate) fn is_cancelled() -> bool {
    CURRENT_TASK.with(|t| t.borrow().as_ref().is_some_and(|t| t.cancel.is_cancelled()))
}

/// Arranges for `waker` to be woken if the current task is cancelled.
///
/// Suspension points call this before returning `Pending`, so a
/// cancellation request re-polls the suspended task.
pub(crate) fn register_cancellation(waker: &Waker) {
    CURRENT_TASK.with(|t| {
        if let Some(task) = t.borrow().as_ref() {
            task.cancel.register(waker);
        }
    });
}
