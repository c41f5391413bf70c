use super::cancel::CancelToken;
use super::state::{COMPLETED, IDLE, NOTIFIED, QUEUED, RUNNING, TaskState};
use crate::error::{Error, Result};
use crate::runtime::context::{self, TaskContext};
use crate::runtime::task::waker::make_waker;
use crate::runtime::work_stealing::injector::Injector;

use std::any::Any;
use std::cell::UnsafeCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::task::{Context, Poll, Waker};

/// Boxed body of a task.
type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;

/// Process-unique identifier of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        TaskId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric value of the id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A runnable unit of work that can be executed by a worker.
///
/// Erases the output type so queues can hold `Arc<dyn Runnable>`.
pub(crate) trait Runnable: Send + Sync {
    fn run(self: Arc<Self>);
}

/// Receives completion notifications from the tasks it owns.
///
/// Implemented by scopes. Tasks keep only a weak reference to their
/// supervisor: the scope tracks its children, the children never own it.
pub(crate) trait Supervisor: Send + Sync {
    /// Called exactly once per child, after its output is stored.
    ///
    /// `failure` is `Some` when the child failed (cancellations are not
    /// failures).
    fn child_completed(&self, task: TaskId, failure: Option<&Error>);
}

/// Who observes the outcome of a task.
pub(crate) enum Owner {
    /// A scope tracks the task and is notified on completion.
    Scope(Weak<dyn Supervisor>),

    /// A suspended caller receives the outcome directly.
    Caller,

    /// Nobody: failures can only be logged.
    Global,
}

/// A spawned task.
///
/// A `Task` owns the boxed body, drives it through the scheduling state
/// machine, stores the output, and notifies both the handles awaiting it
/// and the scope supervising it.
pub(crate) struct Task<T> {
    id: TaskId,

    /// The body. `None` once it has completed.
    ///
    /// Only touched while the task is in the `RUNNING` state, which a single
    /// worker can hold at a time.
    future: UnsafeCell<Option<BoxFuture<T>>>,

    /// Output of the body, until a `Deferred` takes it.
    output: Mutex<Option<Result<T>>>,

    /// Terminal state, set once on completion.
    outcome: OnceLock<TaskState>,

    /// Scheduling state (IDLE, QUEUED, RUNNING, ...).
    state: AtomicUsize,

    /// Queue the task is re-scheduled onto when woken.
    injector: Arc<Injector>,

    /// Cancellation token of this task.
    cancel: CancelToken,

    /// Observer of the outcome.
    owner: Owner,

    /// Wakers of handles waiting for completion.
    waiters: Mutex<Vec<Waker>>,
}

unsafe impl<T: Send> Send for Task<T> {}
unsafe impl<T: Send> Sync for Task<T> {}

impl<T: Send + 'static> Task<T> {
    /// Creates a new task in the `QUEUED` state.
    ///
    /// The caller is responsible for pushing it onto a queue.
    pub(crate) fn new<F>(
        future: F,
        injector: Arc<Injector>,
        cancel: CancelToken,
        owner: Owner,
    ) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            id: TaskId::next(),
            future: UnsafeCell::new(Some(Box::pin(future))),
            output: Mutex::new(None),
            outcome: OnceLock::new(),
            state: AtomicUsize::new(QUEUED),
            injector,
            cancel,
            owner,
            waiters: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    /// Polls the body once.
    ///
    /// A panic escaping the body is caught here and turned into the task's
    /// failure, so a misbehaving body never takes a worker thread down.
    pub(crate) fn run(self: Arc<Self>) {
        let current = self.state.load(Ordering::Acquire);

        if current != QUEUED && current != NOTIFIED {
            return;
        }

        // Transition to RUNNING. This ensures exclusive access to the UnsafeCell.
        if self
            .state
            .compare_exchange(current, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let waker = make_waker(self.clone());
        let mut cx = Context::from_waker(&waker);

        // Safety: the RUNNING state guarantees that no other thread is polling this future.
        let slot = unsafe { &mut *self.future.get() };
        let Some(future) = slot.as_mut() else {
            return;
        };

        let task = TaskContext {
            id: self.id,
            cancel: self.cancel.clone(),
        };

        let poll = context::enter_task(task, || {
            panic::catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(&mut cx)))
        });

        let output = match poll {
            Ok(Poll::Pending) => {
                // Return to IDLE unless a wake-up arrived while polling.
                if self
                    .state
                    .compare_exchange(RUNNING, IDLE, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    self.state.store(QUEUED, Ordering::Release);
                    self.injector.push(self.clone());
                }
                return;
            }
            Ok(Poll::Ready(output)) => output,
            Err(payload) => Err(Error::Panicked {
                task: self.id,
                message: panic_message(payload.as_ref()),
            }),
        };

        *slot = None;
        self.complete(output);
    }

    /// Stores the output and notifies the supervisor and all waiters.
    fn complete(&self, output: Result<T>) {
        let (state, failure) = match &output {
            Ok(_) => (TaskState::Completed, None),
            Err(err) if err.is_cancelled() => (TaskState::Cancelled, None),
            Err(err) => (TaskState::Failed, Some(err.clone())),
        };

        *self.output.lock().unwrap() = Some(output);
        let _ = self.outcome.set(state);
        self.state.store(COMPLETED, Ordering::Release);
        self.cancel.clear();

        tracing::debug!(task = %self.id, ?state, "task finished");

        match &self.owner {
            Owner::Scope(scope) => {
                if let Some(scope) = scope.upgrade() {
                    scope.child_completed(self.id, failure.as_ref());
                }
            }
            Owner::Caller => {}
            Owner::Global => {
                if let Some(err) = &failure {
                    tracing::error!(task = %self.id, error = %err, "global task failed");
                }
            }
        }

        let waiters = std::mem::take(&mut *self.waiters.lock().unwrap());
        for waiter in waiters {
            waiter.wake();
        }

        self.injector.task_finished();
    }

    /// Signals the task to be rescheduled.
    ///
    /// If the task is `IDLE`, it moves to `QUEUED` and is pushed to the injector.
    /// If the task is `RUNNING`, it moves to `NOTIFIED` so it is re-polled
    /// right after its current poll.
    pub(crate) fn wake(self: Arc<Self>) {
        loop {
            match self.state.load(Ordering::Acquire) {
                IDLE => {
                    if self
                        .state
                        .compare_exchange(IDLE, QUEUED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        self.injector.push(self.clone());
                        return;
                    }
                }
                RUNNING => {
                    if self
                        .state
                        .compare_exchange(RUNNING, NOTIFIED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    /// Requests cooperative cancellation of the task.
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    pub(crate) fn is_cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns the observable completion state.
    pub(crate) fn state(&self) -> TaskState {
        self.outcome.get().copied().unwrap_or(TaskState::Pending)
    }

    /// Resolves once the task has completed.
    ///
    /// The waker is registered **before** re-checking the state to avoid
    /// missed wake-ups.
    pub(crate) fn poll_completed(&self, cx: &mut Context<'_>) -> Poll<()> {
        if self.state.load(Ordering::Acquire) == COMPLETED {
            return Poll::Ready(());
        }

        {
            let mut waiters = self.waiters.lock().unwrap();
            if !waiters.iter().any(|w| w.will_wake(cx.waker())) {
                waiters.push(cx.waker().clone());
            }
        }

        if self.state.load(Ordering::Acquire) == COMPLETED {
            return Poll::Ready(());
        }

        Poll::Pending
    }

    /// Takes the output of a completed task.
    ///
    /// Returns `None` if the task has not completed or the output was
    /// already taken.
    pub(crate) fn take_output(&self) -> Option<Result<T>> {
        self.output.lock().unwrap().take()
    }
}

impl<T: Send + 'static> Runnable for Task<T> {
    fn run(self: Arc<Self>) {
        Task::run(self)
    }
}

/// Extracts a readable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
