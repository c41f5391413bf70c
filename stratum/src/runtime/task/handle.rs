use super::state::TaskState;
use super::{Task, TaskId};
use crate::error::{Error, Result};
use crate::runtime::context;

use std::fmt;
use std::future::poll_fn;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

/// Handle to a fire-and-forget task started with `launch`.
///
/// A `Job` carries no result: it can only be joined (wait for the task to
/// reach a terminal state), inspected, or cancelled.
///
/// Dropping a `Job` does **not** cancel the task. Whether the task is
/// waited for depends on the scope that launched it: a [`Scope`](crate::Scope)
/// always waits, the [`GlobalScope`](crate::GlobalScope) never does.
pub struct Job {
    pub(crate) task: Arc<Task<()>>,
}

impl Job {
    pub(crate) fn new(task: Arc<Task<()>>) -> Self {
        Self { task }
    }

    /// Suspends the caller until the task is terminal.
    ///
    /// Returns nothing: the outcome (success, failure or cancellation) is
    /// discarded. A failure of a scoped job still reaches its scope.
    ///
    /// This is a cancellation check point. If the caller is cancelled
    /// while waiting, `join` returns early and the job keeps running.
    pub async fn join(&self) {
        let _ = poll_fn(|cx| poll_until_done(&self.task, cx)).await;
    }

    /// Requests cooperative cancellation of the task.
    pub fn cancel(&self) {
        self.task.cancel();
    }

    pub fn id(&self) -> TaskId {
        self.task.id()
    }

    pub fn state(&self) -> TaskState {
        self.task.state()
    }

    /// Returns `true` once the task is terminal.
    pub fn is_completed(&self) -> bool {
        self.task.state().is_terminal()
    }

    /// Returns `true` once cancellation has been requested, even if the
    /// task has not observed it yet.
    pub fn is_cancelled(&self) -> bool {
        self.task.is_cancel_requested()
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id())
            .field("state", &self.state())
            .finish()
    }
}

/// Handle to a task started with `spawn`, carrying its future result.
///
/// `Deferred` implements [`Future`]: awaiting it suspends the caller until
/// the task completes, then yields `Ok(value)` or the task's failure. The
/// failure is observed at the `.await`, never before.
///
/// Several deferreds started before the first `.await` run concurrently.
pub struct Deferred<T> {
    pub(crate) task: Arc<Task<T>>,
}

impl<T: Send + 'static> Deferred<T> {
    pub(crate) fn new(task: Arc<Task<T>>) -> Self {
        Self { task }
    }

    /// Suspends the caller until the task is terminal, without taking its
    /// result.
    ///
    /// Returns early if the caller is cancelled, like [`Job::join`].
    pub async fn join(&self) {
        let _ = poll_fn(|cx| poll_until_done(&self.task, cx)).await;
    }

    /// Waits for the task and takes its outcome, ignoring cancellation of
    /// the caller.
    ///
    /// Used where the caller must not outlive the task it started.
    pub(crate) async fn outcome(self) -> Result<T> {
        poll_fn(|cx| self.task.poll_completed(cx)).await;

        self.task
            .take_output()
            .expect("Deferred polled after its result was taken")
    }

    /// Requests cooperative cancellation of the task.
    pub fn cancel(&self) {
        self.task.cancel();
    }

    pub fn id(&self) -> TaskId {
        self.task.id()
    }

    pub fn state(&self) -> TaskState {
        self.task.state()
    }

    /// Returns `true` once the task is terminal.
    pub fn is_completed(&self) -> bool {
        self.task.state().is_terminal()
    }
}

impl<T: Send + 'static> Future for Deferred<T> {
    type Output = Result<T>;

    /// Resolves to `Err(Error::Cancelled)` if the awaiting task is cancelled
    /// first. The deferred task itself is not cancelled by that.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<T>> {
        if let Err(err) = ready!(poll_until_done(&self.task, cx)) {
            return Poll::Ready(Err(err));
        }

        Poll::Ready(
            self.task
                .take_output()
                .expect("Deferred polled after its result was taken"),
        )
    }
}

/// Polls `task` for completion from inside another task.
///
/// A task that is already terminal wins over the caller's cancellation.
fn poll_until_done<T: Send + 'static>(task: &Task<T>, cx: &mut Context<'_>) -> Poll<Result<()>> {
    if task.poll_completed(cx).is_ready() {
        return Poll::Ready(Ok(()));
    }

    if context::is_cancelled() {
        return Poll::Ready(Err(Error::Cancelled));
    }

    context::register_cancellation(cx.waker());

    Poll::Pending
}

impl<T: Send + 'static> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("id", &self.id())
            .field("state", &self.state())
            .finish()
    }
}
