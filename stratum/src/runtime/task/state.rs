//! Scheduling states of a task, plus the public completion state.
//!
//! The scheduling states are stored in an `AtomicUsize` and drive the
//! wake/poll protocol:
//!
//! ```text
//!  QUEUED ──run──▶ RUNNING ──Pending──▶ IDLE ──wake──▶ QUEUED
//!                    │  ▲
//!               wake │  └── re-queued ◀── NOTIFIED
//!                    ▼
//!                 NOTIFIED          RUNNING ──Ready──▶ COMPLETED
//! ```

/// Parked: the future returned `Pending` and waits for a wake-up.
pub(crate) const IDLE: usize = 0;

/// Sitting in a run queue.
pub(crate) const QUEUED: usize = 1;

/// Being polled by exactly one worker.
pub(crate) const RUNNING: usize = 2;

/// The future produced its output and will never be polled again.
pub(crate) const COMPLETED: usize = 3;

/// Woken while being polled; must be re-queued once the poll returns.
pub(crate) const NOTIFIED: usize = 4;

/// Observable completion state of a task.
///
/// Returned by [`Job::state`](crate::task::Job::state) and
/// [`Deferred::state`](crate::task::Deferred::state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// The task has not finished yet.
    Pending,

    /// The body returned `Ok`.
    Completed,

    /// The body returned an error or panicked.
    Failed,

    /// The body stopped after observing a cancellation request.
    Cancelled,
}

impl TaskState {
    /// Returns `true` once the task can no longer change state.
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskState::Pending)
    }
}
