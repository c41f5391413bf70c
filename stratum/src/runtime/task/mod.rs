//! Task primitives.
//!
//! This module defines how a unit of work is represented, scheduled and
//! observed:
//! - the scheduling state machine and the public [`TaskState`],
//! - the cancellation tree shared by scopes and tasks,
//! - the custom waker that reschedules a task,
//! - the [`Job`] and [`Deferred`] handles returned to users.
//!
//! Tasks are created through a [`Scope`](crate::Scope), the
//! [`GlobalScope`](crate::GlobalScope) or [`with_context`](crate::with_context);
//! this module only exposes the handles and the cooperative helpers that a
//! task body calls at its suspension points.

pub(crate) mod cancel;
pub(crate) mod core;
pub(crate) mod handle;
pub(crate) mod state;
pub(crate) mod waker;

pub(crate) use cancel::CancelToken;
pub(crate) use core::{Owner, Runnable, Supervisor, Task};

pub use core::TaskId;
pub use handle::{Deferred, Job};
pub use state::TaskState;

pub use crate::runtime::yield_now::yield_now;

use crate::error::{Error, Result};
use crate::runtime::context;

/// Checks whether the current task has been asked to cancel.
///
/// Long-running bodies that do not otherwise reach a suspension point call
/// this periodically. Outside of a task it always succeeds.
///
/// # Examples
///
/// ```rust,ignore
/// for chunk in work {
///     task::ensure_active()?;
///     process(chunk);
/// }
/// ```
pub fn ensure_active() -> Result<()> {
    if context::is_cancelled() {
        return Err(Error::Cancelled);
    }

    Ok(())
}

/// Returns the id of the task currently running on this thread.
pub fn current_id() -> Option<TaskId> {
    context::current_task_id()
}
