//! Error types shared by every Stratum primitive.

use crate::runtime::task::TaskId;

use std::sync::Arc;

/// Convenience alias used by task bodies and runtime entry points.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while running a task.
///
/// The error is `Clone` because a single failure is usually observed twice:
/// once by the scope that owns the failed task, and once by whoever awaits
/// the task's [`Deferred`](crate::task::Deferred).
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The task body panicked. The panic was caught on the worker thread.
    #[error("task {task} panicked: {message}")]
    Panicked { task: TaskId, message: String },

    /// The task body returned an error.
    #[error("{0}")]
    Failed(Arc<dyn std::error::Error + Send + Sync>),

    /// The task observed a cancellation request at a suspension point.
    #[error("task was cancelled")]
    Cancelled,

    /// Work was submitted to a dispatcher after it was shut down.
    #[error("dispatcher `{name}` has been shut down")]
    DispatcherShutdown { name: String },

    /// A blocking call was made from one of the dispatcher's own workers.
    #[error("cannot block a worker thread of dispatcher `{name}`")]
    BlockingInWorker { name: String },

    /// The operating system refused to start a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    ThreadSpawn(Arc<std::io::Error>),
}

impl Error {
    /// Wraps any error (or message) as a task body failure.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// return Err(Error::failed("invalid input"));
    /// ```
    pub fn failed<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Failed(Arc::from(error.into()))
    }

    /// Returns `true` if this error only reports a cancellation.
    ///
    /// Cancellations are never treated as failures of the owning scope.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

