use crate::error::Result;
use crate::runtime::dispatcher::Dispatcher;
use crate::runtime::task::{CancelToken, Deferred, Job, Owner};

/// The unstructured scope.
///
/// Tasks started here belong to nobody: no scope waits for them, their
/// failures cancel nothing and are only logged, and they keep running after
/// the code that started them has returned. A `run_blocking` that launches
/// into the `GlobalScope` without joining may well return, or the process
/// exit, before those tasks have run.
///
/// Prefer a [`Scope`](crate::Scope) unless a task genuinely has to outlive
/// its caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalScope;

impl GlobalScope {
    /// Starts a fire-and-forget task on the default dispatcher.
    pub fn launch<F>(future: F) -> Result<Job>
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        Self::launch_on(&Dispatcher::default(), future)
    }

    /// Starts a fire-and-forget task on `dispatcher`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DispatcherShutdown`](crate::Error::DispatcherShutdown)
    /// if `dispatcher` no longer accepts tasks.
    pub fn launch_on<F>(dispatcher: &Dispatcher, future: F) -> Result<Job>
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        dispatcher
            .spawn(future, CancelToken::default(), Owner::Global)
            .map(Job::new)
    }

    /// Starts a task producing a value on the default dispatcher.
    pub fn spawn<F, T>(future: F) -> Result<Deferred<T>>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        Self::spawn_on(&Dispatcher::default(), future)
    }

    /// Starts a task producing a value on `dispatcher`.
    pub fn spawn_on<F, T>(dispatcher: &Dispatcher, future: F) -> Result<Deferred<T>>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        dispatcher
            .spawn(future, CancelToken::default(), Owner::Global)
            .map(Deferred::new)
    }
}
