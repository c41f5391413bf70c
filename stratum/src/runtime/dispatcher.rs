use super::builder::DispatcherBuilder;
use super::executor::Executor;
use crate::error::{Error, Result};
use crate::runtime::context;
use crate::runtime::task::{CancelToken, Owner, Task};

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::thread;

/// Environment variable overriding the size of the default dispatcher.
pub const DEFAULT_THREADS_ENV: &str = "STRATUM_DEFAULT_THREADS";

/// Thread-name prefix of the default dispatcher.
const DEFAULT_NAME: &str = "stratum-default";

/// The default dispatcher never has fewer workers than this.
const MIN_DEFAULT_THREADS: usize = 2;

static DEFAULT: OnceLock<Dispatcher> = OnceLock::new();

/// Where task bodies physically execute.
///
/// A `Dispatcher` is a cheap, cloneable handle over a pool of worker
/// threads running a work-stealing executor. There are two kinds:
///
/// - the **default** dispatcher ([`Dispatcher::default`]), shared by the
///   whole process, started on first use and never shut down;
/// - **custom** dispatchers built with [`Dispatcher::builder`] or
///   [`Dispatcher::fixed`], owned by whoever creates them.
///
/// A custom dispatcher must be shut down explicitly with
/// [`shutdown`](Self::shutdown) once it is no longer needed. Otherwise its
/// worker threads are leaked for the rest of the process.
///
/// # Examples
///
/// ```rust,ignore
/// let pool = Dispatcher::fixed(2)?;
///
/// run_blocking(|scope| async move {
///     scope.launch_on(&pool, async { Ok(()) })?;
///     Ok(())
/// })?;
///
/// pool.shutdown();
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    executor: Arc<Executor>,
    is_default: bool,
}

impl Dispatcher {
    /// Returns a builder for a custom dispatcher.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Starts a custom dispatcher backed by `threads` workers.
    ///
    /// # Panics
    ///
    /// Panics if `threads == 0`.
    pub fn fixed(threads: usize) -> Result<Self> {
        DispatcherBuilder::new().worker_threads(threads).build()
    }

    pub(crate) fn start(name: &str, threads: usize, is_default: bool) -> Result<Self> {
        Ok(Self {
            executor: Arc::new(Executor::new(name, threads)?),
            is_default,
        })
    }

    /// Process-unique id of this dispatcher.
    pub fn id(&self) -> u64 {
        self.executor.id()
    }

    /// Name used as the prefix of the worker thread names.
    pub fn name(&self) -> &str {
        self.executor.name()
    }

    /// Number of worker threads.
    pub fn capacity(&self) -> usize {
        self.executor.threads()
    }

    /// Returns `true` for the process-wide default dispatcher.
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has been called.
    pub fn is_shutdown(&self) -> bool {
        self.executor.is_shutdown()
    }

    /// Number of tasks accepted and not yet completed.
    pub fn active_tasks(&self) -> usize {
        self.executor.live_tasks()
    }

    /// Returns `true` if the calling thread is one of this dispatcher's workers.
    pub fn is_current(&self) -> bool {
        context::is_worker_of(self.id())
    }

    /// Stops accepting new tasks.
    ///
    /// Tasks already submitted keep running until they complete, then
    /// the worker threads exit. Any later submission fails with
    /// [`Error::DispatcherShutdown`].
    ///
    /// The default dispatcher lives as long as the process: calling this on
    /// it only logs a warning.
    pub fn shutdown(&self) {
        if self.is_default {
            tracing::warn!("ignoring shutdown of the default dispatcher");
            return;
        }

        self.executor.shutdown();
    }

    /// Blocks until every worker thread has exited.
    ///
    /// Call after [`shutdown`](Self::shutdown); the call returns once all
    /// in-flight tasks have drained. Before `shutdown`, and on the default
    /// dispatcher, it returns immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlockingInWorker`] when called from one of this
    /// dispatcher's workers, which would wait for itself.
    pub fn await_termination(&self) -> Result<()> {
        if self.is_current() {
            return Err(Error::BlockingInWorker {
                name: self.name().to_owned(),
            });
        }

        if self.is_default || !self.is_shutdown() {
            return Ok(());
        }

        self.executor.join();

        Ok(())
    }

    /// Submits a task body to this dispatcher.
    pub(crate) fn spawn<F, T>(
        &self,
        future: F,
        cancel: CancelToken,
        owner: Owner,
    ) -> Result<Arc<Task<T>>>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.executor.spawn(future, cancel, owner)
    }
}

impl Default for Dispatcher {
    /// Returns the process-wide default dispatcher, starting it on first use.
    ///
    /// It has one worker per available CPU (at least two), unless
    /// `STRATUM_DEFAULT_THREADS` holds a positive integer.
    ///
    /// # Panics
    ///
    /// Panics if the default dispatcher's worker threads cannot be started.
    fn default() -> Self {
        DEFAULT
            .get_or_init(|| {
                Dispatcher::start(DEFAULT_NAME, default_threads(), true)
                    .unwrap_or_else(|err| panic!("failed to start the default dispatcher: {err}"))
            })
            .clone()
    }
}

impl PartialEq for Dispatcher {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Dispatcher {}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("capacity", &self.capacity())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

/// Size of the default dispatcher.
fn default_threads() -> usize {
    let configured = std::env::var(DEFAULT_THREADS_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n > 0);

    match configured {
        Some(n) => n,
        None => thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .max(MIN_DEFAULT_THREADS),
    }
}
