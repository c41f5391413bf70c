use super::dispatcher::Dispatcher;
use crate::error::Result;

use std::thread;

/// Name used when the builder is not given one.
const DEFAULT_CUSTOM_NAME: &str = "stratum-pool";

/// Builder for custom dispatchers.
///
/// # Examples
///
/// ```rust,ignore
/// let pool = DispatcherBuilder::new()
///     .worker_threads(2)
///     .name("io-pool")
///     .build()?;
/// ```
pub struct DispatcherBuilder {
    /// Number of worker threads.
    worker_threads: usize,

    /// Prefix of the worker thread names.
    name: String,
}

impl DispatcherBuilder {
    /// Creates a builder with one worker per available CPU, falling back
    /// to `1` if unavailable.
    pub fn new() -> Self {
        let worker_threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            worker_threads,
            name: DEFAULT_CUSTOM_NAME.to_owned(),
        }
    }

    /// Sets the number of worker threads.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn worker_threads(mut self, n: usize) -> Self {
        assert!(n > 0, "worker_threads must be > 0");

        self.worker_threads = n;
        self
    }

    /// Sets the worker thread name prefix; workers are named
    /// `{name}-worker-{index}`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Starts the worker threads.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ThreadSpawn`](crate::Error::ThreadSpawn) if the
    /// operating system refuses to start a worker.
    pub fn build(self) -> Result<Dispatcher> {
        Dispatcher::start(&self.name, self.worker_threads, false)
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
