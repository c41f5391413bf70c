use crate::error::{Error, Result};
use crate::runtime::context;
use crate::runtime::executor::worker::Worker;
use crate::runtime::task::{CancelToken, Owner, Task};
use crate::runtime::work_stealing::injector::Injector;
use crate::runtime::work_stealing::queue::LocalQueue;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Multi-threaded work-stealing executor backing one dispatcher.
///
/// The `Executor` is responsible for:
/// - spawning and naming the worker threads,
/// - accepting tasks (or refusing them after shutdown),
/// - routing a new task to the local queue of the spawning worker when
///   possible, and to the injector otherwise,
/// - joining the worker threads once they have drained.
pub(crate) struct Executor {
    id: u64,
    name: String,
    threads: usize,

    injector: Arc<Injector>,
    locals: Arc<Vec<Arc<LocalQueue>>>,

    /// Join handles, taken by the first `join` call.
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Executor {
    /// Starts `threads` workers named `{name}-worker-{index}`.
    pub(crate) fn new(name: &str, threads: usize) -> Result<Self> {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);

        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let injector = Arc::new(Injector::new());

        let locals: Arc<Vec<_>> = Arc::new(
            (0..threads)
                .map(|_| Arc::new(LocalQueue::new()))
                .collect(),
        );

        let mut handles = Vec::with_capacity(threads);

        for index in 0..threads {
            let worker = Worker::new(id, index, locals.clone(), injector.clone());

            let spawned = thread::Builder::new()
                .name(format!("{name}-worker-{index}"))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    // Let the workers already started exit.
                    injector.shutdown();
                    return Err(Error::ThreadSpawn(Arc::new(err)));
                }
            }
        }

        tracing::info!(dispatcher = %name, id, threads, "dispatcher started");

        Ok(Self {
            id,
            name: name.to_owned(),
            threads,
            injector,
            locals,
            handles: Mutex::new(handles),
        })
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn threads(&self) -> usize {
        self.threads
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.injector.is_shutdown()
    }

    pub(crate) fn live_tasks(&self) -> usize {
        self.injector.live()
    }

    /// Submits a new task.
    ///
    /// Fails fast with [`Error::DispatcherShutdown`] once the executor has
    /// been shut down.
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
        if !self.injector.try_accept() {
            return Err(Error::DispatcherShutdown {
                name: self.name.clone(),
            });
        }

        let task = Arc::new(Task::new(future, self.injector.clone(), cancel, owner));

        tracing::debug!(dispatcher = %self.name, task = %task.id(), "task spawned");

        // Spawned from one of our own workers: keep it local.
        match context::current_worker().filter(|w| w.dispatcher == self.id) {
            Some(worker) => worker.locals[worker.index].push(task.clone()),
            None => self.injector.push(task.clone()),
        }

        Ok(task)
    }

    /// Stops accepting tasks. Live tasks keep running to completion.
    pub(crate) fn shutdown(&self) {
        if !self.injector.is_shutdown() {
            tracing::info!(dispatcher = %self.name, live = self.live_tasks(), "dispatcher shutting down");
        }

        self.injector.shutdown();
    }

    /// Waits for all worker threads to terminate.
    ///
    /// Must be called after `shutdown`, and never from one of the workers.
    pub(crate) fn join(&self) {
        let handles = std::mem::take(&mut *self.handles.lock().unwrap());

        for handle in handles {
            let _ = handle.join();
        }
    }
}
