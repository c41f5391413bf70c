//! Structured concurrency scopes.
//!
//! A [`Scope`] owns every task launched or spawned through it: it is not
//! complete until all of them are terminal, and the first failure of any of
//! them cancels the others. The [`GlobalScope`] is the unstructured
//! counterpart: nothing waits for its tasks.
//!
//! Scopes are opened with [`run_blocking`], which bridges the blocking world
//! and the task world, and nested work is moved between dispatchers with
//! [`with_context`].

mod blocking;
mod context_switch;
mod global;

pub use blocking::{run_blocking, run_blocking_on};
pub use context_switch::with_context;
pub use global::GlobalScope;

use crate::error::{Error, Result};
use crate::runtime::dispatcher::Dispatcher;
use crate::runtime::task::{CancelToken, Deferred, Job, Owner, Supervisor, Task, TaskId};

use std::fmt;
use std::future::poll_fn;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::task::{Poll, Waker};

/// A structured task scope.
///
/// Every task started through a scope is its child. The scope:
/// - waits for all of its children before the enclosing
///   [`run_blocking`] returns,
/// - records the first failure of a child, and cancels every other child
///   when one occurs,
/// - never counts a cancellation as a failure.
///
/// `Scope` is a cheap, cloneable handle; clones refer to the same scope and
/// can be moved into child bodies to launch grandchildren.
///
/// # Examples
///
/// ```rust,ignore
/// run_blocking(|scope| async move {
///     let a = scope.spawn(async { Ok(1) })?;
///     let b = scope.spawn(async { Ok(2) })?;
///
///     assert_eq!(a.await? + b.await?, 3);
///     Ok(())
/// })?;
/// ```
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    id: u64,
    dispatcher: Dispatcher,
    cancel: CancelToken,

    /// First non-cancellation failure of a child.
    failure: OnceLock<Error>,
    children: Mutex<Children>,
}

#[derive(Default)]
struct Children {
    live: usize,

    /// Woken when `live` drops to zero.
    waiters: Vec<Waker>,
}

impl Scope {
    pub(crate) fn new(dispatcher: Dispatcher) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);

        Self {
            inner: Arc::new(ScopeInner {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                dispatcher,
                cancel: CancelToken::default(),
                failure: OnceLock::new(),
                children: Mutex::new(Children::default()),
            }),
        }
    }

    /// Process-unique id of this scope.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Dispatcher used by [`launch`](Self::launch) and [`spawn`](Self::spawn).
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    /// Starts a fire-and-forget child on the scope's dispatcher.
    ///
    /// The child runs concurrently with the caller; the scope will not
    /// complete before it does. If it fails, the scope fails and its other
    /// children are cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DispatcherShutdown`] if the dispatcher no longer
    /// accepts tasks. Nothing is started in that case.
    pub fn launch<F>(&self, future: F) -> Result<Job>
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.launch_on(&self.inner.dispatcher, future)
    }

    /// Starts a fire-and-forget child on `dispatcher`.
    ///
    /// The child still belongs to this scope.
    pub fn launch_on<F>(&self, dispatcher: &Dispatcher, future: F) -> Result<Job>
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.start_child(dispatcher, future).map(Job::new)
    }

    /// Starts a child producing a value, on the scope's dispatcher.
    ///
    /// The returned [`Deferred`] yields the value, or the child's failure,
    /// when awaited. Children spawned before the first `.await` run
    /// concurrently.
    pub fn spawn<F, T>(&self, future: F) -> Result<Deferred<T>>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.spawn_on(&self.inner.dispatcher, future)
    }

    /// Starts a child producing a value, on `dispatcher`.
    pub fn spawn_on<F, T>(&self, dispatcher: &Dispatcher, future: F) -> Result<Deferred<T>>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.start_child(dispatcher, future).map(Deferred::new)
    }

    /// Cancels every child of the scope.
    ///
    /// Cancellation is cooperative: children observe it at their next
    /// suspension point. Children started afterwards are cancelled at once.
    pub fn cancel(&self) {
        self.inner.cancel.cancel();
    }

    /// Returns `false` once the scope has been cancelled or has failed.
    pub fn is_active(&self) -> bool {
        !self.inner.cancel.is_cancelled()
    }

    /// Number of children not yet terminal.
    pub fn active_children(&self) -> usize {
        self.inner.children.lock().unwrap().live
    }

    /// First failure recorded by the scope.
    pub(crate) fn failure(&self) -> Option<Error> {
        self.inner.failure.get().cloned()
    }

    /// Resolves once every child is terminal.
    pub(crate) async fn children_done(&self) {
        poll_fn(|cx| {
            let mut children = self.inner.children.lock().unwrap();

            if children.live == 0 {
                return Poll::Ready(());
            }

            if !children.waiters.iter().any(|w| w.will_wake(cx.waker())) {
                children.waiters.push(cx.waker().clone());
            }

            Poll::Pending
        })
        .await
    }

    fn start_child<F, T>(&self, dispatcher: &Dispatcher, future: F) -> Result<Arc<Task<T>>>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        // Counted before submission: the child may finish before `spawn` returns.
        self.inner.children.lock().unwrap().live += 1;

        let supervisor: Arc<dyn Supervisor> = self.inner.clone();
        let owner = Owner::Scope(Arc::downgrade(&supervisor));

        match dispatcher.spawn(future, self.inner.cancel.child(), owner) {
            Ok(task) => {
                tracing::trace!(scope = self.inner.id, task = %task.id(), "child started");
                Ok(task)
            }
            Err(err) => {
                self.inner.release_child();
                Err(err)
            }
        }
    }
}

impl ScopeInner {
    fn record_failure(&self, task: TaskId, error: &Error) {
        if self.failure.set(error.clone()).is_ok() {
            tracing::warn!(scope = self.id, task = %task, error = %error, "child failed, cancelling scope");
        }

        self.cancel.cancel();
    }

    fn release_child(&self) {
        let waiters = {
            let mut children = self.children.lock().unwrap();
            children.live -= 1;

            if children.live == 0 {
                std::mem::take(&mut children.waiters)
            } else {
                Vec::new()
            }
        };

        for waiter in waiters {
            waiter.wake();
        }
    }
}

impl Supervisor for ScopeInner {
    fn child_completed(&self, task: TaskId, failure: Option<&Error>) {
        if let Some(error) = failure {
            self.record_failure(task, error);
        }

        self.release_child();
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id())
            .field("dispatcher", &self.dispatcher().name())
            .field("active_children", &self.active_children())
            .field("active", &self.is_active())
            .finish()
    }
}
