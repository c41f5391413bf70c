//! # Stratum
//!
//! **Stratum** is a small structured-concurrency layer on top of a
//! work-stealing executor. It shows how concurrent work is started, awaited,
//! moved between thread pools and torn down, with the lifetime of every task
//! tied to the scope that started it.
//!
//! It provides:
//!
//! - **Blocking scopes**: [`run_blocking`] opens a [`Scope`] and blocks the
//!   calling thread until the scope and all of its children are done
//! - **Fire-and-forget tasks**: [`Scope::launch`] returns a
//!   [`Job`](task::Job) that can be joined or cancelled
//! - **Deferred results**: [`Scope::spawn`] returns a
//!   [`Deferred`](task::Deferred) whose value (or failure) is observed at
//!   `.await`
//! - **Dispatchers**: a process-wide default pool, and custom pools built
//!   with [`Dispatcher::builder`] that must be shut down explicitly
//! - **Context switching**: [`with_context`] runs a body on another
//!   dispatcher and suspends the caller until it completes
//! - **Unstructured tasks**: the [`GlobalScope`], whose tasks nobody waits for
//! - **Timers**: [`time::delay`] suspends a task without blocking its worker
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use stratum::time::delay;
//!
//! fn main() -> stratum::Result<()> {
//!     let total = stratum::run_blocking(|scope| async move {
//!         let a = scope.spawn(async {
//!             delay(Duration::from_millis(100)).await?;
//!             Ok(1)
//!         })?;
//!         let b = scope.spawn(async {
//!             delay(Duration::from_millis(100)).await?;
//!             Ok(2)
//!         })?;
//!
//!         // Both bodies ran concurrently: this takes about 100ms.
//!         Ok(a.await? + b.await?)
//!     })?;
//!
//!     assert_eq!(total, 3);
//!     Ok(())
//! }
//! ```
//!
//! ## Failures and cancellation
//!
//! Task bodies return [`Result`]. A failing child fails its scope and
//! cancels its siblings; cancellation is cooperative and surfaces as
//! [`Error::Cancelled`] from the next suspension point ([`time::delay`],
//! [`yield_now`], [`task::ensure_active`] or awaiting a
//! [`Deferred`](task::Deferred)). A panic inside a body is
//! caught and reported as [`Error::Panicked`].
//!
//! ## Modules
//!
//! - [`task`]: task handles, states and cooperative helpers
//! - [`time`]: delays and elapsed-time measurement

mod error;
mod reactor;
mod runtime;
mod scope;

pub mod time;

pub use error::{Error, Result};
pub use runtime::builder::DispatcherBuilder;
pub use runtime::dispatcher::{DEFAULT_THREADS_ENV, Dispatcher};
pub use runtime::task;
pub use runtime::yield_now::yield_now;
pub use scope::{GlobalScope, Scope, run_blocking, run_blocking_on, with_context};

pub use stratum_macros::test;
