//! Task executor backing a dispatcher.
//!
//! - [`core`]: worker start-up, task submission and lifecycle,
//! - [`worker`]: the per-thread work-stealing loop.

pub(crate) mod core;
pub(crate) mod worker;

pub(crate) use core::Executor;
