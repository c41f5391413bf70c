//! Core runtime components.
//!
//! This module contains the execution machinery every higher-level
//! primitive is built on:
//! - dispatchers and their work-stealing executors,
//! - task representation, scheduling and cancellation,
//! - per-thread runtime context (current worker, current task),
//! - cooperative yielding.
//!
//! Users interact with it through [`Dispatcher`](crate::Dispatcher),
//! [`task`](crate::task) and the scope-level entry points.

mod executor;
mod work_stealing;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod dispatcher;
pub(crate) mod yield_now;

pub mod task;
