//! Platform-specific wait primitive for the timer reactor.
//!
//! The poller lets the reactor thread:
//! - block until the earliest timer deadline,
//! - be woken early when a new timer is registered from another thread.
//!
//! The concrete implementation is selected at compile time
//! depending on the target operating system.

#[cfg(target_os = "linux")]
mod epoll;

#[cfg(not(target_os = "linux"))]
mod condvar;

#[cfg(target_os = "linux")]
pub(crate) use epoll::{EpollPoller as Poller, Waker};

#[cfg(not(target_os = "linux"))]
pub(crate) use condvar::{CondvarPoller as Poller, Waker};
