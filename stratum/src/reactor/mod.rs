//! Timer reactor.
//!
//! The reactor is a single process-wide thread that owns every pending
//! timer. It is responsible for:
//! - keeping timers ordered by deadline,
//! - sleeping until the earliest deadline (or until a new timer arrives),
//! - waking the task that registered a timer once it expires.
//!
//! It runs independently from the dispatchers and communicates with them
//! only through timer registrations and task wakers, so a task delayed on a
//! custom pool and a task delayed on the default pool share the same clock.

mod core;
mod poller;
mod timer;

pub(crate) use core::handle;
pub(crate) use timer::TimerEntry;
