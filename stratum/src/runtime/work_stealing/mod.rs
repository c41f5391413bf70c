//! Work-stealing run queues.
//!
//! Each dispatcher owns:
//! - one [`injector`]: the global queue for submitted and woken tasks,
//!   which also tracks the dispatcher's live tasks and shutdown state,
//! - one local [`queue`] per worker, used for tasks spawned from inside
//!   that worker and stolen by idle siblings.

pub(crate) mod injector;
pub(crate) mod queue;
