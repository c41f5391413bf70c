//! Time utilities.
//!
//! - [`delay`] suspends a task until a deadline, driven by the process-wide
//!   timer reactor,
//! - [`instrumented`] measures how long a future takes to complete.

mod delay;
mod instrumented;

#[doc(inline)]
pub use delay::{Delay, delay};

#[doc(inline)]
pub use instrumented::{Instrumented, instrumented};
