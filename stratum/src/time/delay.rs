use crate::error::{Error, Result};
use crate::reactor::{self, TimerEntry};
use crate::runtime::context;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Suspends the current task for `duration` without blocking its worker
/// thread.
///
/// The worker is free to run other tasks while the delay is pending, and
/// the task may resume on a different worker.
///
/// A delay is a cancellation check point: it resolves to
/// [`Error::Cancelled`] as soon as the current task is asked to stop,
/// even if the deadline has not been reached.
///
/// A duration too large to represent as an [`Instant`] never elapses:
/// `delay(Duration::MAX)` waits until the task is cancelled.
///
/// # Examples
///
/// ```rust,ignore
/// use std::time::Duration;
///
/// delay(Duration::from_millis(10)).await?;
/// ```
pub fn delay(duration: Duration) -> Delay {
    Delay::new(duration)
}

/// Future returned by [`delay`].
///
/// The timer is registered with the reactor on first poll and is
/// discarded by the reactor if the `Delay` is dropped before it fires.
pub struct Delay {
    /// Absolute point in time when the delay completes; `None` never does.
    deadline: Option<Instant>,

    /// Whether the timer has been handed to the reactor.
    registered: bool,

    /// Cancellation flag shared with the reactor's timer entry.
    cancelled: Arc<AtomicBool>,
}

impl Delay {
    pub(crate) fn new(duration: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(duration),
            registered: false,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The instant at which the delay elapses, or `None` if it never does.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

impl Future for Delay {
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if context::is_cancelled() {
            return Poll::Ready(Err(Error::Cancelled));
        }

        let Some(deadline) = this.deadline else {
            context::register_cancellation(cx.waker());
            return Poll::Pending;
        };

        if Instant::now() >= deadline {
            return Poll::Ready(Ok(()));
        }

        context::register_cancellation(cx.waker());

        if !this.registered {
            this.registered = true;

            let entry = TimerEntry::new(deadline, cx.waker().clone(), this.cancelled.clone());

            if reactor::handle().register(entry).is_err() {
                tracing::error!("timer reactor is gone, delay resolves immediately");
                return Poll::Ready(Ok(()));
            }
        }

        Poll::Pending
    }
}

impl Drop for Delay {
    /// Tells the reactor to discard the timer if it has not fired yet.
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Release);
    }
}
