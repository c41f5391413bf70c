use crate::runtime::context;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Measures how long `future` takes to complete.
///
/// Resolves to `(output, elapsed)`. The clock starts at the first poll, so
/// a future built early and awaited later is not charged for the wait.
///
/// # Examples
///
/// ```rust,ignore
/// let (sum, elapsed) = instrumented(async {
///     let a = scope.spawn(compute(10))?;
///     let b = scope.spawn(compute(20))?;
///     Ok::<_, Error>(a.await? + b.await?)
/// })
/// .await;
///
/// println!("took {elapsed:?}");
/// ```
pub fn instrumented<F: Future>(future: F) -> Instrumented<F> {
    Instrumented {
        future: Box::pin(future),
        started: None,
        suspensions: 0,
    }
}

/// Future returned by [`instrumented`].
pub struct Instrumented<F> {
    future: Pin<Box<F>>,
    started: Option<Instant>,

    /// Polls that returned `Pending`.
    suspensions: u32,
}

impl<F: Future> Future for Instrumented<F> {
    type Output = (F::Output, Duration);

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let started = *self.started.get_or_insert_with(Instant::now);

        let Poll::Ready(output) = self.future.as_mut().poll(cx) else {
            self.suspensions += 1;
            return Poll::Pending;
        };

        let elapsed = started.elapsed();

        tracing::trace!(
            task = ?context::current_task_id(),
            ?elapsed,
            suspensions = self.suspensions,
            "instrumented future completed"
        );

        Poll::Ready((output, elapsed))
    }
}
