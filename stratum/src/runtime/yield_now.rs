use crate::error::{Error, Result};
use crate::runtime::context;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A future that yields execution back to the dispatcher exactly once.
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = Result<()>;

    /// On the first poll, the task reschedules itself and returns `Pending`.
    /// On the second poll, it completes, unless the task was cancelled in
    /// between.
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if context::is_cancelled() {
            return Poll::Ready(Err(Error::Cancelled));
        }

        if !self.0 {
            self.0 = true;
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }

        Poll::Ready(Ok(()))
    }
}

/// Yields execution back to the dispatcher.
///
/// This allows other tasks to make progress before the current task
/// continues, and is a cancellation check point: it fails with
/// [`Error::Cancelled`] once the current task has been asked to stop.
///
/// # Examples
///
/// ```rust,ignore
/// async fn crunch() -> stratum::Result<()> {
///     for _ in 0..1_000 {
///         heavy_step();
///         yield_now().await?;
///     }
///     Ok(())
/// }
/// ```
pub async fn yield_now() -> Result<()> {
    YieldOnce(false).await
}
