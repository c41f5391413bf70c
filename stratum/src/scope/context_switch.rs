use crate::error::Result;
use crate::runtime::context;
use crate::runtime::dispatcher::Dispatcher;
use crate::runtime::task::{Deferred, Owner};

/// Runs `future` on `dispatcher` and suspends the caller until it completes.
///
/// The body is awaited in place: consecutive `with_context` calls run one
/// after the other, never concurrently. Its value or failure is returned
/// directly to the caller.
///
/// Cancelling the calling task also cancels the body. The caller still
/// waits for the body to stop before getting its outcome.
///
/// # Errors
///
/// The body's failure, or [`Error::DispatcherShutdown`](crate::Error::DispatcherShutdown)
/// if `dispatcher` no longer accepts tasks.
///
/// # Examples
///
/// ```rust,ignore
/// let io = Dispatcher::fixed(2)?;
///
/// let value = with_context(&io, async {
///     delay(Duration::from_millis(10)).await?;
///     Ok(7)
/// })
/// .await?;
/// ```
pub async fn with_context<F, T>(dispatcher: &Dispatcher, future: F) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let cancel = context::current_cancel_token()
        .map(|token| token.child())
        .unwrap_or_default();

    let task = dispatcher.spawn(future, cancel, Owner::Caller)?;

    tracing::trace!(dispatcher = %dispatcher.name(), task = %task.id(), "switched context");

    Deferred::new(task).outcome().await
}
