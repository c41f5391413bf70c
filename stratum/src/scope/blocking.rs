use super::Scope;
use crate::error::{Error, Result};
use crate::runtime::dispatcher::Dispatcher;
use crate::runtime::task::{CancelToken, Owner};

use std::sync::mpsc;

/// Runs `body` in a new scope on the default dispatcher and blocks the
/// calling thread until the scope completes.
///
/// This is the bridge from ordinary blocking code into the task world. The
/// call returns only once `body` **and every task it started in the scope**
/// are terminal, then yields the body's value.
///
/// # Errors
///
/// - the first failure of the body or of any child, in which case the other
///   children were cancelled and still waited for;
/// - [`Error::BlockingInWorker`] when called from a worker of the default
///   dispatcher, which could deadlock it.
///
/// # Examples
///
/// ```rust,ignore
/// let value = run_blocking(|scope| async move {
///     scope.launch(async {
///         delay(Duration::from_millis(10)).await?;
///         Ok(())
///     })?;
///
///     Ok(42)
/// })?;
///
/// assert_eq!(value, 42);
/// ```
pub fn run_blocking<F, Fut, T>(body: F) -> Result<T>
where
    F: FnOnce(Scope) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    run_blocking_on(&Dispatcher::default(), body)
}

/// Like [`run_blocking`], but the scope's tasks run on `dispatcher` by
/// default.
pub fn run_blocking_on<F, Fut, T>(dispatcher: &Dispatcher, body: F) -> Result<T>
where
    F: FnOnce(Scope) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    if dispatcher.is_current() {
        return Err(Error::BlockingInWorker {
            name: dispatcher.name().to_owned(),
        });
    }

    let scope = Scope::new(dispatcher.clone());
    let body = body(scope.clone());

    tracing::debug!(scope = scope.id(), dispatcher = %dispatcher.name(), "entering blocking scope");

    let (transmitter, receiver) = mpsc::channel();

    // The body runs as the first child of the scope, so its failure is
    // handled like any other child's. The root only waits and reports.
    let root_scope = scope.clone();
    let root = async move {
        let outcome = match root_scope.spawn(body) {
            Ok(deferred) => deferred.outcome().await,
            Err(err) => Err(err),
        };

        root_scope.children_done().await;

        let result = match root_scope.failure() {
            Some(err) => Err(err),
            None => outcome,
        };

        let _ = transmitter.send(result);
        Ok(())
    };

    dispatcher.spawn(root, CancelToken::default(), Owner::Caller)?;

    // The transmitter only disappears without sending if the root was torn
    // down before completing.
    let result = receiver.recv().unwrap_or(Err(Error::Cancelled));

    tracing::debug!(scope = scope.id(), ok = result.is_ok(), "leaving blocking scope");

    result
}
