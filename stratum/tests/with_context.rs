use std::thread;
use std::time::{Duration, Instant};
use stratum::task::TaskState;
use stratum::time::{delay, instrumented};
use stratum::{Dispatcher, Error, Result, Scope, run_blocking, with_context};

const PAUSE: Duration = Duration::from_millis(100);

async fn calculate(start: u64) -> Result<u64> {
    delay(PAUSE).await?;
    Ok(start * 10)
}

#[stratum::test]
async fn test_with_context_runs_sequentially() -> Result<()> {
    let default = Dispatcher::default();

    let (sum, elapsed) = instrumented(async {
        let first = with_context(&default, calculate(10)).await?;
        let second = with_context(&default, calculate(20)).await?;
        let third = with_context(&default, calculate(30)).await?;

        Ok::<_, Error>(first + second + third)
    })
    .await;

    assert_eq!(sum?, 600);
    assert!(elapsed >= PAUSE * 3, "took {elapsed:?}");

    Ok(())
}

#[test]
fn test_with_context_runs_on_the_target_dispatcher() {
    let pool = Dispatcher::builder()
        .worker_threads(1)
        .name("context-pool")
        .build()
        .unwrap();

    let target = pool.clone();
    let (inside, outside) = run_blocking(move |_scope| async move {
        let inside = with_context(&target, async { Ok(thread::current().name().map(str::to_owned)) }).await?;
        let outside = thread::current().name().map(str::to_owned);
        Ok((inside, outside))
    })
    .unwrap();

    assert_eq!(inside.as_deref(), Some("context-pool-worker-0"));
    assert!(outside.unwrap().starts_with("stratum-default-worker-"));

    pool.shutdown();
    pool.await_termination().unwrap();
}

#[stratum::test]
async fn test_with_context_returns_the_failure_directly() {
    let outcome = with_context(&Dispatcher::default(), async {
        delay(PAUSE).await?;
        Err::<(), _>(Error::failed("switched body broke"))
    })
    .await;

    assert_eq!(outcome.unwrap_err().to_string(), "switched body broke");
}

#[test]
fn test_with_context_failure_does_not_fail_the_scope_if_handled() {
    let value = run_blocking(|_scope| async {
        let recovered = with_context(&Dispatcher::default(), async { Err::<u64, _>(Error::failed("nope")) })
            .await
            .unwrap_or(7);

        Ok(recovered)
    })
    .unwrap();

    assert_eq!(value, 7);
}

#[stratum::test]
async fn test_cancelling_the_caller_cancels_the_switched_body(scope: Scope) -> Result<()> {
    let start = Instant::now();

    let caller = scope.spawn(async {
        with_context(&Dispatcher::default(), async {
            delay(PAUSE * 20).await?;
            Ok(1)
        })
        .await
    })?;

    delay(PAUSE).await?;
    caller.cancel();

    caller.join().await;
    assert_eq!(caller.state(), TaskState::Cancelled);
    assert!(start.elapsed() < PAUSE * 10);

    Ok(())
}

#[test]
fn test_with_context_on_shut_down_dispatcher_fails_fast() {
    let pool = Dispatcher::fixed(1).unwrap();
    pool.shutdown();

    let target = pool.clone();
    let outcome = run_blocking(move |_scope| async move {
        Ok(with_context(&target, async { Ok(()) }).await)
    })
    .unwrap();

    assert!(matches!(outcome, Err(Error::DispatcherShutdown { .. })));
}
