use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use stratum::time::delay;
use stratum::{Dispatcher, Error, Result, Scope, run_blocking, run_blocking_on};

const PAUSE: Duration = Duration::from_millis(100);

fn explode() -> Result<()> {
    panic!("child exploded")
}

#[test]
fn test_run_blocking_returns_body_value() {
    let value = run_blocking(|_scope| async { Ok(42) }).unwrap();

    assert_eq!(value, 42);
}

#[test]
fn test_run_blocking_waits_for_launched_children() {
    let finished = Arc::new(AtomicBool::new(false));
    let flag = finished.clone();
    let start = Instant::now();

    run_blocking(move |scope| async move {
        scope.launch(async move {
            delay(PAUSE).await?;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })?;

        Ok(())
    })
    .unwrap();

    assert!(finished.load(Ordering::SeqCst));
    assert!(start.elapsed() >= PAUSE);
}

#[test]
fn test_run_blocking_waits_for_grandchildren() {
    let finished = Arc::new(AtomicUsize::new(0));
    let counter = finished.clone();

    run_blocking(move |scope| async move {
        let nested = scope.clone();

        scope.launch(async move {
            for _ in 0..3 {
                let counter = counter.clone();

                nested.launch(async move {
                    delay(PAUSE).await?;
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })?;
            }

            Ok(())
        })?;

        Ok(())
    })
    .unwrap();

    assert_eq!(finished.load(Ordering::SeqCst), 3);
}

#[test]
fn test_run_blocking_returns_first_failure() {
    let outcome = run_blocking(|scope| async move {
        scope.launch(async {
            delay(PAUSE).await?;
            Err(Error::failed("child broke"))
        })?;

        Ok(())
    });

    match outcome {
        Err(Error::Failed(err)) => assert_eq!(err.to_string(), "child broke"),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn test_run_blocking_reports_body_failure() {
    let outcome: Result<()> = run_blocking(|_scope| async { Err(Error::failed("body broke")) });

    assert_eq!(outcome.unwrap_err().to_string(), "body broke");
}

#[test]
fn test_run_blocking_reports_panics() {
    let outcome = run_blocking(|scope| async move {
        scope.launch(async { explode() })?;
        Ok(())
    });

    match outcome {
        Err(Error::Panicked { message, .. }) => assert_eq!(message, "child exploded"),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn test_run_blocking_on_runs_on_the_given_dispatcher() {
    let pool = Dispatcher::builder()
        .worker_threads(2)
        .name("blocking-pool")
        .build()
        .unwrap();

    let name = run_blocking_on(&pool, |scope: Scope| async move {
        assert_eq!(scope.dispatcher().name(), "blocking-pool");
        Ok(thread::current().name().map(str::to_owned))
    })
    .unwrap();

    assert!(name.unwrap().starts_with("blocking-pool-worker-"));

    pool.shutdown();
    pool.await_termination().unwrap();
}

#[test]
fn test_run_blocking_on_shut_down_dispatcher_fails_fast() {
    let pool = Dispatcher::fixed(1).unwrap();
    pool.shutdown();

    let outcome = run_blocking_on(&pool, |_scope| async { Ok(()) });

    assert!(matches!(outcome, Err(Error::DispatcherShutdown { .. })));
}

#[test]
fn test_run_blocking_inside_a_worker_is_refused() {
    let nested = run_blocking(|_scope| async { Ok(run_blocking(|_scope| async { Ok(()) })) }).unwrap();

    assert!(matches!(nested, Err(Error::BlockingInWorker { .. })));
}

#[test]
fn test_cancelled_scope_without_failure_reports_cancellation() {
    let outcome = run_blocking(|scope| async move {
        scope.cancel();
        delay(PAUSE).await?;
        Ok(())
    });

    assert!(matches!(outcome, Err(Error::Cancelled)));
}
