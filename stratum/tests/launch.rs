use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use stratum::task::TaskState;
use stratum::time::delay;
use stratum::{Dispatcher, Error, Result, Scope, run_blocking};

const PAUSE: Duration = Duration::from_millis(100);

#[stratum::test]
async fn test_launch_returns_without_waiting(scope: Scope) -> Result<()> {
    let job = scope.launch(async {
        delay(PAUSE).await?;
        Ok(())
    })?;

    assert!(!job.is_completed());
    assert_eq!(job.state(), TaskState::Pending);

    job.join().await;
    assert_eq!(job.state(), TaskState::Completed);

    Ok(())
}

#[stratum::test]
async fn test_launch_runs_concurrently_with_the_caller(scope: Scope) -> Result<()> {
    let started = Arc::new(AtomicBool::new(false));
    let flag = started.clone();

    let job = scope.launch(async move {
        flag.store(true, Ordering::SeqCst);
        Ok(())
    })?;

    delay(PAUSE).await?;

    assert!(started.load(Ordering::SeqCst));
    assert!(job.is_completed());

    Ok(())
}

#[test]
fn test_launch_on_custom_pool_is_still_waited_for() {
    let pool = Dispatcher::builder()
        .worker_threads(2)
        .name("launch-pool")
        .build()
        .unwrap();

    let thread_name = Arc::new(Mutex::new(None));
    let slot = thread_name.clone();

    let target = pool.clone();
    run_blocking(move |scope| async move {
        scope.launch_on(&target, async move {
            delay(PAUSE).await?;
            *slot.lock().unwrap() = thread::current().name().map(str::to_owned);
            Ok(())
        })?;

        // Shutting down while the child is in flight lets it drain.
        target.shutdown();
        Ok(())
    })
    .unwrap();

    let name = thread_name.lock().unwrap().take().unwrap();
    assert!(name.starts_with("launch-pool-worker-"));

    pool.await_termination().unwrap();
    assert_eq!(pool.active_tasks(), 0);
}

#[test]
fn test_failed_child_cancels_its_siblings() {
    let sibling_cancelled = Arc::new(AtomicBool::new(false));
    let flag = sibling_cancelled.clone();
    let start = Instant::now();

    let outcome = run_blocking(move |scope| async move {
        scope.launch(async move {
            match delay(PAUSE * 20).await {
                Err(err) => {
                    flag.store(err.is_cancelled(), Ordering::SeqCst);
                    Err(err)
                }
                Ok(()) => Ok(()),
            }
        })?;

        scope.launch(async {
            delay(PAUSE).await?;
            Err(Error::failed("first failure"))
        })?;

        Ok(())
    });

    assert_eq!(outcome.unwrap_err().to_string(), "first failure");
    assert!(sibling_cancelled.load(Ordering::SeqCst));
    assert!(start.elapsed() < PAUSE * 10);
}

#[test]
fn test_only_the_first_failure_is_reported() {
    let outcome = run_blocking(|scope| async move {
        scope.launch(async {
            delay(PAUSE).await?;
            Err(Error::failed("first"))
        })?;

        // Still running when the scope is cancelled, so it never fails.
        scope.launch(async {
            delay(PAUSE * 3).await?;
            Err(Error::failed("second"))
        })?;

        Ok(())
    });

    assert_eq!(outcome.unwrap_err().to_string(), "first");
}

#[stratum::test]
async fn test_cancelled_child_does_not_fail_the_scope(scope: Scope) -> Result<()> {
    let job = scope.launch(async {
        delay(PAUSE * 20).await?;
        Ok(())
    })?;

    job.cancel();
    job.join().await;

    assert!(job.is_cancelled());
    assert_eq!(job.state(), TaskState::Cancelled);
    assert!(scope.is_active());

    Ok(())
}

#[test]
fn test_children_launched_after_cancel_are_cancelled() {
    let ran_to_end = Arc::new(AtomicBool::new(false));
    let flag = ran_to_end.clone();

    let job = run_blocking(move |scope| async move {
        scope.cancel();

        let job = scope.launch(async move {
            delay(PAUSE).await?;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })?;

        Ok(job)
    })
    .unwrap();

    // The scope waited for the child, which only saw the cancellation.
    assert_eq!(job.state(), TaskState::Cancelled);
    assert!(!ran_to_end.load(Ordering::SeqCst));
}

#[stratum::test]
async fn test_active_children_tracks_live_tasks(scope: Scope) -> Result<()> {
    let first = scope.launch(async {
        delay(PAUSE).await?;
        Ok(())
    })?;
    let second = scope.launch(async {
        delay(PAUSE).await?;
        Ok(())
    })?;

    // The test body itself is a child of the scope.
    assert_eq!(scope.active_children(), 3);

    first.join().await;
    second.join().await;
    assert_eq!(scope.active_children(), 1);

    Ok(())
}
