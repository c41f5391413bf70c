use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use stratum::task::TaskState;
use stratum::time::delay;
use stratum::{Error, GlobalScope, Result, Scope, run_blocking};

const PAUSE: Duration = Duration::from_millis(300);

fn wait_for(flag: &AtomicBool, limit: Duration) -> bool {
    let deadline = Instant::now() + limit;

    while Instant::now() < deadline {
        if flag.load(Ordering::SeqCst) {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }

    flag.load(Ordering::SeqCst)
}

#[test]
fn test_global_tasks_are_not_waited_for() {
    let finished = Arc::new(AtomicBool::new(false));
    let flag = finished.clone();

    run_blocking(move |_scope| async move {
        GlobalScope::launch(async move {
            delay(PAUSE).await?;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })?;

        Ok(())
    })
    .unwrap();

    // The scope is over, the global task is still delayed.
    assert!(!finished.load(Ordering::SeqCst));

    // It keeps running on its own.
    assert!(wait_for(&finished, PAUSE * 10));
}

#[test]
fn test_joined_global_tasks_complete_inside_the_scope() {
    let finished = Arc::new(AtomicBool::new(false));
    let flag = finished.clone();

    run_blocking(move |_scope| async move {
        let job = GlobalScope::launch(async move {
            delay(PAUSE).await?;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })?;

        job.join().await;
        Ok(())
    })
    .unwrap();

    assert!(finished.load(Ordering::SeqCst));
}

#[stratum::test]
async fn test_global_failures_do_not_fail_the_caller(scope: Scope) -> Result<()> {
    let job = GlobalScope::launch(async { Err(Error::failed("nobody is listening")) })?;

    job.join().await;

    assert_eq!(job.state(), TaskState::Failed);
    assert!(scope.is_active());

    Ok(())
}

#[test]
fn test_cancelling_a_scope_leaves_global_tasks_alone() {
    let finished = Arc::new(AtomicBool::new(false));
    let flag = finished.clone();

    let job = run_blocking(move |scope| async move {
        let job = GlobalScope::launch(async move {
            delay(PAUSE).await?;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })?;

        scope.cancel();

        // The caller is cancelled, so this gives up instead of waiting.
        job.join().await;
        Ok(job)
    })
    .unwrap();

    assert!(!job.is_cancelled());
    assert!(!finished.load(Ordering::SeqCst));
    assert!(wait_for(&finished, PAUSE * 10));
}

#[stratum::test]
async fn test_global_spawn_yields_a_value() -> Result<()> {
    let deferred = GlobalScope::spawn(async {
        delay(Duration::from_millis(10)).await?;
        Ok(21 * 2)
    })?;

    assert_eq!(deferred.await?, 42);

    Ok(())
}
