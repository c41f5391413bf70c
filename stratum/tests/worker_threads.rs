use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use stratum::time::{delay, instrumented};
use stratum::{Dispatcher, Error, Result, Scope, run_blocking_on};

const PAUSE: Duration = Duration::from_millis(100);

#[stratum::test(worker_threads = 1)]
async fn test_single_worker_runs_the_body(scope: Scope) -> Result<()> {
    assert_eq!(scope.dispatcher().capacity(), 1);

    let name = thread::current().name().map(str::to_owned).unwrap_or_default();
    assert_eq!(name, "test_single_worker_runs_the_body-worker-0");

    Ok(())
}

#[stratum::test(worker_threads = 1)]
async fn test_delays_do_not_hold_the_worker(scope: Scope) -> Result<()> {
    let (sum, elapsed) = instrumented(async {
        let deferreds = (1..=5u64)
            .map(|i| {
                scope.spawn(async move {
                    delay(PAUSE).await?;
                    Ok(i)
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut sum = 0;
        for deferred in deferreds {
            sum += deferred.await?;
        }

        Ok::<_, Error>(sum)
    })
    .await;

    assert_eq!(sum?, 15);
    assert!(elapsed < PAUSE * 3, "took {elapsed:?}");

    Ok(())
}

#[stratum::test(worker_threads = 4)]
async fn test_work_spreads_over_the_workers(scope: Scope) -> Result<()> {
    let names = Arc::new(Mutex::new(HashSet::new()));

    for _ in 0..32 {
        let names = names.clone();

        scope.launch(async move {
            // Occupy the worker so siblings get picked up elsewhere.
            thread::sleep(Duration::from_millis(5));
            names
                .lock()
                .unwrap()
                .insert(thread::current().name().map(str::to_owned));
            Ok(())
        })?;
    }

    delay(PAUSE * 3).await?;

    let names = names.lock().unwrap();
    assert!(names.len() > 1, "all work ran on {names:?}");
    assert!(names.iter().flatten().all(|name| name.starts_with("test_work_spreads_over_the_workers-worker-")));

    Ok(())
}

#[test]
fn test_many_small_tasks_complete() {
    let pool = Dispatcher::fixed(8).unwrap();
    let counter = Arc::new(Mutex::new(0));

    let total = counter.clone();
    run_blocking_on(&pool, move |scope| async move {
        for _ in 0..100 {
            let total = total.clone();

            scope.launch(async move {
                *total.lock().unwrap() += 1;
                Ok(())
            })?;
        }

        Ok(())
    })
    .unwrap();

    assert_eq!(*counter.lock().unwrap(), 100);

    pool.shutdown();
    pool.await_termination().unwrap();
}

#[test]
fn test_nested_spawns_resolve() {
    let pool = Dispatcher::fixed(4).unwrap();

    let value = run_blocking_on(&pool, |scope| async move {
        let inner = scope.clone();

        scope
            .spawn(async move {
                let second = inner.spawn(async { Ok(20) })?;
                Ok(second.await? + 1)
            })?
            .await
    })
    .unwrap();

    assert_eq!(value, 21);

    pool.shutdown();
    pool.await_termination().unwrap();
}
