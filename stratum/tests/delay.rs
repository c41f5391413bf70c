use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use stratum::time::{delay, instrumented};
use stratum::{Result, Scope};

#[stratum::test]
async fn test_delay_waits_at_least_the_duration() {
    let start = Instant::now();

    delay(Duration::from_millis(50)).await.unwrap();

    assert!(start.elapsed() >= Duration::from_millis(50));
}

#[stratum::test]
async fn test_zero_delay_resolves_immediately() {
    let start = Instant::now();

    delay(Duration::ZERO).await.unwrap();

    assert!(start.elapsed() < Duration::from_millis(50));
}

#[stratum::test]
async fn test_delay_deadline_is_fixed_at_creation() {
    let before = Instant::now();
    let pending = delay(Duration::from_millis(30));
    let deadline = pending.deadline().unwrap();

    assert!(deadline >= before + Duration::from_millis(30));

    pending.await.unwrap();
    assert!(Instant::now() >= deadline);
}

#[test]
fn test_overflowing_delay_has_no_deadline() {
    assert!(delay(Duration::MAX).deadline().is_none());
}

#[stratum::test]
async fn test_delays_in_separate_tasks_overlap(scope: Scope) -> Result<()> {
    let (_, elapsed) = instrumented(async {
        let tasks = (0..10)
            .map(|_| {
                scope.spawn(async {
                    delay(Duration::from_millis(100)).await?;
                    Ok(())
                })
            })
            .collect::<Result<Vec<_>>>()?;

        for task in tasks {
            task.await?;
        }

        Ok::<_, stratum::Error>(())
    })
    .await;

    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_millis(500), "took {elapsed:?}");

    Ok(())
}

#[stratum::test]
async fn test_earlier_deadlines_fire_first(scope: Scope) -> Result<()> {
    let order = Arc::new(Mutex::new(Vec::new()));

    for ms in [90u64, 30, 60] {
        let order = order.clone();

        scope.launch(async move {
            delay(Duration::from_millis(ms)).await?;
            order.lock().unwrap().push(ms);
            Ok(())
        })?;
    }

    delay(Duration::from_millis(200)).await?;

    assert_eq!(*order.lock().unwrap(), vec![30, 60, 90]);

    Ok(())
}

#[stratum::test]
async fn test_instrumented_measures_from_first_poll() {
    let measured = instrumented(async {
        delay(Duration::from_millis(40)).await.unwrap();
        "done"
    });

    thread::sleep(Duration::from_millis(200));

    let (value, elapsed) = measured.await;

    assert_eq!(value, "done");
    assert!(elapsed >= Duration::from_millis(40));
    assert!(elapsed < Duration::from_millis(200));
}
