use crate::{Scenario, Settings};

use std::thread;
use std::time::Duration;
use stratum::time::{delay, instrumented};
use stratum::{Dispatcher, Error, GlobalScope, Result, run_blocking, run_blocking_on, with_context};

pub(crate) fn run(scenario: Scenario, settings: Settings) -> Result<()> {
    match scenario {
        Scenario::Blocking => blocking(settings),
        Scenario::BlockingDispatcher => blocking_dispatcher(settings),
        Scenario::LaunchGlobal => launch_global(settings),
        Scenario::LaunchGlobalJoin => launch_global_join(settings),
        Scenario::LaunchScoped => launch_scoped(settings),
        Scenario::AsyncAwait => async_await(settings),
        Scenario::WithContext => with_context_sequential(settings),
        Scenario::Failure => failure(settings),
    }
}

fn thread_name() -> String {
    thread::current().name().unwrap_or("<unnamed>").to_owned()
}

async fn print_delayed(message: String, pause: Duration) -> Result<()> {
    delay(pause).await?;
    println!("{message}");
    Ok(())
}

async fn calculate_hard_things(start: u64, pause: Duration) -> Result<u64> {
    delay(pause).await?;
    Ok(start * 10)
}

/// The calling thread waits for the whole scope: prints one, two, three.
fn blocking(settings: Settings) -> Result<()> {
    run_blocking(move |_scope| async move {
        println!("one");
        print_delayed("two".to_owned(), settings.pause).await?;
        println!("three");
        Ok(())
    })
}

/// The body runs on default-pool workers; "three" is printed by the
/// blocked thread once the scope is done.
fn blocking_dispatcher(settings: Settings) -> Result<()> {
    run_blocking_on(&Dispatcher::default(), move |_scope| async move {
        println!("one - from thread {}", thread_name());
        print_delayed(format!("two - from thread {}", thread_name()), settings.pause).await
    })?;

    println!("three - from thread {}", thread_name());
    Ok(())
}

/// Nothing waits for the global task: the process usually exits before
/// "two" is printed.
fn launch_global(settings: Settings) -> Result<()> {
    run_blocking(move |_scope| async move {
        println!("one - from thread {}", thread_name());

        GlobalScope::launch(async move {
            print_delayed(format!("two - from thread {}", thread_name()), settings.pause).await
        })?;

        println!("three - from thread {}", thread_name());
        Ok(())
    })
}

/// Same as `launch_global`, but the job is joined before the scope ends.
fn launch_global_join(settings: Settings) -> Result<()> {
    run_blocking(move |_scope| async move {
        println!("one - from thread {}", thread_name());

        let job = GlobalScope::launch(async move {
            print_delayed(format!("two - from thread {}", thread_name()), settings.pause).await
        })?;

        println!("three - from thread {}", thread_name());
        job.join().await;
        Ok(())
    })
}

/// A structured child on a custom pool: no join needed, the scope waits.
///
/// The pool is shut down while the child is still delayed; the child
/// drains, later submissions would be refused.
fn launch_scoped(settings: Settings) -> Result<()> {
    let pool = Dispatcher::builder()
        .worker_threads(settings.pool_threads)
        .name("custom-pool")
        .build()?;

    let scope_pool = pool.clone();
    run_blocking(move |scope| async move {
        println!("one - from thread {}", thread_name());

        scope.launch_on(&scope_pool, async move {
            print_delayed(format!("two - from thread {}", thread_name()), settings.pause).await
        })?;

        println!("three - from thread {}", thread_name());

        scope_pool.shutdown();
        Ok(())
    })?;

    pool.await_termination()?;
    tracing::debug!(active = pool.active_tasks(), "custom pool terminated");

    Ok(())
}

/// Three deferreds started before the first await: about one pause total.
fn async_await(settings: Settings) -> Result<()> {
    let pause = settings.pause;

    run_blocking(move |scope| async move {
        let (sum, elapsed) = instrumented(async {
            let first = scope.spawn(calculate_hard_things(10, pause))?;
            let second = scope.spawn(calculate_hard_things(20, pause))?;
            let third = scope.spawn(calculate_hard_things(30, pause))?;

            Ok::<_, Error>(first.await? + second.await? + third.await?)
        })
        .await;

        println!("async/await result = {}", sum?);
        println!("Time taken: {}", elapsed.as_millis());
        Ok(())
    })
}

/// Three context switches in a row: about three pauses total.
fn with_context_sequential(settings: Settings) -> Result<()> {
    let pause = settings.pause;

    run_blocking(move |_scope| async move {
        let default = Dispatcher::default();

        let (sum, elapsed) = instrumented(async {
            let first = with_context(&default, calculate_hard_things(10, pause)).await?;
            let second = with_context(&default, calculate_hard_things(20, pause)).await?;
            let third = with_context(&default, calculate_hard_things(30, pause)).await?;

            Ok::<_, Error>(first + second + third)
        })
        .await;

        println!("with_context result = {}", sum?);
        println!("Time taken: {}", elapsed.as_millis());
        Ok(())
    })
}

/// A failing deferred is observed at its await; the scope fails and its
/// slow sibling is cancelled instead of finishing.
fn failure(settings: Settings) -> Result<()> {
    let pause = settings.pause;

    let outcome = run_blocking(move |scope| async move {
        scope.launch(async move {
            if let Err(err) = delay(pause * 5).await {
                println!("sibling stopped: {err}");
                return Err(err);
            }
            println!("sibling finished");
            Ok(())
        })?;

        let failing = scope.spawn(async move {
            delay(pause).await?;
            Err::<u64, _>(Error::failed("hard thing went wrong"))
        })?;

        if let Err(err) = failing.await {
            println!("await observed: {err}");
        }

        Ok(())
    });

    match outcome {
        Err(err) => println!("run_blocking returned: {err}"),
        Ok(()) => println!("run_blocking returned without failure"),
    }

    Ok(())
}
