//! Stratum launch-pattern walkthrough.
//!
//! Each scenario runs one way of starting concurrent work and prints what
//! happens (ordering, worker thread names, elapsed time) to stdout.
//! Runtime logs go to stderr and are controlled by `RUST_LOG`.

mod scenarios;

use clap::{Parser, ValueEnum};
use std::num::NonZeroUsize;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stratum-demo")]
#[command(about = "Walks through the Stratum task launch patterns")]
#[command(version)]
struct Cli {
    /// Scenario to run
    #[arg(value_enum, default_value_t = Scenario::WithContext)]
    scenario: Scenario,

    /// Duration of every simulated piece of work, in milliseconds
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,

    /// Worker threads of the custom pool used by `launch-scoped`
    #[arg(long, default_value = "2")]
    pool_threads: NonZeroUsize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Scenario {
    /// Blocking scope printing around a delayed line
    Blocking,
    /// Blocking scope running on the default dispatcher
    BlockingDispatcher,
    /// Unstructured launch that is never waited for
    LaunchGlobal,
    /// Unstructured launch joined explicitly
    LaunchGlobalJoin,
    /// Structured launch on a custom pool
    LaunchScoped,
    /// Three concurrent deferred computations
    AsyncAwait,
    /// Three sequential context switches
    WithContext,
    /// A failing child observed at await, cancelling its sibling
    Failure,
}

/// Knobs shared by every scenario.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Settings {
    pub(crate) pause: Duration,
    pub(crate) pool_threads: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = Settings {
        pause: Duration::from_millis(cli.delay_ms),
        pool_threads: cli.pool_threads.get(),
    };

    tracing::debug!(scenario = ?cli.scenario, ?settings, "running scenario");

    match scenarios::run(cli.scenario, settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(scenario = ?cli.scenario, error = %err, "scenario failed");
            ExitCode::FAILURE
        }
    }
}
