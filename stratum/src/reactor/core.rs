use super::poller::{Poller, Waker};
use super::timer::TimerEntry;

use std::collections::BinaryHeap;
use std::io;
use std::sync::mpsc::{Receiver, SendError, Sender, TryRecvError, channel};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Instant;

/// Name of the reactor thread.
const REACTOR_THREAD_NAME: &str = "stratum-timer";

/// Process-wide reactor handle, started on first use.
static REACTOR: OnceLock<ReactorHandle> = OnceLock::new();

/// Returns the handle to the process-wide timer reactor.
///
/// The reactor thread is started lazily the first time a timer is
/// registered and lives for the rest of the process.
///
/// # Panics
///
/// Panics if the operating system refuses to start the reactor thread.
pub(crate) fn handle() -> &'static ReactorHandle {
    REACTOR.get_or_init(|| Reactor::start().expect("failed to start the timer reactor"))
}

/// Cloneable handle used to submit timers to the reactor.
#[derive(Clone)]
pub(crate) struct ReactorHandle {
    transmitter: Sender<TimerEntry>,
    waker: Arc<Waker>,
}

impl ReactorHandle {
    /// Registers a timer and interrupts the reactor's current wait so
    /// the new deadline is taken into account.
    pub(crate) fn register(&self, entry: TimerEntry) -> Result<(), SendError<TimerEntry>> {
        self.transmitter.send(entry)?;
        self.waker.wake();

        Ok(())
    }
}

/// The reactor event loop state.
struct Reactor {
    /// Incoming timer registrations.
    receiver: Receiver<TimerEntry>,

    /// OS-level wait primitive.
    poller: Poller,

    /// Pending timers, earliest deadline first.
    timers: BinaryHeap<TimerEntry>,
}

impl Reactor {
    /// Spawns the reactor thread and returns a handle to it.
    fn start() -> io::Result<ReactorHandle> {
        let (transmitter, receiver) = channel();
        let poller = Poller::new()?;
        let waker = poller.waker();

        let mut reactor = Reactor {
            receiver,
            poller,
            timers: BinaryHeap::new(),
        };

        thread::Builder::new()
            .name(REACTOR_THREAD_NAME.to_owned())
            .spawn(move || {
                if let Err(err) = reactor.run() {
                    tracing::error!(error = %err, "timer reactor stopped");
                }
            })?;

        tracing::debug!("timer reactor started");

        Ok(ReactorHandle { transmitter, waker })
    }

    /// Runs the event loop until every handle has been dropped.
    fn run(&mut self) -> io::Result<()> {
        loop {
            let mut received = false;

            loop {
                match self.receiver.try_recv() {
                    Ok(entry) => {
                        self.timers.push(entry);
                        received = true;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return Ok(()),
                }
            }

            // Dropped delays only flag their entry; sweep them out so their
            // wakers are released before the deadline.
            if received {
                discard_cancelled(&mut self.timers);
            }

            let timeout = self
                .timers
                .peek()
                .map(|t| t.deadline().saturating_duration_since(Instant::now()));

            self.poller.wait(timeout)?;

            self.fire_expired();
        }
    }

    /// Wakes every timer whose deadline has passed.
    fn fire_expired(&mut self) {
        let now = Instant::now();
        let mut fired = 0usize;

        while self.timers.peek().is_some_and(|t| t.deadline() <= now) {
            let Some(timer) = self.timers.pop() else {
                break;
            };

            fired += usize::from(timer.fire());
        }

        if fired > 0 {
            tracing::trace!(fired, pending = self.timers.len(), "timers fired");
        }
    }
}

/// Removes the entries of dropped delays from `timers`.
fn discard_cancelled(timers: &mut BinaryHeap<TimerEntry>) {
    let before = timers.len();
    timers.retain(|t| !t.is_cancelled());

    let discarded = before - timers.len();
    if discarded > 0 {
        tracing::trace!(discarded, pending = timers.len(), "dropped timers discarded");
    }
}
