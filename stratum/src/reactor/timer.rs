use std::cmp::Ordering;
use std::sync::Arc;
use std::sync::atomic::{self, AtomicBool, AtomicU64};
use std::task::Waker;
use std::time::Instant;

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A pending wake-up held by the reactor.
///
/// Entries are ordered by deadline, then by registration order, so two
/// delays with the same deadline resume in the order they were created.
pub(crate) struct TimerEntry {
    deadline: Instant,
    sequence: u64,
    waker: Waker,

    /// Set by the owning `Delay` when it is dropped.
    cancelled: Arc<AtomicBool>,
}

impl TimerEntry {
    pub(crate) fn new(deadline: Instant, waker: Waker, cancelled: Arc<AtomicBool>) -> Self {
        Self {
            deadline,
            sequence: NEXT_SEQUENCE.fetch_add(1, atomic::Ordering::Relaxed),
            waker,
            cancelled,
        }
    }

    pub(crate) fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Returns `true` once the owning delay has been dropped.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(atomic::Ordering::Acquire)
    }

    /// Wakes the registered task unless its delay was dropped.
    ///
    /// Returns whether a wake-up was delivered.
    pub(crate) fn fire(self) -> bool {
        if self.is_cancelled() {
            return false;
        }

        self.waker.wake();
        true
    }

    fn key(&self) -> (Instant, u64) {
        (self.deadline, self.sequence)
    }
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Ord for TimerEntry {
    /// Reversed: `BinaryHeap` is a max-heap and the earliest entry must
    /// surface first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;
    use std::task::Waker;
    use std::time::Duration;

    fn entry(deadline: Instant) -> TimerEntry {
        TimerEntry::new(deadline, Waker::noop().clone(), Arc::new(AtomicBool::new(false)))
    }

    #[test]
    fn heap_pops_earliest_deadline_first() {
        let now = Instant::now();
        let mut heap = BinaryHeap::new();

        for ms in [30, 10, 20] {
            heap.push(entry(now + Duration::from_millis(ms)));
        }

        let order: Vec<_> = std::iter::from_fn(|| heap.pop())
            .map(|e| e.deadline().duration_since(now).as_millis())
            .collect();

        assert_eq!(order, vec![10, 20, 30]);
    }

    #[test]
    fn equal_deadlines_keep_registration_order() {
        let deadline = Instant::now();
        let first = entry(deadline);
        let second = entry(deadline);
        let first_seq = first.sequence;

        let mut heap = BinaryHeap::from([second, first]);

        assert_eq!(heap.pop().map(|e| e.sequence), Some(first_seq));
    }

    #[test]
    fn cancelled_entry_does_not_fire() {
        let cancelled = Arc::new(AtomicBool::new(true));
        let entry = TimerEntry::new(Instant::now(), Waker::noop().clone(), cancelled);

        assert!(!entry.fire());
    }
}
