use crate::runtime::task::Runnable;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

type Slot = Arc<dyn Runnable>;

/// Run queue owned by one worker.
///
/// The owner works at the back, so a freshly spawned child runs next.
/// Thieves take from the front, oldest work first.
pub(crate) struct LocalQueue {
    tasks: Mutex<VecDeque<Slot>>,
}

impl LocalQueue {
    pub(crate) fn new() -> Self {
        Self {
            tasks: Mutex::new(VecDeque::new()),
        }
    }

    pub(crate) fn push(&self, task: Slot) {
        self.tasks.lock().unwrap().push_back(task);
    }

    pub(crate) fn pop(&self) -> Option<Slot> {
        self.tasks.lock().unwrap().pop_back()
    }

    /// Moves half of this queue (rounded up) into `thief` and returns one
    /// of the moved tasks to run immediately.
    ///
    /// Taking a batch keeps an idle worker from coming back to the same
    /// victim for every single task.
    pub(crate) fn steal_into(&self, thief: &LocalQueue) -> Option<Slot> {
        let mut batch = {
            let mut tasks = self.tasks.lock().unwrap();
            let take = tasks.len().div_ceil(2);
            tasks.drain(..take).collect::<VecDeque<_>>()
        };

        let first = batch.pop_front()?;

        if !batch.is_empty() {
            thief.tasks.lock().unwrap().extend(batch);
        }

        Some(first)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl Runnable for Noop {
        fn run(self: Arc<Self>) {}
    }

    fn filled(n: usize) -> LocalQueue {
        let queue = LocalQueue::new();
        for _ in 0..n {
            queue.push(Arc::new(Noop));
        }
        queue
    }

    #[test]
    fn steal_takes_half_rounded_up() {
        let victim = filled(5);
        let thief = LocalQueue::new();

        assert!(victim.steal_into(&thief).is_some());
        assert_eq!(victim.len(), 2);
        assert_eq!(thief.len(), 2);
    }

    #[test]
    fn steal_from_empty_queue_finds_nothing() {
        let victim = LocalQueue::new();
        let thief = LocalQueue::new();

        assert!(victim.steal_into(&thief).is_none());
        assert_eq!(thief.len(), 0);
    }

    #[test]
    fn owner_pops_newest_first() {
        let queue = LocalQueue::new();
        let first: Slot = Arc::new(Noop);
        let second: Slot = Arc::new(Noop);

        queue.push(first.clone());
        queue.push(second.clone());

        assert!(queue.pop().is_some_and(|t| Arc::ptr_eq(&t, &second)));
        assert!(queue.pop().is_some_and(|t| Arc::ptr_eq(&t, &first)));
    }
}
