use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// An unbounded FIFO queue that blocks consumers until an item arrives
/// or the queue is closed.
///
/// Closing is one-way: a closed queue rejects every `push`, but items
/// already queued stay poppable until drained.
pub struct BlockingQueue<T> {
    state: Mutex<State<T>>,
    available: Condvar,
}

struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

impl<T> BlockingQueue<T> {
    /// Creates an empty, open queue.
    pub fn new() -> Self {
        BlockingQueue {
            state: Mutex::new(State {
                items: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Appends `item` at the tail and wakes one blocked `pop`.
    ///
    /// Returns `false` without queueing anything if the queue is closed.
    /// Never blocks beyond acquiring the internal lock.
    pub fn push(&self, item: T) -> bool {
        {
            let mut state = self.lock();
            if state.closed {
                return false;
            }
            state.items.push_back(item);
        }
        self.available.notify_one();
        true
    }

    /// Removes and returns the head item.
    ///
    /// Blocks while the queue is empty and open. Returns `None` only once
    /// the queue is both closed and drained.
    pub fn pop(&self) -> Option<T> {
        let guard = self.lock();
        let mut state = self
            .available
            .wait_while(guard, |s| s.items.is_empty() && !s.closed)
            .unwrap_or_else(PoisonError::into_inner);
        state.items.pop_front()
    }

    /// Closes the queue and wakes every blocked `pop`. Repeated calls are
    /// harmless.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_all();
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of items currently queued.
    pub fn size(&self) -> usize {
        self.lock().items.len()
    }

    // Every critical section leaves `State` consistent, so a poisoned
    // lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_tracks_pushes_and_pops() {
        let q = BlockingQueue::new();
        assert_eq!(q.size(), 0);
        assert!(q.push("a"));
        assert!(q.push("b"));
        assert_eq!(q.size(), 2);
        assert_eq!(q.pop(), Some("a"));
        assert_eq!(q.size(), 1);
    }

    #[test]
    fn close_is_idempotent() {
        let q: BlockingQueue<u8> = BlockingQueue::new();
        q.close();
        q.close();
        assert!(q.is_closed());
        assert_eq!(q.pop(), None);
    }
}
