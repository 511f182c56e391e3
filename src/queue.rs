//! # Bounded FIFO queue of admitted task ids.
//!
//! [`TaskQueue`] holds ids of admitted, not-yet-started tasks in admission
//! order. Records live in the [`TaskRegistry`](crate::registry::TaskRegistry);
//! the queue only sequences execution.
//!
//! ## Rules
//! - `push` fails fast when full — callers handle rejection instead of being
//!   suspended on a shared structure.
//! - `pop` is only ever called by the host-thread pump.
//! - The lock is held for pointer manipulation only, never while a handler
//!   runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::tasks::TaskId;

/// Queue is at capacity; the submission must be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct QueueFull;

/// Thread-safe bounded FIFO of task ids.
#[derive(Debug)]
pub(crate) struct TaskQueue {
    inner: Mutex<VecDeque<TaskId>>,
    capacity: usize,
}

impl TaskQueue {
    /// Creates an empty queue with the given capacity (min 1, clamped).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Maximum number of queued ids.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current queue depth.
    pub fn depth(&self) -> usize {
        self.lock().len()
    }

    /// Returns true when a push would be rejected.
    pub fn is_full(&self) -> bool {
        self.depth() >= self.capacity
    }

    /// Appends an id to the tail; fails fast when at capacity.
    pub fn push(&self, id: TaskId) -> Result<(), QueueFull> {
        let mut q = self.lock();
        if q.len() >= self.capacity {
            return Err(QueueFull);
        }
        q.push_back(id);
        Ok(())
    }

    /// Removes and returns the head id, if any. Pump-only.
    pub fn pop(&self) -> Option<TaskId> {
        self.lock().pop_front()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<TaskId>> {
        // A poisoned queue lock would mean a panic inside pointer
        // manipulation; the deque itself is still structurally sound.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> TaskId {
        TaskId::generate()
    }

    #[test]
    fn test_fifo_order() {
        let q = TaskQueue::new(8);
        let (a, b, c) = (id(), id(), id());
        q.push(a).unwrap();
        q.push(b).unwrap();
        q.push(c).unwrap();

        assert_eq!(q.pop(), Some(a));
        assert_eq!(q.pop(), Some(b));
        assert_eq!(q.pop(), Some(c));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn test_push_fails_fast_when_full() {
        let q = TaskQueue::new(2);
        q.push(id()).unwrap();
        q.push(id()).unwrap();
        assert!(q.is_full());
        assert_eq!(q.push(id()), Err(QueueFull));
        assert_eq!(q.depth(), 2);
    }

    #[test]
    fn test_pop_frees_capacity() {
        let q = TaskQueue::new(1);
        q.push(id()).unwrap();
        assert_eq!(q.push(id()), Err(QueueFull));
        q.pop().unwrap();
        assert!(q.push(id()).is_ok());
    }

    #[test]
    fn test_capacity_clamped_to_one() {
        let q = TaskQueue::new(0);
        assert_eq!(q.capacity(), 1);
        assert!(q.push(id()).is_ok());
        assert_eq!(q.push(id()), Err(QueueFull));
    }
}
