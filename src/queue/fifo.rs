use std::collections::VecDeque;
use std::sync::Mutex;

use crate::queue::WorkQueue;

/// A first-in-first-out work queue whose process hook is a closure.
///
/// The simplest useful [`WorkQueue`]: items are drained in insertion order
/// and handed to `process_fn` one at a time. An optional capacity turns
/// `enqueue` into a rejecting operation once the backlog is full.
pub struct FifoQueue<T, F> {
    items: Mutex<VecDeque<T>>,
    capacity: Option<usize>,
    process_fn: F,
}

impl<T, F> FifoQueue<T, F> {
    /// Creates an unbounded FIFO queue.
    pub fn new(process_fn: F) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            capacity: None,
            process_fn,
        }
    }

    /// Creates a FIFO queue that rejects enqueues once `capacity` items are
    /// pending.
    pub fn bounded(capacity: usize, process_fn: F) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            capacity: Some(capacity),
            process_fn,
        }
    }

    /// Number of items currently pending. A snapshot; concurrent workers
    /// may drain the queue immediately after.
    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }
}

impl<T, F> WorkQueue for FifoQueue<T, F>
where
    T: Send + PartialEq + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    type Item = T;

    fn enqueue(&self, item: T) -> bool {
        let mut items = self.items.lock().unwrap();
        if self.capacity.is_some_and(|cap| items.len() >= cap) {
            return false;
        }
        items.push_back(item);
        true
    }

    fn dequeue(&self, item: &T) {
        let mut items = self.items.lock().unwrap();
        if let Some(pos) = items.iter().position(|queued| queued == item) {
            items.remove(pos);
        }
    }

    fn next(&self) -> Option<T> {
        self.items.lock().unwrap().pop_front()
    }

    fn process(&self, item: T) {
        (self.process_fn)(item)
    }

    fn clear(&self) {
        self.items.lock().unwrap().clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discard() -> impl Fn(u32) {
        |_| {}
    }

    #[test]
    fn drains_in_insertion_order() {
        let q = FifoQueue::new(discard());
        assert!(q.enqueue(1));
        assert!(q.enqueue(2));
        assert!(q.enqueue(3));
        assert_eq!(q.next(), Some(1));
        assert_eq!(q.next(), Some(2));
        assert_eq!(q.next(), Some(3));
        assert_eq!(q.next(), None);
    }

    #[test]
    fn bounded_queue_rejects_at_capacity() {
        let q = FifoQueue::bounded(2, discard());
        assert!(q.enqueue(1));
        assert!(q.enqueue(2));
        assert!(!q.enqueue(3));
        assert_eq!(q.len(), 2);
        assert_eq!(q.next(), Some(1));
        assert!(q.enqueue(3));
    }

    #[test]
    fn dequeue_removes_first_match_only() {
        let q = FifoQueue::new(discard());
        q.enqueue(7);
        q.enqueue(8);
        q.enqueue(7);
        q.dequeue(&7);
        assert_eq!(q.next(), Some(8));
        assert_eq!(q.next(), Some(7));
        assert_eq!(q.next(), None);
    }

    #[test]
    fn dequeue_of_absent_item_is_a_noop() {
        let q = FifoQueue::new(discard());
        q.enqueue(1);
        q.dequeue(&99);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn clear_empties_the_backlog() {
        let q = FifoQueue::new(discard());
        q.enqueue(1);
        q.enqueue(2);
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.next(), None);
    }
}
