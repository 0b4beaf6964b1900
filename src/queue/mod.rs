use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, MutexGuard};

use tracing::{error, trace};

use crate::pool::{PoolCore, Sched};

pub mod fifo;

pub use fifo::FifoQueue;

/// Abstract interface for a pool-scheduled work queue.
///
/// Implementors own their item storage behind interior mutability. Every
/// hook except [`process`](WorkQueue::process) is invoked with the owning
/// pool's lock held, so the hooks never race each other; `process` runs with
/// the lock released and may block, take other locks, or enqueue further
/// work (including into its own queue).
pub trait WorkQueue: Send + Sync + 'static {
    type Item: Send;

    /// Inserts an item. Returns whether the queue accepted it; a queue may
    /// reject, for example a duplicate or a capacity overflow.
    fn enqueue(&self, item: Self::Item) -> bool;

    /// Removes a specific item if present. No-op if absent.
    fn dequeue(&self, item: &Self::Item);

    /// Chooses and removes the next item to process, or `None` if nothing
    /// is ready. Ordering within the queue is the implementor's choice.
    fn next(&self) -> Option<Self::Item>;

    /// Performs the work. Called with the pool lock released.
    ///
    /// The hook may block and may enqueue more work, but it must not call
    /// `pause` or `stop` on its own pool; both wait for the hook itself and
    /// would deadlock.
    fn process(&self, item: Self::Item);

    /// Drops all pending items, releasing any resources they hold.
    fn clear(&self);
}

/// The type-erased capability set the pool schedules against.
///
/// `try_process` takes and returns the scheduler guard so the unlock window
/// around the process hook is explicit in the signature. It consumes the
/// caller's `Arc` so that, when the queue was deregistered during the
/// unlock window, the final reference is released there and not while the
/// lock is held; a queue may itself hold handles to other queues, whose
/// deregistration needs the lock.
pub(crate) trait ErasedQueue: Send + Sync {
    fn name(&self) -> &str;

    fn try_process<'a>(
        self: Arc<Self>,
        core: &'a PoolCore,
        sched: MutexGuard<'a, Sched>,
    ) -> (MutexGuard<'a, Sched>, bool);

    fn clear(&self);
}

/// A queue registered with a pool: the name plus the concrete queue.
struct Registered<Q: WorkQueue> {
    name: String,
    queue: Q,
}

impl<Q: WorkQueue> ErasedQueue for Registered<Q> {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_process<'a>(
        self: Arc<Self>,
        core: &'a PoolCore,
        sched: MutexGuard<'a, Sched>,
    ) -> (MutexGuard<'a, Sched>, bool) {
        let Some(item) = self.queue.next() else {
            return (sched, false);
        };
        drop(sched);
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| self.queue.process(item))) {
            error!(
                queue = %self.name,
                panic = panic_message(&payload),
                "process hook panicked; item dropped"
            );
        } else {
            trace!(queue = %self.name, "processed one item");
        }
        drop(self);
        (core.lock_sched(), true)
    }

    fn clear(&self) {
        self.queue.clear();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Owner-side handle to a queue registered with a [`ThreadPool`].
///
/// The handle is the queue's owner: dropping it deregisters the queue from
/// the pool, silently discarding any items still pending. A worker that is
/// mid-`process` on this queue when the handle drops finishes that item on
/// its own reference.
///
/// [`ThreadPool`]: crate::ThreadPool
pub struct QueueHandle<Q: WorkQueue> {
    entry: Arc<Registered<Q>>,
    core: Arc<PoolCore>,
}

impl<Q: WorkQueue> QueueHandle<Q> {
    pub(crate) fn register(name: String, core: Arc<PoolCore>, queue: Q) -> Self {
        let entry = Arc::new(Registered { name, queue });
        {
            let mut sched = core.lock_sched();
            sched.queues.push(entry.clone());
        }
        QueueHandle { entry, core }
    }

    /// Enqueues an item and wakes one idle worker.
    ///
    /// Returns whether the queue accepted the item. The wake-up is issued
    /// even on rejection, so a racing rejection cannot strand a worker.
    pub fn queue(&self, item: Q::Item) -> bool {
        let _sched = self.core.lock_sched();
        let accepted = self.entry.queue.enqueue(item);
        self.core.work_available.notify_one();
        accepted
    }

    /// Removes a specific pending item, if present.
    pub fn dequeue(&self, item: &Q::Item) {
        let _sched = self.core.lock_sched();
        self.entry.queue.dequeue(item);
    }

    /// Drops all pending items.
    pub fn clear(&self) {
        let _sched = self.core.lock_sched();
        self.entry.queue.clear();
    }

    /// The name this queue was registered under.
    pub fn name(&self) -> &str {
        &self.entry.name
    }

    /// The concrete queue, for owner-side inspection (for example reading
    /// items left unprocessed after `stop(false)`).
    pub fn inner(&self) -> &Q {
        &self.entry.queue
    }
}

impl<Q: WorkQueue> Drop for QueueHandle<Q> {
    fn drop(&mut self) {
        // Identity-based removal; the suffix shifts left so registration
        // order is stable. The scheduling cursor is not re-aimed, so the
        // next sweep may skip one entry.
        let target = Arc::as_ptr(&self.entry) as *const ();
        let mut sched = self.core.lock_sched();
        if let Some(pos) = sched
            .queues
            .iter()
            .position(|q| Arc::as_ptr(q) as *const () == target)
        {
            sched.queues.remove(pos);
        }
    }
}
