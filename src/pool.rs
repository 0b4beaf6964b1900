use std::mem;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info};

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::queue::{ErasedQueue, QueueHandle, WorkQueue};
use crate::worker;

/// Scheduler state shared by every worker, guarded by the pool lock.
pub(crate) struct Sched {
    /// Terminal flag; once set it never clears.
    pub(crate) stop: bool,
    /// While set, workers finish in-flight hooks but start no new ones.
    pub(crate) pause: bool,
    /// Number of workers currently inside a process hook.
    pub(crate) processing: usize,
    /// Round-robin cursor into `queues`; advanced before each attempt.
    pub(crate) cursor: usize,
    /// Registered queues, in registration order.
    pub(crate) queues: Vec<Arc<dyn ErasedQueue>>,
}

/// The lock, the two conditions, and the state they guard.
///
/// Shared between the pool, its workers, and every [`QueueHandle`]; whoever
/// drops last tears it down.
pub(crate) struct PoolCore {
    pub(crate) name: String,
    pub(crate) sched: Mutex<Sched>,
    /// Signalled when work may have become available; workers park here.
    pub(crate) work_available: Condvar,
    /// Signalled when a process hook completes while the pool is paused;
    /// `pause()` parks here until `processing` reaches zero.
    pub(crate) drained: Condvar,
}

impl PoolCore {
    pub(crate) fn lock_sched(&self) -> MutexGuard<'_, Sched> {
        self.sched.lock().unwrap()
    }
}

/// Worker-thread bookkeeping, separate from scheduler state so that `stop`
/// can join threads without holding the pool lock.
struct Workers {
    target: usize,
    stack_size: Option<usize>,
    started: bool,
    handles: Vec<JoinHandle<()>>,
}

/// A snapshot of pool state, for monitoring and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolMetrics {
    /// Configured number of worker threads.
    pub thread_count: usize,
    /// Number of currently registered queues.
    pub queue_count: usize,
    /// Number of workers inside a process hook right now.
    pub processing: usize,
    pub paused: bool,
    pub stopped: bool,
}

/// A fixed-size set of worker threads draining a dynamic set of named work
/// queues in round-robin order.
///
/// Producers enqueue through [`QueueHandle::queue`]; each call wakes one
/// idle worker. A worker sweeps the queue list starting after the shared
/// cursor, processes at most one item per sweep, and parks when a full
/// sweep finds nothing. [`pause`](ThreadPool::pause) drains in-flight work
/// and holds new work back until [`unpause`](ThreadPool::unpause);
/// [`stop`](ThreadPool::stop) is terminal and joins every worker.
///
/// # Thread safety
///
/// One mutex serialises the queue list, the cursor, the lifecycle flags,
/// the in-flight counter, and every queue hook except `process`, which runs
/// with the lock released so it may block or take unrelated locks freely.
pub struct ThreadPool {
    core: Arc<PoolCore>,
    workers: Mutex<Workers>,
}

impl ThreadPool {
    /// Creates a pool that will run `thread_count` workers once started.
    pub fn new(name: impl Into<String>, thread_count: usize) -> Self {
        Self::with_config(
            name,
            PoolConfig {
                thread_count,
                ..PoolConfig::default()
            },
        )
    }

    pub fn with_config(name: impl Into<String>, config: PoolConfig) -> Self {
        ThreadPool {
            core: Arc::new(PoolCore {
                name: name.into(),
                sched: Mutex::new(Sched {
                    stop: false,
                    pause: false,
                    processing: 0,
                    cursor: 0,
                    queues: Vec::new(),
                }),
                work_available: Condvar::new(),
                drained: Condvar::new(),
            }),
            workers: Mutex::new(Workers {
                target: config.thread_count,
                stack_size: config.stack_size,
                started: false,
                handles: Vec::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Configured worker count.
    pub fn thread_count(&self) -> usize {
        self.workers.lock().unwrap().target
    }

    /// Grows the worker set. Values at or below the current count are
    /// ignored; the set never shrinks.
    ///
    /// # Panics
    ///
    /// Panics if the pool has already been started.
    pub fn set_thread_count(&self, thread_count: usize) {
        let mut workers = self.workers.lock().unwrap();
        if workers.started {
            drop(workers);
            panic!(
                "set_thread_count() called after start() on pool {}",
                self.core.name
            );
        }
        if thread_count > workers.target {
            workers.target = thread_count;
        }
    }

    /// Registers a queue under `name`, appending it to the scheduling order.
    ///
    /// The returned handle owns the registration; dropping it removes the
    /// queue from the pool and silently discards pending items.
    pub fn add_queue<Q: WorkQueue>(&self, name: impl Into<String>, queue: Q) -> QueueHandle<Q> {
        QueueHandle::register(name.into(), Arc::clone(&self.core), queue)
    }

    /// Spawns every worker thread.
    ///
    /// # Panics
    ///
    /// Panics if called twice.
    pub fn start(&self) -> Result<(), PoolError> {
        let mut workers = self.workers.lock().unwrap();
        if workers.started {
            drop(workers);
            panic!("start() called twice on pool {}", self.core.name);
        }
        workers.started = true;
        info!(pool = %self.core.name, threads = workers.target, "starting worker threads");
        for id in 0..workers.target {
            let core = Arc::clone(&self.core);
            let mut builder =
                thread::Builder::new().name(format!("{}-worker-{}", self.core.name, id));
            if let Some(bytes) = workers.stack_size {
                builder = builder.stack_size(bytes);
            }
            let handle = builder
                .spawn(move || worker::run(core, id))
                .map_err(|source| PoolError::ThreadSpawn {
                    pool: self.core.name.clone(),
                    source,
                })?;
            workers.handles.push(handle);
        }
        Ok(())
    }

    /// Wakes one parked worker so it re-sweeps the queue list.
    ///
    /// For producers that made work visible without going through
    /// [`QueueHandle::queue`], for example after bulk-loading a queue's
    /// backing store.
    pub fn kick(&self) {
        let _sched = self.core.lock_sched();
        self.core.work_available.notify_one();
    }

    /// Stops scheduling new work and waits until no process hook is
    /// executing. Reversible with [`unpause`](ThreadPool::unpause).
    ///
    /// On return the pool is quiescent: no hook is running and none will
    /// start. Workers stay alive, parked on the work-available condition.
    ///
    /// # Panics
    ///
    /// Panics if the pool is already paused.
    pub fn pause(&self) {
        let mut sched = self.core.lock_sched();
        if sched.pause {
            drop(sched);
            panic!("pause() called on already paused pool {}", self.core.name);
        }
        sched.pause = true;
        debug!(pool = %self.core.name, in_flight = sched.processing, "pausing");
        while sched.processing > 0 {
            sched = self.core.drained.wait(sched).unwrap();
        }
    }

    /// Stops scheduling new work but returns immediately; in-flight hooks
    /// run to completion.
    ///
    /// # Panics
    ///
    /// Panics if the pool is already paused.
    pub fn pause_new(&self) {
        let mut sched = self.core.lock_sched();
        if sched.pause {
            drop(sched);
            panic!(
                "pause_new() called on already paused pool {}",
                self.core.name
            );
        }
        sched.pause = true;
        debug!(pool = %self.core.name, "pausing new work");
    }

    /// Resumes scheduling after a pause and wakes every worker.
    ///
    /// # Panics
    ///
    /// Panics if the pool is not paused.
    pub fn unpause(&self) {
        let mut sched = self.core.lock_sched();
        if !sched.pause {
            drop(sched);
            panic!(
                "unpause() called on pool {} that is not paused",
                self.core.name
            );
        }
        sched.pause = false;
        debug!(pool = %self.core.name, "unpausing");
        self.core.work_available.notify_all();
    }

    /// Stops the pool: sets the terminal flag, wakes every worker, joins
    /// them all, then clears every registered queue if `clear_after`.
    ///
    /// With `clear_after` false, unprocessed items stay in their queues and
    /// remain reachable through each owner's [`QueueHandle::inner`].
    pub fn stop(&self, clear_after: bool) {
        {
            let mut sched = self.core.lock_sched();
            sched.stop = true;
            self.core.work_available.notify_all();
        }
        let handles = {
            let mut workers = self.workers.lock().unwrap();
            mem::take(&mut workers.handles)
        };
        for handle in handles {
            if handle.join().is_err() {
                error!(pool = %self.core.name, "worker thread panicked outside a process hook");
            }
        }
        if clear_after {
            let sched = self.core.lock_sched();
            for wq in &sched.queues {
                debug!(pool = %self.core.name, queue = wq.name(), "clearing queue");
                wq.clear();
            }
        }
        info!(pool = %self.core.name, cleared = clear_after, "pool stopped");
    }

    pub fn metrics(&self) -> PoolMetrics {
        let sched = self.core.lock_sched();
        let workers = self.workers.lock().unwrap();
        PoolMetrics {
            thread_count: workers.target,
            queue_count: sched.queues.len(),
            processing: sched.processing,
            paused: sched.pause,
            stopped: sched.stop,
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        let running = {
            let workers = self.workers.lock().unwrap();
            workers.started && !workers.handles.is_empty()
        };
        if running {
            debug!(pool = %self.core.name, "pool dropped while running; stopping");
            self.stop(false);
        }
    }
}
