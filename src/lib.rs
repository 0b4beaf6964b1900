//! Multi-queue worker thread pool.
//!
//! A [`ThreadPool`] hosts a dynamic set of named work queues and a fixed
//! set of worker threads that drain them in round-robin order. Queues
//! implement [`WorkQueue`]; registering one with
//! [`ThreadPool::add_queue`] yields a [`QueueHandle`] used to enqueue work.
//! The pool supports a pause/drain protocol for reaching quiescence without
//! tearing the workers down, and an orderly stop that joins every worker
//! and optionally clears every queue.
//!
//! ```
//! use std::sync::mpsc;
//! use drover::{FifoQueue, ThreadPool};
//!
//! let pool = ThreadPool::new("example", 2);
//! let (tx, rx) = mpsc::channel();
//! let queue = pool.add_queue("numbers", FifoQueue::new(move |n: u32| {
//!     tx.send(n * 2).unwrap();
//! }));
//! pool.start().unwrap();
//!
//! queue.queue(21);
//! assert_eq!(rx.recv().unwrap(), 42);
//! pool.stop(true);
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod pool;
pub mod queue;

mod worker;

pub use config::PoolConfig;
pub use error::PoolError;
pub use pool::{PoolMetrics, ThreadPool};
pub use queue::{FifoQueue, QueueHandle, WorkQueue};
