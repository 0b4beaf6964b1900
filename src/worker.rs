//! The worker loop.
//!
//! Each worker holds the pool lock except while parked on the
//! work-available condition or while a queue's process hook runs. One sweep
//! attempts every registered queue once, starting just past the shared
//! cursor; a productive attempt ends the sweep and the loop re-evaluates
//! immediately, so a busy queue is revisited only after the others have had
//! their turn.

use std::sync::Arc;

use tracing::debug;

use crate::pool::PoolCore;

pub(crate) fn run(core: Arc<PoolCore>, id: usize) {
    debug!(pool = %core.name, worker = id, "worker started");
    let mut sched = core.lock_sched();
    while !sched.stop {
        if !sched.pause && !sched.queues.is_empty() {
            let tries = sched.queues.len();
            let mut did_work = false;
            for _ in 0..tries {
                // Advance before use, so the queue that just ran is not
                // reconsidered until the rest of the list has been tried.
                sched.cursor = (sched.cursor + 1) % sched.queues.len();
                let wq = Arc::clone(&sched.queues[sched.cursor]);
                sched.processing += 1;
                let (guard, did) = wq.try_process(&core, sched);
                sched = guard;
                sched.processing -= 1;
                did_work = did;
                if did_work {
                    if sched.pause {
                        // Quiescence is observed exactly here: after the
                        // decrement, under the lock.
                        core.drained.notify_one();
                    }
                    break;
                }
            }
            if did_work {
                continue;
            }
        }
        sched = core.work_available.wait(sched).unwrap();
    }
    drop(sched);
    debug!(pool = %core.name, worker = id, "worker exiting");
}
