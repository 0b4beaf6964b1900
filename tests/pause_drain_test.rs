use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use drover::{FifoQueue, ThreadPool};

fn wait_until(deadline: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let begin = Instant::now();
    while begin.elapsed() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

#[test]
fn pause_reaches_quiescence_and_unpause_resumes() {
    let pool = ThreadPool::new("pause", 4);
    let processed = Arc::new(AtomicUsize::new(0));
    let counter = processed.clone();
    let queue = pool.add_queue(
        "steady",
        FifoQueue::new(move |_: u32| {
            thread::sleep(Duration::from_micros(500));
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );
    for n in 0..100 {
        assert!(queue.queue(n));
    }
    pool.start().unwrap();
    assert!(wait_until(Duration::from_secs(5), || {
        processed.load(Ordering::SeqCst) >= 10
    }));

    pool.pause();
    assert_eq!(pool.metrics().processing, 0);
    let frozen = processed.load(Ordering::SeqCst);

    // Work enqueued while paused is accepted but not scheduled.
    for n in 100..110 {
        assert!(queue.queue(n));
    }
    thread::sleep(Duration::from_millis(100));
    assert_eq!(processed.load(Ordering::SeqCst), frozen);

    pool.unpause();
    assert!(wait_until(Duration::from_secs(10), || {
        processed.load(Ordering::SeqCst) == 110
    }));
    pool.stop(true);
}

#[test]
fn pause_new_then_unpause_is_a_scheduling_noop() {
    let pool = ThreadPool::new("pause-new", 2);
    let (tx, rx) = mpsc::channel();
    let queue = pool.add_queue(
        "q",
        FifoQueue::new(move |n: u32| {
            tx.send(n).unwrap();
        }),
    );
    pool.start().unwrap();
    pool.pause_new();
    pool.unpause();

    for n in 0..20 {
        assert!(queue.queue(n));
    }
    let mut seen: Vec<u32> = (0..20)
        .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..20).collect::<Vec<_>>());
    pool.stop(true);
}

#[test]
fn pause_new_returns_while_a_hook_is_in_flight() {
    let pool = ThreadPool::new("inflight", 1);
    let (started_tx, started_rx) = mpsc::channel();
    let (done_tx, done_rx) = mpsc::channel();
    let queue = pool.add_queue(
        "slow",
        FifoQueue::new(move |n: u32| {
            started_tx.send(n).unwrap();
            thread::sleep(Duration::from_millis(200));
            done_tx.send(n).unwrap();
        }),
    );
    pool.start().unwrap();
    assert!(queue.queue(1));
    started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    // The hook sleeps with the pool lock released, so pause_new neither
    // waits for it nor blocks on the lock.
    let begin = Instant::now();
    pool.pause_new();
    assert!(begin.elapsed() < Duration::from_millis(150));
    assert!(pool.metrics().paused);

    // The in-flight item still completes.
    done_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    // New work stays pending until unpause.
    assert!(queue.queue(2));
    thread::sleep(Duration::from_millis(100));
    assert_eq!(queue.inner().len(), 1);

    pool.unpause();
    assert_eq!(done_rx.recv_timeout(Duration::from_secs(5)).unwrap(), 2);
    pool.stop(true);
}

#[test]
fn pause_waits_for_every_in_flight_hook() {
    let pool = ThreadPool::new("drain", 4);
    let in_hook = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));
    let hook_counter = in_hook.clone();
    let done_counter = finished.clone();
    let queue = pool.add_queue(
        "busy",
        FifoQueue::new(move |_: u32| {
            hook_counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(50));
            hook_counter.fetch_sub(1, Ordering::SeqCst);
            done_counter.fetch_add(1, Ordering::SeqCst);
        }),
    );
    for n in 0..8 {
        assert!(queue.queue(n));
    }
    pool.start().unwrap();
    assert!(wait_until(Duration::from_secs(5), || {
        in_hook.load(Ordering::SeqCst) > 0
    }));

    pool.pause();
    assert_eq!(in_hook.load(Ordering::SeqCst), 0);
    assert_eq!(pool.metrics().processing, 0);

    pool.unpause();
    assert!(wait_until(Duration::from_secs(10), || {
        finished.load(Ordering::SeqCst) == 8
    }));
    pool.stop(true);
}
