//! Loom-based concurrency tests.
//!
//! Run with: `cargo test --features loom --test loom_tests --release`
//!
//! These model the producer/consumer handshake in isolation, at a much
//! smaller scale than the real `BufferedStream`, so loom's exhaustive
//! interleaving search stays tractable. `loom`'s own `Mutex`/`Condvar`
//! stand in for `std`'s so the model sees every possible schedule.

#![cfg(feature = "loom")]

use loom::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use loom::sync::{Arc, Condvar, Mutex};
use loom::thread;

/// A minimal counting semaphore, structurally identical to
/// `crate::semaphore::Semaphore`, rebuilt on loom's primitives.
struct LoomSemaphore {
    state: Mutex<(usize, bool)>,
    condvar: Condvar,
}

impl LoomSemaphore {
    fn new(initial: usize) -> Self {
        Self { state: Mutex::new((initial, false)), condvar: Condvar::new() }
    }

    fn wait(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        loop {
            if state.0 > 0 {
                state.0 -= 1;
                return true;
            }
            if state.1 {
                return false;
            }
            state = self.condvar.wait(state).unwrap();
        }
    }

    fn signal(&self) {
        let mut state = self.state.lock().unwrap();
        state.0 += 1;
        self.condvar.notify_one();
    }

    fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.1 = true;
        self.condvar.notify_all();
    }
}

/// A toy two-slot ring modeling only the handshake: a producer that
/// increments `available` after "writing" and signals `ready` on a rising
/// edge past `READY_THRESHOLD`, a consumer that decrements `available` and
/// signals `space` after "reading".
struct Model {
    available: AtomicUsize,
    ready_latched: AtomicBool,
    space: LoomSemaphore,
    ready: LoomSemaphore,
}

const CAPACITY: usize = 2;
const READY_THRESHOLD: usize = 2;
const NOT_READY_THRESHOLD: usize = 0;

impl Model {
    fn new() -> Self {
        Self {
            available: AtomicUsize::new(0),
            ready_latched: AtomicBool::new(false),
            space: LoomSemaphore::new(CAPACITY),
            ready: LoomSemaphore::new(0),
        }
    }

    fn produce_one(&self) -> bool {
        if !self.space.wait() {
            return false;
        }
        let old = self.available.fetch_add(1, Ordering::AcqRel);
        let new = old + 1;
        if old < READY_THRESHOLD && new >= READY_THRESHOLD {
            let was_ready = self.ready_latched.swap(true, Ordering::AcqRel);
            if !was_ready {
                self.ready.signal();
            }
        }
        true
    }

    fn consume_one(&self) -> bool {
        if !self.ready.wait() {
            return false;
        }
        // The permit only promises "ready was signaled at least once";
        // re-check there is actually a byte (loom's tiny state space can
        // have the consumer race ahead of a second producer signal).
        loop {
            let old = self.available.load(Ordering::Acquire);
            if old == 0 {
                return false;
            }
            if self
                .available
                .compare_exchange(old, old - 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                if old > NOT_READY_THRESHOLD && old - 1 <= NOT_READY_THRESHOLD {
                    self.ready_latched.store(false, Ordering::Release);
                }
                self.space.signal();
                return true;
            }
        }
    }
}

#[test]
fn loom_producer_consumer_handshake_never_oversubscribes() {
    loom::model(|| {
        let model = Arc::new(Model::new());

        let producer = {
            let model = Arc::clone(&model);
            thread::spawn(move || {
                model.produce_one();
            })
        };

        let consumer = {
            let model = Arc::clone(&model);
            thread::spawn(move || {
                model.ready.wait();
                model.consume_one();
            })
        };

        producer.join().unwrap();
        consumer.join().unwrap();

        let available = model.available.load(Ordering::SeqCst);
        assert!(available <= CAPACITY, "available {available} exceeded capacity {CAPACITY}");
    });
}

#[test]
fn loom_close_unblocks_a_parked_consumer() {
    loom::model(|| {
        let model = Arc::new(Model::new());

        let closer = {
            let model = Arc::clone(&model);
            thread::spawn(move || {
                model.ready.close();
            })
        };

        let consumer = {
            let model = Arc::clone(&model);
            thread::spawn(move || model.ready.wait())
        };

        closer.join().unwrap();
        // No producer ever signals a permit; the point of this test is
        // that every interleaving of close() and wait() still returns.
        let _ = consumer.join().unwrap();
    });
}
