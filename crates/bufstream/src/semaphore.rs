//! A counting semaphore built on `Mutex` + `Condvar`.
//!
//! The buffer's coordination model calls for a semaphore as an external
//! collaborator; `std` does not ship one, so this is the minimal
//! implementation the design needs: `wait` blocks until a permit is
//! available, `signal` adds one, `close` wakes every waiter without adding a
//! permit so they can observe shutdown instead of consuming one.

use std::sync::{Condvar, Mutex};

pub(crate) struct Semaphore {
    state: Mutex<State>,
    condvar: Condvar,
}

struct State {
    permits: usize,
    closed: bool,
}

impl Semaphore {
    pub(crate) fn new(initial_permits: usize) -> Self {
        Self { state: Mutex::new(State { permits: initial_permits, closed: false }), condvar: Condvar::new() }
    }

    /// Blocks until a permit is available or the semaphore is closed.
    /// Returns `false` if it returned because of a close, `true` if it
    /// consumed a permit.
    pub(crate) fn wait(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        loop {
            if state.permits > 0 {
                state.permits -= 1;
                return true;
            }
            if state.closed {
                return false;
            }
            state = self.condvar.wait(state).unwrap();
        }
    }

    /// Adds one permit and wakes a single waiter.
    pub(crate) fn signal(&self) {
        let mut state = self.state.lock().unwrap();
        state.permits += 1;
        self.condvar.notify_one();
    }

    /// Wakes every waiter without granting a permit; subsequent `wait`
    /// calls return `false` immediately unless a permit is already posted.
    ///
    /// Returns `true` if this call was the one that transitioned the
    /// semaphore into the closed state (`false` if it was already closed).
    pub(crate) fn close(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        let first_close = !state.closed;
        state.closed = true;
        self.condvar.notify_all();
        first_close
    }

    /// Clears a prior `close` and discards any outstanding permits, for
    /// reusing the semaphore across a `close`/`open` cycle on the same
    /// stream.
    pub(crate) fn reopen(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = false;
        state.permits = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn wait_consumes_a_permit() {
        let sem = Semaphore::new(1);
        assert!(sem.wait());
        let sem = Arc::new(sem);
        let waiter = {
            let sem = Arc::clone(&sem);
            thread::spawn(move || sem.wait())
        };
        thread::sleep(Duration::from_millis(20));
        sem.signal();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn close_wakes_waiters_without_a_permit() {
        let sem = Arc::new(Semaphore::new(0));
        let waiter = {
            let sem = Arc::clone(&sem);
            thread::spawn(move || sem.wait())
        };
        thread::sleep(Duration::from_millis(20));
        sem.close();
        assert!(!waiter.join().unwrap());
    }
}
