//! Counting wait primitive.

use parking_lot::{Condvar, Mutex};
use std::time::Duration;

/// A counting semaphore.
///
/// A `post` with no task waiting is remembered, so a signal raised before
/// the owner reaches `wait` is never lost.
#[derive(Debug, Default)]
pub struct Signal {
    count: Mutex<u32>,
    available: Condvar,
}

impl Signal {
    /// Create a signal with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal once, waking one waiter if there is one.
    pub fn post(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_add(1);
        self.available.notify_one();
    }

    /// Block until the signal is raised, then consume one count.
    pub fn wait(&self) {
        let mut count = self.count.lock();
        while *count == 0 {
            self.available.wait(&mut count);
        }
        *count -= 1;
    }

    /// Consume one count if available, without blocking.
    pub fn try_wait(&self) -> bool {
        let mut count = self.count.lock();
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }

    /// Like `wait`, giving up after `timeout`. Returns whether a count was
    /// consumed.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        let mut count = self.count.lock();
        if *count == 0 {
            let _ = self
                .available
                .wait_while_for(&mut count, |count| *count == 0, timeout);
        }
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }

    /// Current count.
    pub fn count(&self) -> u32 {
        *self.count.lock()
    }
}
