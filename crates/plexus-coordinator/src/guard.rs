//! Reentrancy guard for coordinator entry points
//!
//! Other threads block until the running transition finishes. A nested call
//! on the thread that already holds the guard (a collaborator calling back
//! into the coordinator) is rejected with `Reentrancy` instead of
//! deadlocking.

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use plexus_core::{Result, RewardsError};
use std::cell::Cell;

#[derive(Default)]
pub struct ReentrancyGuard {
    entered: ReentrantMutex<Cell<bool>>,
}

/// Held for the duration of one transition
pub struct GuardToken<'a> {
    lock: ReentrantMutexGuard<'a, Cell<bool>>,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> Result<GuardToken<'_>> {
        let lock = self.entered.lock();
        if lock.get() {
            return Err(RewardsError::Reentrancy);
        }
        lock.set(true);
        Ok(GuardToken { lock })
    }

    /// True while a transition runs on the current thread
    pub fn is_entered(&self) -> bool {
        self.entered.try_lock().map(|lock| lock.get()).unwrap_or(true)
    }
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.lock.set(false);
    }
}
