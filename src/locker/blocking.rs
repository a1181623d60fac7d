//! # Blocking lock
//!
//! It's starting at the [SpinLock](super::SpinLock), but a waiting thread sleeps in
//! [futex::wait] instead of polling.
//!
//! ## Avoiding syscalls
//! The wait and wake syscalls are slow (as all syscalls) => we only make them when needed.
//! Waiting is only needed if the lock is taken, that's easy.
//! Waking is only needed if somebody may sleep, so the state gets a 3rd value:
//! - 0 - unlocked
//! - 1 - locked, nobody waits => unlock just swaps 0 in
//! - 2 - locked, somebody may wait => unlock swaps 0 in and wakes one thread
//!
//! A thread about to sleep marks the state with 2 first. The same swap that does it
//! may find 0 there: the lock is ours then, but it stays at 2. We can't know if there are
//! other sleepers, so the next unlock wakes one just in case. That's an occasional
//! extra wake call and nothing worse.
//!
//! If there's no contention for the lock, neither syscall is ever made.
//!
//! ## Spurious wakeups
//! [futex::wait] may return for no reason. The loop swaps 2 in again and goes back to sleep
//! unless the swap saw 0 - nobody assumes they hold the lock just because they woke up.

use crate::{
    futex,
    locker::{Counters, LockError, Locker, Stats},
    state::{State, CONTENDED, LOCKED, UNLOCKED},
};

#[derive(Debug)]
pub struct BlockingLock {
    state: State,
    counters: Counters,
}

impl BlockingLock {
    /// # Panics
    /// - if the platform can't wait on an address, see [BlockingLock::try_new]
    pub fn new() -> Self {
        assert!(
            futex::SUPPORTED,
            "wait on address isn't available on this platform"
        );
        Self {
            state: State::new(),
            counters: Counters::new(),
        }
    }

    pub fn try_new() -> Result<Self, LockError> {
        if !futex::SUPPORTED {
            return Err(LockError::Unsupported);
        }
        Ok(Self::new())
    }
}

impl Default for BlockingLock {
    fn default() -> Self {
        Self::new()
    }
}

/// The slow part of locking, shared with the adaptive lock.
/// Leaves the state as 2 to not lose other potential sleepers.
#[cold]
pub(super) fn lock_contended(state: &State, counters: &Counters) {
    while state.swap(CONTENDED) != UNLOCKED {
        counters.waited();
        futex::wait(state, CONTENDED);
    }
}

/// Unlocking, shared with the adaptive lock.
/// There's no guarantee the thread we wake gets the lock, any other thread may be faster.
pub(super) fn release(state: &State, counters: &Counters) -> Result<(), LockError> {
    match state.swap(UNLOCKED) {
        UNLOCKED => Err(LockError::NotLocked),
        LOCKED => Ok(()),
        _ => {
            // exactly 1 thread is just enough to proceed
            counters.woke();
            futex::wake_one(state);
            Ok(())
        }
    }
}

impl Locker for BlockingLock {
    fn lock(&self) {
        if !self.state.compare_and_swap(UNLOCKED, LOCKED) {
            lock_contended(&self.state, &self.counters);
        }
    }

    fn unlock(&self) -> Result<(), LockError> {
        release(&self.state, &self.counters)
    }

    fn try_lock(&self) -> bool {
        self.state.compare_and_swap(UNLOCKED, LOCKED)
    }

    fn is_locked(&self) -> bool {
        self.state.load() != UNLOCKED
    }

    fn stats(&self) -> Stats {
        self.counters.snapshot()
    }
}
