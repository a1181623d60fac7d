//! # Adaptive lock
//!
//! The [BlockingLock](super::BlockingLock) pays for a wait and a wake syscall every time
//! it meets a taken lock. But locks are mostly held for a moment: the lock is likely free again
//! before the thread would even fall asleep.
//!
//! So let's combine a short spin with waiting:
//! - try to lock it right away
//! - spin for [DEFAULT_SPIN_LIMIT] rounds, yielding and re-checking the state
//! - sleep the same way the blocking lock does if it's still locked
//!
//! Under light contention it behaves like a spin lock, under heavy one it
//! ends up where the blocking lock is, with a few yields on top.
//!
//! The limit is a plain constant picked by measuring the bench, it doesn't tune itself.

#[cfg(feature = "loom")]
use loom::thread;
#[cfg(not(feature = "loom"))]
use std::thread;

use crate::{
    futex,
    locker::{
        blocking::{lock_contended, release},
        Counters, LockError, Locker, Stats,
    },
    state::{State, CONTENDED, LOCKED, UNLOCKED},
};

/// Spin rounds before sleeping.
pub const DEFAULT_SPIN_LIMIT: usize = 40;

#[derive(Debug)]
pub struct AdaptiveLock {
    state: State,
    spin_limit: usize,
    counters: Counters,
}

impl AdaptiveLock {
    /// # Panics
    /// - if the platform can't wait on an address, see [AdaptiveLock::try_new]
    pub fn new() -> Self {
        Self::with_spin_limit(DEFAULT_SPIN_LIMIT)
    }

    /// `0` makes it a [BlockingLock](super::BlockingLock)
    pub fn with_spin_limit(spin_limit: usize) -> Self {
        assert!(
            futex::SUPPORTED,
            "wait on address isn't available on this platform"
        );
        Self {
            state: State::new(),
            spin_limit,
            counters: Counters::new(),
        }
    }

    pub fn try_new(spin_limit: usize) -> Result<Self, LockError> {
        if !futex::SUPPORTED {
            return Err(LockError::Unsupported);
        }
        Ok(Self::with_spin_limit(spin_limit))
    }

    pub fn spin_limit(&self) -> usize {
        self.spin_limit
    }

    /// true if the lock got taken while spinning
    fn spin(&self) -> bool {
        let mut spins = 0;
        let acquired = loop {
            if spins == self.spin_limit {
                break false;
            }
            spins += 1;
            thread::yield_now();
            // load first, compare_exchange has impact on cache perf
            match self.state.peek() {
                UNLOCKED if self.state.compare_and_swap(UNLOCKED, LOCKED) => break true,
                // somebody already gave up and sleeps => no point in spinning
                CONTENDED => break false,
                _ => {}
            }
        };
        self.counters.spun(spins);
        acquired
    }
}

impl Default for AdaptiveLock {
    fn default() -> Self {
        Self::new()
    }
}

impl Locker for AdaptiveLock {
    fn lock(&self) {
        if self.state.compare_and_swap(UNLOCKED, LOCKED) || self.spin() {
            return;
        }
        lock_contended(&self.state, &self.counters);
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
