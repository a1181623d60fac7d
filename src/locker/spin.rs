/*
 * It's not practical to send a thread to sleep if the lock
 * is only held for brief moments of time.
 * It's better to spin on the lock and leave the thread awake in this case.
 *
 * The price: the waiting thread burns its CPU share the whole time it waits.
 */

#[cfg(feature = "loom")]
use loom::{hint, thread};
#[cfg(not(feature = "loom"))]
use std::{hint, thread};

use crate::{
    locker::{LockError, Locker},
    state::{State, LOCKED, UNLOCKED},
};

/// what to do between two failed looks at the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relax {
    /// give the scheduler a chance to run somebody else, e.g. the holder
    Yield,
    /// tell the CPU we're in a busy loop and stay on it
    Spin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinOptions {
    pub relax: Relax,
    /// Poll with plain loads until the lock looks free and only then swap.
    /// A swap is a write => it drags the cache line around between the cores
    /// even when it fails, a load doesn't.
    pub test_first: bool,
}

impl Default for SpinOptions {
    fn default() -> Self {
        Self {
            relax: Relax::Yield,
            test_first: true,
        }
    }
}

// only 0 and 1 are used here, nobody ever sleeps on a spin lock
#[derive(Debug)]
pub struct SpinLock {
    state: State,
    options: SpinOptions,
}

impl SpinLock {
    pub fn new() -> Self {
        Self::with_options(SpinOptions {
            relax: Relax::Yield,
            test_first: true,
        })
    }

    pub fn with_options(options: SpinOptions) -> Self {
        Self {
            state: State::new(),
            options,
        }
    }

    pub fn options(&self) -> SpinOptions {
        self.options
    }

    fn relax(&self) {
        match self.options.relax {
            Relax::Yield => thread::yield_now(),
            Relax::Spin => hint::spin_loop(),
        }
    }
}

impl Default for SpinLock {
    fn default() -> Self {
        Self::new()
    }
}

impl Locker for SpinLock {
    fn lock(&self) {
        // 0 before the swap => it was us who locked it
        while self.state.swap(LOCKED) != UNLOCKED {
            if self.options.test_first {
                while self.state.peek() != UNLOCKED {
                    self.relax();
                }
            } else {
                self.relax();
            }
        }
    }

    fn unlock(&self) -> Result<(), LockError> {
        // swapping 0 into 0 leaves the state as is, so a bad unlock is harmless
        match self.state.swap(UNLOCKED) {
            UNLOCKED => Err(LockError::NotLocked),
            _ => Ok(()),
        }
    }

    fn try_lock(&self) -> bool {
        self.state.compare_and_swap(UNLOCKED, LOCKED)
    }

    fn is_locked(&self) -> bool {
        self.state.load() != UNLOCKED
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod test {
    use std::{
        sync::atomic::{AtomicUsize, Ordering::Relaxed},
        thread::scope,
    };

    use super::*;

    // a non-atomic increment made of two atomic steps: any overlap loses updates
    fn hammer(lock: &SpinLock, threads: usize, iterations: usize) -> usize {
        let counter = AtomicUsize::new(0);
        scope(|s| {
            for _ in 0..threads {
                s.spawn(|| {
                    for _ in 0..iterations {
                        lock.lock();
                        let v = counter.load(Relaxed);
                        counter.store(v + 1, Relaxed);
                        lock.unlock().unwrap();
                    }
                });
            }
        });
        counter.into_inner()
    }

    #[test]
    fn test_two_threads() {
        assert_eq!(hammer(&SpinLock::new(), 2, 10_000), 20_000);
    }

    #[test]
    fn test_every_option() {
        for relax in [Relax::Yield, Relax::Spin] {
            for test_first in [true, false] {
                let lock = SpinLock::with_options(SpinOptions { relax, test_first });
                assert_eq!(hammer(&lock, 4, 2_000), 8_000);
                assert!(!lock.is_locked());
            }
        }
    }

    #[test]
    fn test_unlock_unlocked() {
        let lock = SpinLock::new();
        assert_eq!(lock.unlock(), Err(LockError::NotLocked));
        assert_eq!(lock.unlock(), Err(LockError::NotLocked));
        assert!(!lock.is_locked());

        lock.lock();
        lock.unlock().unwrap();
        assert_eq!(lock.unlock(), Err(LockError::NotLocked));
        // still usable
        assert!(lock.try_lock());
        lock.unlock().unwrap();
    }

    #[test]
    fn test_try_lock() {
        let lock = SpinLock::new();
        assert!(lock.try_lock());
        assert!(!lock.try_lock());
        lock.unlock().unwrap();
        assert!(lock.try_lock());
        lock.unlock().unwrap();
    }

    #[test]
    fn test_no_stats() {
        let lock = SpinLock::default();
        hammer(&lock, 2, 100);
        assert_eq!(lock.stats(), Default::default());
        assert_eq!(lock.options(), SpinOptions::default());
    }
}
