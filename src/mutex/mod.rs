//! # Mutex
//! A [Locker] only guards *attempts* to get in. This one also owns the data, so the borrow checker
//! makes sure nobody touches it without the lock and nobody forgets to unlock.
//!
//! Any locker works underneath, the adaptive one is the default.

use std::{
    cell::UnsafeCell,
    fmt,
    ops::{Deref, DerefMut},
    thread,
};

use log::error;

use crate::locker::{AdaptiveLock, Locker};

pub struct Mutex<Y, L = AdaptiveLock> {
    locker: L,
    value: UnsafeCell<Y>,
}

// UnsafeCell makes the above definition !Sync => we can't share it between threads
// We promise to the compiler that our type is Sync as long as Y is Send
unsafe impl<Y, L> Sync for Mutex<Y, L>
where
    Y: Send,
    L: Locker,
{
}

impl<Y, L> Mutex<Y, L>
where
    L: Locker + Default,
{
    pub fn new(value: Y) -> Self {
        Self::with_locker(L::default(), value)
    }
}

impl<Y, L> Mutex<Y, L>
where
    L: Locker,
{
    pub const fn with_locker(locker: L, value: Y) -> Self {
        Self {
            locker,
            value: UnsafeCell::new(value),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Y, L> {
        self.locker.lock();
        MutexGuard { mutex: self } // it can't be made by any other means
    }

    pub fn try_lock(&self) -> Option<MutexGuard<'_, Y, L>> {
        self.locker.try_lock().then(|| MutexGuard { mutex: self })
    }

    /// the locker underneath, e.g. for its [stats](Locker::stats)
    pub fn locker(&self) -> &L {
        &self.locker
    }

    /// no locking needed - `&mut self` already proves nobody else is around
    pub fn get_mut(&mut self) -> &mut Y {
        self.value.get_mut()
    }

    pub fn into_inner(self) -> Y {
        self.value.into_inner()
    }
}

impl<Y, L> fmt::Debug for Mutex<Y, L>
where
    L: Locker,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex")
            .field("locked", &self.locker.is_locked())
            .finish_non_exhaustive()
    }
}

/// Deref-s like &mut and Drop-s like .unlock()
pub struct MutexGuard<'a, Y, L: Locker = AdaptiveLock> {
    mutex: &'a Mutex<Y, L>,
}

// Sharing a guard hands out &Y only
unsafe impl<Y, L> Sync for MutexGuard<'_, Y, L>
where
    Y: Sync,
    L: Locker,
{
}

impl<Y, L: Locker> Deref for MutexGuard<'_, Y, L> {
    type Target = Y;
    fn deref(&self) -> &Self::Target {
        // SAFETY: existence of the guard is caused by locking its lock
        unsafe { &*self.mutex.value.get() }
    }
}

impl<Y, L: Locker> DerefMut for MutexGuard<'_, Y, L> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: existence of the guard is caused by locking its lock
        unsafe { &mut *self.mutex.value.get() }
    }
}

impl<Y, L: Locker> Drop for MutexGuard<'_, Y, L> {
    fn drop(&mut self) {
        // only fails if somebody unlocked the raw locker behind the guard's back.
        // A second panic while unwinding would abort the process => just log it then
        if let Err(e) = self.mutex.locker.unlock() {
            if thread::panicking() {
                error!("mutex guard dropped while panicking: {e}");
            } else {
                panic!("mutex guard dropped: {e}");
            }
        }
    }
}
