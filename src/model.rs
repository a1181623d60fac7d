//! Model checking of every locker with [loom]: each test runs its threads under
//! all interleavings up to the preemption bound, and [UnsafeCell] reports any access
//! to the counter that isn't ordered by the lock.
//!
//! `cargo test --release --features loom --lib model`

use std::sync::Arc;

use loom::{
    cell::UnsafeCell,
    sync::atomic::{AtomicBool, Ordering::Relaxed},
    thread::spawn,
};

use crate::locker::{
    spin::{Relax, SpinOptions},
    AdaptiveLock, BlockingLock, LockError, Locker, SpinLock,
};

struct Shared<L> {
    lock: L,
    count: UnsafeCell<usize>,
    inside: AtomicBool,
}

// the count is only touched with the lock held
unsafe impl<L: Sync> Sync for Shared<L> {}

impl<L: Locker> Shared<L> {
    fn new(lock: L) -> Arc<Self> {
        Arc::new(Self {
            lock,
            count: UnsafeCell::new(0),
            inside: AtomicBool::new(false),
        })
    }

    fn increment(&self) {
        self.lock.lock();
        assert!(!self.inside.swap(true, Relaxed), "two threads inside");
        self.count.with_mut(|c| unsafe { *c += 1 });
        self.inside.store(false, Relaxed);
        self.lock.unlock().unwrap();
    }

    fn count(&self) -> usize {
        self.count.with(|c| unsafe { *c })
    }
}

fn check<F>(f: F)
where
    F: Fn() + Sync + Send + 'static,
{
    let mut builder = loom::model::Builder::new();
    builder.preemption_bound = Some(3);
    builder.check(f);
}

fn mutual_exclusion<L: Locker + 'static>(new: fn() -> L) {
    check(move || {
        let shared = Shared::new(new());
        let other = {
            let shared = shared.clone();
            spawn(move || shared.increment())
        };
        shared.increment();
        assert!(other.join().is_ok());
        assert!(!shared.lock.is_locked());
        assert_eq!(shared.count(), 2);
    });
}

fn misuse_rejected<L: Locker + 'static>(new: fn() -> L) {
    check(move || {
        let shared = Shared::new(new());
        assert_eq!(shared.lock.unlock(), Err(LockError::NotLocked));
        let other = {
            let shared = shared.clone();
            spawn(move || shared.increment())
        };
        shared.increment();
        assert!(other.join().is_ok());
        // both holders are gone, the extra unlock changes nothing
        assert_eq!(shared.lock.unlock(), Err(LockError::NotLocked));
        assert!(!shared.lock.is_locked());
        assert!(shared.lock.try_lock());
        shared.lock.unlock().unwrap();
    });
}

fn handoff<L: Locker + 'static>(new: fn() -> L) {
    check(move || {
        let shared = Shared::new(new());
        shared.lock.lock();
        let waiter = {
            let shared = shared.clone();
            spawn(move || {
                shared.lock.lock();
                let seen = shared.count();
                shared.lock.unlock().unwrap();
                seen
            })
        };
        // written while the waiter is locked out => it must see it once it gets in
        shared.count.with_mut(|c| unsafe { *c = 1 });
        shared.lock.unlock().unwrap();
        assert_eq!(waiter.join().unwrap(), 1);
        assert!(!shared.lock.is_locked());
    });
}

fn spin_no_yield() -> SpinLock {
    SpinLock::with_options(SpinOptions {
        relax: Relax::Spin,
        test_first: true,
    })
}

fn spin_swap_only() -> SpinLock {
    SpinLock::with_options(SpinOptions {
        relax: Relax::Yield,
        test_first: false,
    })
}

// a couple of spin rounds is enough to reach the blocking path in the model
fn adaptive() -> AdaptiveLock {
    AdaptiveLock::with_spin_limit(2)
}

#[test]
fn spin_mutual_exclusion() {
    mutual_exclusion(SpinLock::new);
    mutual_exclusion(spin_no_yield);
    mutual_exclusion(spin_swap_only);
}

#[test]
fn spin_misuse_rejected() {
    misuse_rejected(SpinLock::new);
    misuse_rejected(spin_swap_only);
}

#[test]
fn spin_handoff() {
    handoff(SpinLock::new);
    handoff(spin_no_yield);
    handoff(spin_swap_only);
}

#[test]
fn blocking_mutual_exclusion() {
    mutual_exclusion(BlockingLock::new);
}

#[test]
fn blocking_misuse_rejected() {
    misuse_rejected(BlockingLock::new);
}

#[test]
fn blocking_handoff() {
    handoff(BlockingLock::new);
}

#[test]
fn adaptive_mutual_exclusion() {
    mutual_exclusion(adaptive);
}

#[test]
fn adaptive_misuse_rejected() {
    misuse_rejected(adaptive);
}

#[test]
fn adaptive_handoff() {
    handoff(adaptive);
}
