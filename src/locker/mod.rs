//! # Lockers
//!
//! All the locks share one tiny contract - [Locker]: `lock` blocks until we're the only holder,
//! `unlock` lets the next one in. They differ in what a thread does while it waits:
//! - [SpinLock] stays on the CPU and keeps polling
//! - [BlockingLock] asks the kernel to put it to sleep (see [crate::futex])
//! - [AdaptiveLock] polls for a short while and sleeps afterwards
//!
//! What you pick is fixed at construction - see [Kind] and [AnyLocker].
//!
//! ## Misuse
//! Unlocking an unlocked lock is a bug in the caller. Every locker releases with a swap to `0`,
//! so it sees the previous value and reports [LockError::NotLocked] if it was `0` already.
//! Swapping `0` into `0` changes nothing, so the state stays sane for everybody else.
//!
//! What we can't see is *who* unlocks: there's no owner in the state word.
//! Unlocking a lock held by another thread goes through unnoticed, as does locking twice from
//! the same thread (it never returns). Both are on the caller.
//!
//! ## Fairness
//! None. A fresh thread may grab the lock ahead of one sleeping for ages.

use std::{
    error::Error,
    fmt,
    sync::atomic::{AtomicUsize, Ordering::Relaxed},
};

use strum_macros::{Display, EnumIter, EnumString};

pub mod adaptive;
pub mod blocking;
pub mod spin;

pub use adaptive::AdaptiveLock;
pub use blocking::BlockingLock;
pub use spin::{Relax, SpinLock, SpinOptions};

/// Exclusive access to something the locker knows nothing about.
pub trait Locker: Send + Sync {
    /// Returns once the calling thread is the only holder. No timeouts, no failures.
    /// Calling it again from the holder never returns.
    fn lock(&self);

    /// Lets the next thread in. Only the holder may call it.
    fn unlock(&self) -> Result<(), LockError>;

    /// one attempt, no waiting
    fn try_lock(&self) -> bool;

    /// a racy look at the state, only good for tests and reports
    fn is_locked(&self) -> bool;

    /// how much waiting it took so far
    fn stats(&self) -> Stats {
        Stats::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockError {
    /// unlock without a matching lock
    NotLocked,
    /// no wait & wake on this platform
    Unsupported,
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockError::NotLocked => write!(f, "unlock called on a lock that isn't locked"),
            LockError::Unsupported => {
                write!(f, "wait on address isn't available on this platform")
            }
        }
    }
}

impl Error for LockError {}

/// A snapshot of the slow-path counters.
/// Spin locks don't count anything, so theirs is all zeroes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// times a thread went to [crate::futex::wait]
    pub waits: usize,
    /// times an unlock called [crate::futex::wake_one]
    pub wakes: usize,
    /// spin iterations before giving up and sleeping
    pub spins: usize,
}

/// Relaxed counters: they order nothing and are only touched next to a syscall
/// or inside a spin, never on the fast path.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    waits: AtomicUsize,
    wakes: AtomicUsize,
    spins: AtomicUsize,
}

impl Counters {
    pub(crate) const fn new() -> Self {
        Self {
            waits: AtomicUsize::new(0),
            wakes: AtomicUsize::new(0),
            spins: AtomicUsize::new(0),
        }
    }

    pub(crate) fn waited(&self) {
        self.waits.fetch_add(1, Relaxed);
    }

    pub(crate) fn woke(&self) {
        self.wakes.fetch_add(1, Relaxed);
    }

    pub(crate) fn spun(&self, n: usize) {
        if n > 0 {
            self.spins.fetch_add(n, Relaxed);
        }
    }

    pub(crate) fn snapshot(&self) -> Stats {
        Stats {
            waits: self.waits.load(Relaxed),
            wakes: self.wakes.load(Relaxed),
            spins: self.spins.load(Relaxed),
        }
    }
}

/// Which locker to build. The names are what the CLI takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Kind {
    /// test-then-swap, yields while waiting
    Spin,
    /// test-then-swap, spin-loop hint while waiting
    SpinNoYield,
    /// swap in a loop, yields while waiting
    SpinSwapOnly,
    Blocking,
    Adaptive,
}

impl Kind {
    pub fn spins(self) -> bool {
        matches!(self, Kind::Spin | Kind::SpinNoYield | Kind::SpinSwapOnly)
    }
}

/// One of the lockers, picked once at construction.
/// An enum rather than a `Box<dyn Locker>` - there's a closed set of them and no allocation.
#[derive(Debug)]
pub enum AnyLocker {
    Spin(SpinLock),
    Blocking(BlockingLock),
    Adaptive(AdaptiveLock),
}

impl AnyLocker {
    /// `spin_limit` only matters for [Kind::Adaptive]
    pub fn new(kind: Kind, spin_limit: usize) -> Result<Self, LockError> {
        Ok(match kind {
            Kind::Spin => AnyLocker::Spin(SpinLock::new()),
            Kind::SpinNoYield => AnyLocker::Spin(SpinLock::with_options(SpinOptions {
                relax: Relax::Spin,
                test_first: true,
            })),
            Kind::SpinSwapOnly => AnyLocker::Spin(SpinLock::with_options(SpinOptions {
                relax: Relax::Yield,
                test_first: false,
            })),
            Kind::Blocking => AnyLocker::Blocking(BlockingLock::try_new()?),
            Kind::Adaptive => AnyLocker::Adaptive(AdaptiveLock::try_new(spin_limit)?),
        })
    }
}

macro_rules! delegate {
    ($self:ident, $l:ident => $call:expr) => {
        match $self {
            AnyLocker::Spin($l) => $call,
            AnyLocker::Blocking($l) => $call,
            AnyLocker::Adaptive($l) => $call,
        }
    };
}

impl Locker for AnyLocker {
    fn lock(&self) {
        delegate!(self, l => l.lock())
    }

    fn unlock(&self) -> Result<(), LockError> {
        delegate!(self, l => l.unlock())
    }

    fn try_lock(&self) -> bool {
        delegate!(self, l => l.try_lock())
    }

    fn is_locked(&self) -> bool {
        delegate!(self, l => l.is_locked())
    }

    fn stats(&self) -> Stats {
        delegate!(self, l => l.stats())
    }
}
