//! Mutexes built from scratch: a spin lock, a futex-style blocking lock and an adaptive one
//! that spins a little before blocking, all behind the same [Locker] contract,
//! plus a bench to see what each of them costs under contention.

pub mod bench;
pub mod config;
pub mod futex;
pub mod locker;
pub mod logging;
pub mod mutex;
pub mod state;

#[cfg(all(test, feature = "loom"))]
mod model;

pub use locker::{AdaptiveLock, AnyLocker, BlockingLock, Kind, LockError, Locker, SpinLock, Stats};
pub use mutex::{Mutex, MutexGuard};
