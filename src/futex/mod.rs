//! # Waiting on an address
//!
//! Spinning keeps a waiting thread on the CPU. The kernel can put it to sleep instead
//! and it only needs two calls for that:
//! - `wait(&AtomicU32, u32)` - sleeps only if the atomic still has the given value,
//!   checked atomically by the kernel, so a wake can't be lost in between. May wake up spuriously.
//! - `wake_one(&AtomicU32)` - wakes a single thread sleeping on the same atomic
//!
//! Linux calls it futex, Windows has `WaitOnAddress` / `WakeByAddressSingle`, macOS has `__ulock`.
//! We don't deal with the OS-specific bits ourselves and use the
//! [atomic-wait](https://crates.io/crates/atomic-wait) crate, which only exists on those platforms.
//!
//! Elsewhere [SUPPORTED] is false and both calls panic with [LockError::Unsupported].
//! Lock constructors check [SUPPORTED] first, so the panic is only reachable by a bug.
//!
//! With the `loom` feature the model checker plays the kernel: [wait] is a yield, so it looks
//! like a spurious wakeup, and [wake_one] does nothing.
//!
//! Note that wait and wake take no part in correctness of the locks. They just
//! spare us wasting cycles, the state word does the rest.

use crate::state::State;

#[cfg(feature = "loom")]
mod platform {
    use crate::state::State;

    pub const SUPPORTED: bool = true;

    pub fn wait(_state: &State, _expected: u32) {
        loom::thread::yield_now();
    }

    pub fn wake_one(_state: &State) {}
}

#[cfg(all(
    not(feature = "loom"),
    any(
        target_os = "linux",
        target_os = "android",
        target_os = "freebsd",
        target_os = "macos",
        target_os = "ios",
        target_os = "windows"
    )
))]
mod platform {
    use crate::state::State;

    pub const SUPPORTED: bool = true;

    pub fn wait(state: &State, expected: u32) {
        atomic_wait::wait(state.as_atomic(), expected);
    }

    pub fn wake_one(state: &State) {
        atomic_wait::wake_one(state.as_atomic());
    }
}

#[cfg(all(
    not(feature = "loom"),
    not(any(
        target_os = "linux",
        target_os = "android",
        target_os = "freebsd",
        target_os = "macos",
        target_os = "ios",
        target_os = "windows"
    ))
))]
mod platform {
    use crate::{locker::LockError, state::State};

    pub const SUPPORTED: bool = false;

    pub fn wait(_state: &State, _expected: u32) {
        panic!("{}", LockError::Unsupported);
    }

    pub fn wake_one(_state: &State) {
        panic!("{}", LockError::Unsupported);
    }
}

/// whether this platform can park a thread on an address
pub const SUPPORTED: bool = platform::SUPPORTED;

/// Sleeps while `state` holds `expected`.
/// Returns right away if it doesn't, and sometimes for no reason at all => re-check the state.
pub fn wait(state: &State, expected: u32) {
    platform::wait(state, expected)
}

/// wakes at most one thread sleeping in [wait] on `state`
pub fn wake_one(state: &State) {
    platform::wake_one(state)
}
