//! # Lock state
//!
//! Every lock in this crate is one `u32` word. It's `u32` and not a boolean
//! so the very same word can be handed to the futex-style wait & wake.
//!
//! - `0` - unlocked
//! - `1` - locked, nobody is known to wait
//! - `2` - locked, somebody may be waiting (blocking and adaptive locks only)
//!
//! The word is only ever touched through [State]: plain read-modify-write on it
//! would let two threads both see `0` and both think they hold the lock.
//!
//! ## Ordering
//! Whoever takes the lock must see everything the previous holder wrote.
//! So every operation that may take the lock is Acquire and every one that may
//! release it is Release. [State::swap] does both jobs (lock in the slow paths,
//! unlock everywhere), hence AcqRel.

use std::sync::atomic::Ordering::{AcqRel, Acquire, Relaxed, Release};

#[cfg(feature = "loom")]
use loom::sync::atomic::AtomicU32;
#[cfg(not(feature = "loom"))]
use std::sync::atomic::AtomicU32;

pub const UNLOCKED: u32 = 0;
pub const LOCKED: u32 = 1;
pub const CONTENDED: u32 = 2;

#[derive(Debug)]
pub struct State {
    word: AtomicU32,
}

impl State {
    /// unlocked from the start
    pub fn new() -> Self {
        Self {
            word: AtomicU32::new(UNLOCKED),
        }
    }

    /// sees the latest release store / swap of the previous holder
    pub fn load(&self) -> u32 {
        self.word.load(Acquire)
    }

    /// A cheap look for spin loops.
    /// Whatever it returns must be confirmed by [State::swap] or [State::compare_and_swap]
    /// before anybody relies on it.
    pub fn peek(&self) -> u32 {
        self.word.load(Relaxed)
    }

    /// publishes the holder's writes to the next acquirer
    pub fn store(&self, value: u32) {
        self.word.store(value, Release);
    }

    /// returns the value it replaced
    pub fn swap(&self, value: u32) -> u32 {
        self.word.swap(value, AcqRel)
    }

    /// Sets `desired` only if the word is `expected` at the moment.
    /// A failed attempt writes nothing, so it's gentle on the cache line.
    pub fn compare_and_swap(&self, expected: u32, desired: u32) -> bool {
        self.word
            .compare_exchange(expected, desired, AcqRel, Relaxed)
            .is_ok()
    }

    /// the raw word for [crate::futex::wait] and [crate::futex::wake_one]
    #[cfg(not(feature = "loom"))]
    pub(crate) fn as_atomic(&self) -> &AtomicU32 {
        &self.word
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod test {
    use std::thread::scope;

    use super::*;

    #[test]
    fn test_starts_unlocked() {
        assert_eq!(State::new().load(), UNLOCKED);
        assert_eq!(State::default().peek(), UNLOCKED);
    }

    #[test]
    fn test_swap_returns_previous() {
        let s = State::new();
        assert_eq!(s.swap(LOCKED), UNLOCKED);
        assert_eq!(s.swap(CONTENDED), LOCKED);
        assert_eq!(s.swap(UNLOCKED), CONTENDED);
        s.store(LOCKED);
        assert_eq!(s.load(), LOCKED);
    }

    #[test]
    fn test_compare_and_swap() {
        let s = State::new();
        assert!(s.compare_and_swap(UNLOCKED, LOCKED));
        // the second one sees 1 and leaves it alone
        assert!(!s.compare_and_swap(UNLOCKED, LOCKED));
        assert_eq!(s.load(), LOCKED);
    }

    #[test]
    fn test_only_one_winner() {
        let s = State::new();
        let winners = std::sync::atomic::AtomicU32::new(0);
        scope(|sc| {
            for _ in 0..8 {
                sc.spawn(|| {
                    if s.compare_and_swap(UNLOCKED, LOCKED) {
                        winners.fetch_add(1, Relaxed);
                    }
                });
            }
        });
        assert_eq!(winners.into_inner(), 1);
    }
}
