// SPDX-License-Identifier: Apache-2.0
//! Accessor reference counting (spec §4.E).
//!
//! Application worker threads run freely between `begin-frame` and
//! `end-frame`, but must hold an [`AccessorGuard`] while touching module
//! state. `end-frame` spins until the counter reaches zero; this crate
//! forbids `unsafe_code`, so the wait is a cooperative yield loop rather
//! than a futex wait.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared accessor counter for one frame scheduler.
#[derive(Debug, Default, Clone)]
pub struct AccessorCounter {
    count: Arc<AtomicU64>,
}

impl AccessorCounter {
    /// Creates a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current number of held accessor guards.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    /// Increments the counter and returns a guard that decrements it on
    /// drop (`accessor-enter`/`accessor-exit`).
    #[must_use]
    pub fn enter(&self) -> AccessorGuard {
        self.count.fetch_add(1, Ordering::AcqRel);
        AccessorGuard {
            count: Arc::clone(&self.count),
        }
    }

    /// Spins until the counter reaches zero, yielding the thread between
    /// checks. Called by `end-frame`.
    pub fn wait_for_quiescence(&self) {
        while self.count() > 0 {
            std::thread::yield_now();
        }
    }
}

/// An RAII handle marking one worker as actively touching module state.
/// Dropping it is `accessor-exit`.
pub struct AccessorGuard {
    count: Arc<AtomicU64>,
}

impl Drop for AccessorGuard {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_increments_and_drop_decrements() {
        let counter = AccessorCounter::new();
        let guard = counter.enter();
        assert_eq!(counter.count(), 1);
        drop(guard);
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn wait_for_quiescence_returns_once_guards_drop() {
        let counter = AccessorCounter::new();
        let guard_a = counter.enter();
        let guard_b = counter.enter();
        drop(guard_a);
        drop(guard_b);
        counter.wait_for_quiescence();
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn multiple_guards_share_one_counter() {
        let counter = AccessorCounter::new();
        let _a = counter.enter();
        let _b = counter.enter();
        assert_eq!(counter.count(), 2);
    }
}
