// SPDX-License-Identifier: Apache-2.0
//! Per-frame HMR budget accounting (spec §4.E).
//!
//! Every operation in the state manager, loader, sandbox, telemetry, and
//! recovery paths reports its elapsed time here. Once the per-frame budget
//! is exhausted, further swap admission is denied until the next frame; an
//! in-flight swap already admitted is never cancelled for running over.

use std::sync::atomic::{AtomicU64, Ordering};

/// Tracks nanoseconds spent on HMR work within the current frame against a
/// fixed per-frame ceiling.
#[derive(Debug)]
pub struct FrameBudget {
    ceiling_ns: u64,
    spent_ns: AtomicU64,
}

impl FrameBudget {
    /// Creates a budget tracker with a `ceiling_ns`-nanosecond ceiling.
    #[must_use]
    pub fn new(ceiling_ns: u64) -> Self {
        Self {
            ceiling_ns,
            spent_ns: AtomicU64::new(0),
        }
    }

    /// Nanoseconds of HMR work reported so far this frame.
    #[must_use]
    pub fn spent_ns(&self) -> u64 {
        self.spent_ns.load(Ordering::Acquire)
    }

    /// Nanoseconds remaining before the ceiling is hit (zero, not negative,
    /// once exceeded).
    #[must_use]
    pub fn remaining_ns(&self) -> u64 {
        self.ceiling_ns.saturating_sub(self.spent_ns())
    }

    /// Reports that an operation consumed `ns` nanoseconds of the frame's
    /// HMR budget. Never rejected: accounting always accepts the report,
    /// even past the ceiling, since the work already happened.
    pub fn report(&self, ns: u64) {
        self.spent_ns.fetch_add(ns, Ordering::AcqRel);
    }

    /// Returns `true` if `remaining_ns` is strictly more than `required_ns`.
    /// A request landing exactly on the remaining budget is denied, not
    /// admitted (spec §4.E: the boundary belongs to the ceiling, not the
    /// request).
    #[must_use]
    pub fn can_afford(&self, required_ns: u64) -> bool {
        self.remaining_ns() > required_ns
    }

    /// Resets accounting for a new frame.
    pub fn reset(&self) {
        self.spent_ns.store(0, Ordering::Release);
    }
}
