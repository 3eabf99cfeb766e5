// SPDX-License-Identifier: Apache-2.0
//! Tracks sandbox violations per module (spec §4.F, §4.H).
//!
//! A module that crosses a declared violation threshold is moved to a
//! locked-down state by the Recovery orchestrator (§4.H); this tracker only
//! counts, it does not itself enforce the lockdown.

use std::sync::atomic::{AtomicU64, Ordering};

use hmr_types::ModuleIdentity;
use tracing::warn;

/// Counts sandbox violations (capability misses, bounds escapes, quota
/// breaches) against a configurable threshold.
pub struct ViolationTracker {
    identity: ModuleIdentity,
    threshold: u64,
    count: AtomicU64,
}

impl ViolationTracker {
    /// Creates a tracker for `identity` that trips at `threshold` violations.
    #[must_use]
    pub fn new(identity: ModuleIdentity, threshold: u64) -> Self {
        Self {
            identity,
            threshold,
            count: AtomicU64::new(0),
        }
    }

    /// Records one violation, returning the new cumulative count.
    pub fn record(&self) -> u64 {
        let count = self.count.fetch_add(1, Ordering::AcqRel) + 1;
        warn!(module = %self.identity, count, threshold = self.threshold, "sandbox violation");
        count
    }

    /// Current cumulative violation count.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    /// Returns `true` once `count` has reached or passed `threshold`.
    #[must_use]
    pub fn is_tripped(&self) -> bool {
        self.count() >= self.threshold
    }
}
