// SPDX-License-Identifier: Apache-2.0
//! Swap admission requests and bounded backoff (spec §4.E).

use std::collections::HashMap;

use hmr_types::ModuleIdentity;

/// Fixed safety margin added to a candidate's declared migration cost
/// before checking it against the remaining frame budget.
pub const SAFETY_MARGIN_NS: u64 = 50_000;

/// Caps how many consecutive frames a rejected swap is re-queued for
/// before the requester must re-submit explicitly.
pub const MAX_BACKOFF_FRAMES: u32 = 8;

/// A request to admit a hot swap within the current frame.
#[derive(Clone, Copy, Debug)]
pub struct SwapRequest {
    /// The module the swap targets.
    pub module: ModuleIdentity,
    /// The candidate's declared migration cost estimate, in nanoseconds.
    pub estimated_cost_ns: u64,
}

/// Result of §4.F's resource-limit projection for a candidate swap, computed
/// by the caller (this crate does not depend on `hmr-sandbox`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceProjection {
    /// `true` if admitting the swap would exceed the module's post-swap
    /// resource budget.
    pub exceeds_budget: bool,
}

/// Tracks rejected-and-requeued swap attempts per module, bounded by
/// [`MAX_BACKOFF_FRAMES`].
#[derive(Debug, Default)]
pub struct BackoffTracker {
    attempts: HashMap<ModuleIdentity, u32>,
}

impl BackoffTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a rejection, returning `true` if the module may still be
    /// re-queued (attempts remain under the bound) or `false` if the bound
    /// has been reached and the requester must re-submit explicitly.
    pub fn record_rejection(&mut self, module: ModuleIdentity) -> bool {
        let attempts = self.attempts.entry(module).or_insert(0);
        *attempts += 1;
        *attempts <= MAX_BACKOFF_FRAMES
    }

    /// Clears backoff state for `module`, called once a swap is admitted.
    pub fn clear(&mut self, module: &ModuleIdentity) {
        self.attempts.remove(module);
    }

    /// Current rejection count for `module`.
    #[must_use]
    pub fn attempts(&self, module: &ModuleIdentity) -> u32 {
        self.attempts.get(module).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_bounded_at_max_frames() {
        let mut tracker = BackoffTracker::new();
        let module = ModuleIdentity::from_name("physics");
        for _ in 0..MAX_BACKOFF_FRAMES {
            assert!(tracker.record_rejection(module));
        }
        assert!(!tracker.record_rejection(module));
    }

    #[test]
    fn clear_resets_attempts() {
        let mut tracker = BackoffTracker::new();
        let module = ModuleIdentity::from_name("physics");
        tracker.record_rejection(module);
        tracker.clear(&module);
        assert_eq!(tracker.attempts(&module), 0);
    }
}
