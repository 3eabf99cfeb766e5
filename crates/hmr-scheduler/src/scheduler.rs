// SPDX-License-Identifier: Apache-2.0
//! The Frame Scheduler (spec §4.E): begin-frame, accessor-enter/exit,
//! end-frame, admit-swap, reject-swap.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use hmr_types::{HmrError, ModuleIdentity};
use tracing::{debug, warn};

use crate::accessor::{AccessorCounter, AccessorGuard};
use crate::budget::FrameBudget;
use crate::swap::{BackoffTracker, ResourceProjection, SwapRequest, SAFETY_MARGIN_NS};

/// A token proving a swap was admitted this frame. The Swap Coordinator
/// must present this to proceed past step 1 of the atomic swap protocol.
#[derive(Debug, Clone, Copy)]
pub struct AdmittedWindow {
    /// The module the admitted swap targets.
    pub module: ModuleIdentity,
    /// The frame number the admission was granted in.
    pub frame: u64,
}

/// Owns the notion of a frame: accessor reference counting, per-frame HMR
/// budget accounting, and swap admission.
///
/// Cooperative, single-authority: the scheduler is driven by the
/// application loop calling `begin_frame`/`end_frame`, not by preemption.
pub struct FrameScheduler {
    frame: AtomicU64,
    accessors: AccessorCounter,
    budget: FrameBudget,
    pending_swaps: Mutex<HashSet<ModuleIdentity>>,
    backoff: Mutex<BackoffTracker>,
}

impl FrameScheduler {
    /// Creates a scheduler whose per-frame HMR budget is `budget_ceiling_ns`.
    #[must_use]
    pub fn new(budget_ceiling_ns: u64) -> Self {
        Self {
            frame: AtomicU64::new(0),
            accessors: AccessorCounter::new(),
            budget: FrameBudget::new(budget_ceiling_ns),
            pending_swaps: Mutex::new(HashSet::new()),
            backoff: Mutex::new(BackoffTracker::new()),
        }
    }

    /// The current frame number.
    #[must_use]
    pub fn frame_number(&self) -> u64 {
        self.frame.load(Ordering::Acquire)
    }

    /// Starts a new frame, resetting the HMR budget.
    pub fn begin_frame(&self) {
        self.budget.reset();
        debug!(frame = self.frame_number(), "frame begin");
    }

    /// Marks a worker as touching module state; drop the returned guard to
    /// mark `accessor-exit`.
    #[must_use]
    pub fn accessor_enter(&self) -> AccessorGuard {
        self.accessors.enter()
    }

    /// Reports that an HMR operation consumed `ns` nanoseconds of this
    /// frame's budget.
    pub fn report_elapsed(&self, ns: u64) {
        self.budget.report(ns);
    }

    /// Blocks until every accessor guard has dropped, then advances to the
    /// next frame number.
    pub fn end_frame(&self) {
        self.accessors.wait_for_quiescence();
        self.frame.fetch_add(1, Ordering::AcqRel);
        debug!(frame = self.frame_number(), "frame end");
    }

    /// Attempts to admit `request` within the current frame's remaining
    /// budget.
    ///
    /// Admitted if: (i) remaining budget covers the estimated cost plus a
    /// fixed safety margin; (ii) the module is not already the target of
    /// another pending swap; (iii) `projection` does not project a
    /// post-swap resource overage.
    pub fn admit_swap(
        &self,
        request: SwapRequest,
        projection: ResourceProjection,
    ) -> Result<AdmittedWindow, HmrError> {
        let required = request.estimated_cost_ns.saturating_add(SAFETY_MARGIN_NS);
        if !self.budget.can_afford(required) {
            return self.reject_swap(request.module);
        }

        let mut pending = self
            .pending_swaps
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if pending.contains(&request.module) {
            drop(pending);
            return self.reject_swap(request.module);
        }
        if projection.exceeds_budget {
            drop(pending);
            return self.reject_swap(request.module);
        }

        pending.insert(request.module);
        drop(pending);
        self.backoff
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear(&request.module);

        Ok(AdmittedWindow {
            module: request.module,
            frame: self.frame_number(),
        })
    }

    /// Marks a previously admitted swap as resolved (committed or rolled
    /// back), freeing the module to be the target of a future swap request.
    pub fn release_swap(&self, module: &ModuleIdentity) {
        self.pending_swaps
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(module);
    }

    fn reject_swap(&self, module: ModuleIdentity) -> Result<AdmittedWindow, HmrError> {
        let still_backing_off = self
            .backoff
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .record_rejection(module);
        warn!(module = %module, still_backing_off, "swap not admitted");
        Err(HmrError::NotAdmitted(module))
    }
}
