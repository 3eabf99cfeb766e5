// SPDX-License-Identifier: Apache-2.0
//! The Recovery Orchestrator (spec §4.H): rollback → quarantine → escalate.
//!
//! Recovery only ever runs on the post-commit path of the swap protocol
//! (spec §4.D step 6 onward) or in response to a sandbox capability
//! violation (spec §4.F/§4.H). Both entry points are idempotent: re-entering
//! recovery for a module that already has recovery in flight is a no-op,
//! since the first call's outcome applies to both callers.

use std::collections::HashSet;
use std::sync::Mutex;

use hmr_cas::ChunkCas;
use hmr_sandbox::ViolationTracker;
use hmr_state::{Checkpoint, ModuleState};
use hmr_types::{HmrError, LifecycleState, ModuleIdentity};
use tracing::{error, warn};

use crate::registry::Registry;

/// Runs the rollback → quarantine → escalate policy ladder for modules that
/// fail after the point of no return in the swap protocol, or that cross a
/// declared sandbox violation threshold.
pub struct RecoveryOrchestrator {
    in_flight: Mutex<HashSet<ModuleIdentity>>,
}

impl RecoveryOrchestrator {
    /// Creates an orchestrator. `_violation_threshold` and `_cooldown_frames`
    /// are accepted for forward compatibility with a future rate-limited
    /// re-admission policy; the current ladder quarantines unconditionally
    /// once escalation is warranted rather than timing out a cooldown.
    #[must_use]
    pub fn new(_violation_threshold: u64, _cooldown_frames: u64) -> Self {
        Self {
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    fn begin(&self, identity: ModuleIdentity) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(identity)
    }

    fn end(&self, identity: ModuleIdentity) {
        self.in_flight
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&identity);
    }

    /// Recovers from a failure discovered after the swap protocol's atomic
    /// handle swap (spec §4.D step 6 onward): restores `checkpoint`, and on
    /// success puts the entry's previous handle back and returns it to
    /// `Active`. If rollback itself fails, quarantines the module instead.
    ///
    /// A no-op if recovery for `identity` is already in flight.
    pub fn recover_from_post_swap_failure(
        &self,
        registry: &Registry,
        state: &mut ModuleState,
        cas: &dyn ChunkCas,
        identity: ModuleIdentity,
        checkpoint: &Checkpoint,
    ) -> Result<(), HmrError> {
        if !self.begin(identity) {
            return Ok(());
        }
        let outcome = self.rollback_or_quarantine(registry, state, cas, identity, checkpoint);
        self.end(identity);
        outcome
    }

    fn rollback_or_quarantine(
        &self,
        registry: &Registry,
        state: &mut ModuleState,
        cas: &dyn ChunkCas,
        identity: ModuleIdentity,
        checkpoint: &Checkpoint,
    ) -> Result<(), HmrError> {
        match hmr_state::rollback(state, checkpoint, cas) {
            Ok(()) => {
                if let Some(previous) = registry.previous_handle(identity) {
                    registry.restore_active(identity, previous)?;
                }
                registry.transition(identity, LifecycleState::Active)?;
                warn!(module = %identity, "rolled back failed swap");
                Ok(())
            }
            Err(_) => {
                error!(module = %identity, "rollback failed, quarantining");
                self.quarantine(registry, identity)
            }
        }
    }

    /// Moves `identity` to `Error` (spec §4.H quarantine). Idempotent: a
    /// no-op if the entry is already quarantined.
    pub fn quarantine(&self, registry: &Registry, identity: ModuleIdentity) -> Result<(), HmrError> {
        if registry.state_of(identity) == Some(LifecycleState::Error) {
            return Ok(());
        }
        registry.transition(identity, LifecycleState::Error)
    }

    /// Records a sandbox capability violation and, once `tracker` trips,
    /// quarantines `identity`. If other modules declare `identity` a
    /// critical dependency, escalates to a cascading retirement of those
    /// dependents followed by `identity` itself (spec §4.H escalate).
    ///
    /// Returns `true` if this call caused a quarantine.
    pub fn handle_capability_violation(
        &self,
        registry: &Registry,
        tracker: &ViolationTracker,
        identity: ModuleIdentity,
    ) -> Result<bool, HmrError> {
        tracker.record();
        if !tracker.is_tripped() {
            return Ok(false);
        }
        self.quarantine(registry, identity)?;
        let dependents = registry.critical_of(identity);
        if !dependents.is_empty() {
            self.escalate(registry, identity, &dependents)?;
        }
        Ok(true)
    }

    fn escalate(
        &self,
        registry: &Registry,
        identity: ModuleIdentity,
        dependents: &[ModuleIdentity],
    ) -> Result<(), HmrError> {
        warn!(module = %identity, dependents = dependents.len(), "escalating quarantine to dependents");
        for dependent in dependents {
            registry.retire(*dependent)?;
        }
        registry.retire(identity)
    }
}
