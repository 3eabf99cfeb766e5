// SPDX-License-Identifier: Apache-2.0
//! The Module Registry (spec §4.A): identity → entry, lookup, and
//! candidate proposal.
//!
//! Unlike the narrower-error-then-`From`-convert layering of `hmr-loader`,
//! `hmr-state`, and `hmr-sandbox`, this crate returns `hmr_types::HmrError`
//! directly: it sits at the point the spec calls "exhaustive for the core"
//! (§7), so there is no narrower local error it would otherwise need to
//! widen.

use std::collections::HashMap;
use std::sync::Mutex;

use hmr_loader::ModuleHandle;
use hmr_scheduler::AccessorGuard;
use hmr_state::RetentionPolicy;
use hmr_types::{AbiSignature, HmrError, LifecycleState, ModuleIdentity};

use crate::entry::RegistryEntry;

/// Maps module identity to registry entry (spec §4.A).
pub struct Registry {
    entries: Mutex<HashMap<ModuleIdentity, RegistryEntry>>,
    retention: RetentionPolicy,
}

impl Registry {
    /// Creates an empty registry whose entries retain version history under
    /// `retention`.
    #[must_use]
    pub fn new(retention: RetentionPolicy) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            retention,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ModuleIdentity, RegistryEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Registers a fresh identity, transitioning it to `Discovered`.
    ///
    /// Fails with `IllegalTransition` if the identity is already known: a
    /// module identity is never reused once its entry reaches `Unloaded`
    /// (spec §3), and re-registering a still-live entry is not a named
    /// transition.
    pub fn register(
        &self,
        identity: ModuleIdentity,
        critical_of: Vec<ModuleIdentity>,
    ) -> Result<(), HmrError> {
        let mut entries = self.lock();
        if entries.contains_key(&identity) {
            return Err(HmrError::IllegalTransition(identity));
        }
        entries.insert(
            identity,
            RegistryEntry::new(identity, critical_of, self.retention),
        );
        Ok(())
    }

    /// Applies a named lifecycle transition to `identity`'s entry.
    pub fn transition(&self, identity: ModuleIdentity, next: LifecycleState) -> Result<(), HmrError> {
        let mut entries = self.lock();
        let entry = entries
            .get_mut(&identity)
            .ok_or(HmrError::UnknownModule(identity))?;
        entry.transition(next)
    }

    /// Installs the first loaded handle, transitioning the entry to
    /// `Active` on first load (spec §4.D: `Initializing -> Active`).
    pub fn install_first_handle(
        &self,
        identity: ModuleIdentity,
        handle: ModuleHandle,
    ) -> Result<(), HmrError> {
        let mut entries = self.lock();
        let entry = entries
            .get_mut(&identity)
            .ok_or(HmrError::UnknownModule(identity))?;
        entry.install_first_handle(handle)
    }

    /// Looks up the active handle for `identity`, pinning a per-entry
    /// accessor for the caller's frame.
    ///
    /// Fails with `ModuleQuarantined` if the entry is in `Error`, or
    /// `NotActive` if it is in any other state besides `Active` or
    /// `HotSwapping` (spec §4.A lookup eligibility).
    pub fn lookup(&self, identity: ModuleIdentity) -> Result<(ModuleHandle, AccessorGuard), HmrError> {
        let entries = self.lock();
        let entry = entries
            .get(&identity)
            .ok_or(HmrError::UnknownModule(identity))?;
        if entry.state() == LifecycleState::Error {
            return Err(HmrError::ModuleQuarantined(identity));
        }
        if !entry.state().is_lookup_eligible() {
            return Err(HmrError::NotActive(identity));
        }
        let handle = entry
            .active()
            .cloned()
            .ok_or(HmrError::NotActive(identity))?;
        let guard = entry.accessors().enter();
        Ok((handle, guard))
    }

    /// Proposes `candidate` to replace `identity`'s active handle.
    ///
    /// Fails with `UnknownModule`, `NotActive` (no active handle to compare
    /// against), `VersionConflict` (a candidate is already pending),
    /// `AbiIncompatible`, or `CapabilityEscalation` (spec §4.A).
    pub fn propose_candidate(
        &self,
        identity: ModuleIdentity,
        candidate: ModuleHandle,
        compatible_with: &[AbiSignature],
    ) -> Result<(), HmrError> {
        let mut entries = self.lock();
        let entry = entries
            .get_mut(&identity)
            .ok_or(HmrError::UnknownModule(identity))?;
        let active = entry.active().ok_or(HmrError::NotActive(identity))?;
        if !candidate
            .abi_signature()
            .is_compatible_with(&active.abi_signature(), compatible_with)
        {
            return Err(HmrError::AbiIncompatible(identity));
        }
        if !candidate.capabilities().is_subset_of(active.capabilities()) {
            return Err(HmrError::CapabilityEscalation(identity));
        }
        entry.set_candidate(candidate)
    }

    /// Discards `identity`'s pending candidate without touching its active
    /// handle or lifecycle state (spec §4.D: pre-step-6 failures are fully
    /// reversible).
    pub fn revert_candidate(&self, identity: ModuleIdentity) -> Result<(), HmrError> {
        let mut entries = self.lock();
        let entry = entries
            .get_mut(&identity)
            .ok_or(HmrError::UnknownModule(identity))?;
        entry.discard_candidate();
        Ok(())
    }

    /// Promotes `identity`'s pending candidate to active (spec §4.D step
    /// 6), returning the demoted previous handle if one existed.
    pub fn promote_candidate(&self, identity: ModuleIdentity) -> Result<Option<ModuleHandle>, HmrError> {
        let mut entries = self.lock();
        let entry = entries
            .get_mut(&identity)
            .ok_or(HmrError::UnknownModule(identity))?;
        entry.promote_candidate()
    }

    /// Restores `handle` as `identity`'s active handle directly (Recovery's
    /// rollback path).
    pub fn restore_active(&self, identity: ModuleIdentity, handle: ModuleHandle) -> Result<(), HmrError> {
        let mut entries = self.lock();
        let entry = entries
            .get_mut(&identity)
            .ok_or(HmrError::UnknownModule(identity))?;
        entry.restore_active(handle);
        Ok(())
    }

    /// Blocks until `identity`'s per-entry accessor count reaches zero
    /// (spec §4.D step 5). A no-op if `identity` is unregistered.
    pub fn wait_for_quiescence(&self, identity: ModuleIdentity) {
        let counter = self.lock().get(&identity).map(|e| e.accessors().clone());
        if let Some(counter) = counter {
            counter.wait_for_quiescence();
        }
    }

    /// The most recently demoted handle in `identity`'s version history, if
    /// any (Recovery's rollback path, spec §4.H).
    #[must_use]
    pub fn previous_handle(&self, identity: ModuleIdentity) -> Option<ModuleHandle> {
        self.lock()
            .get(&identity)
            .and_then(|e| e.history().latest().cloned())
    }

    /// Current lifecycle state of `identity`, if registered.
    #[must_use]
    pub fn state_of(&self, identity: ModuleIdentity) -> Option<LifecycleState> {
        self.lock().get(&identity).map(RegistryEntry::state)
    }

    /// Modules that declare `identity` a critical dependency (spec §4.H
    /// escalate path, §10.6).
    #[must_use]
    pub fn critical_of(&self, identity: ModuleIdentity) -> Vec<ModuleIdentity> {
        self.lock()
            .get(&identity)
            .map(|e| e.critical_of().to_vec())
            .unwrap_or_default()
    }

    /// Retires `identity` through `Stopping -> Unloading -> Unloaded`.
    /// Idempotent: a no-op if the entry is already `Unloaded`.
    pub fn retire(&self, identity: ModuleIdentity) -> Result<(), HmrError> {
        let mut entries = self.lock();
        let entry = entries
            .get_mut(&identity)
            .ok_or(HmrError::UnknownModule(identity))?;
        match entry.state() {
            LifecycleState::Unloaded => return Ok(()),
            LifecycleState::Unloading => {}
            // Error retires straight to Unloading; every other non-terminal
            // state routes through Stopping first (spec §4.D: "Any state ->
            // Stopping -> Unloading -> Unloaded on retirement").
            LifecycleState::Error => entry.transition(LifecycleState::Unloading)?,
            LifecycleState::Stopping => entry.transition(LifecycleState::Unloading)?,
            _ => {
                entry.transition(LifecycleState::Stopping)?;
                entry.transition(LifecycleState::Unloading)?;
            }
        }
        entry.transition(LifecycleState::Unloaded)
    }
}
