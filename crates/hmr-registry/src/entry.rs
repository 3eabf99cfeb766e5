// SPDX-License-Identifier: Apache-2.0
//! A single registry entry and its lifecycle transitions (spec §3, §4.A).

use hmr_loader::ModuleHandle;
use hmr_scheduler::AccessorCounter;
use hmr_state::{RetentionPolicy, VersionHistory};
use hmr_types::{HmrError, LifecycleState, ModuleIdentity};

/// One module's registry bookkeeping: lifecycle state, the active handle,
/// an optional pending candidate, bounded version history, and the
/// per-entry accessor count spec §4.A calls for (distinct from
/// `hmr-scheduler`'s frame-wide accessor count, which governs *when* a
/// frame may end rather than *which module* is being read).
pub struct RegistryEntry {
    identity: ModuleIdentity,
    state: LifecycleState,
    active: Option<ModuleHandle>,
    candidate: Option<ModuleHandle>,
    history: VersionHistory<ModuleHandle>,
    accessors: AccessorCounter,
    critical_of: Vec<ModuleIdentity>,
}

impl RegistryEntry {
    /// Creates a freshly discovered entry with no handle yet.
    ///
    /// `critical_of` names the modules that declare `identity` a critical
    /// dependency, consulted only by Recovery's escalate path (spec §4.H,
    /// §10.6).
    #[must_use]
    pub fn new(identity: ModuleIdentity, critical_of: Vec<ModuleIdentity>, retention: RetentionPolicy) -> Self {
        Self {
            identity,
            state: LifecycleState::Discovered,
            active: None,
            candidate: None,
            history: VersionHistory::new(retention),
            accessors: AccessorCounter::new(),
            critical_of,
        }
    }

    /// The module this entry belongs to.
    #[must_use]
    pub fn identity(&self) -> ModuleIdentity {
        self.identity
    }

    /// The current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// The currently active handle, if any.
    #[must_use]
    pub fn active(&self) -> Option<&ModuleHandle> {
        self.active.as_ref()
    }

    /// The pending candidate handle, if any.
    #[must_use]
    pub fn candidate(&self) -> Option<&ModuleHandle> {
        self.candidate.as_ref()
    }

    /// This entry's version history ring.
    #[must_use]
    pub fn history(&self) -> &VersionHistory<ModuleHandle> {
        &self.history
    }

    /// The per-entry accessor counter (spec §4.A: "increments a per-entry
    /// accessor counter atomically").
    #[must_use]
    pub fn accessors(&self) -> &AccessorCounter {
        &self.accessors
    }

    /// Modules that declare this entry a critical dependency.
    #[must_use]
    pub fn critical_of(&self) -> &[ModuleIdentity] {
        &self.critical_of
    }

    /// Moves this entry to `next`, rejecting any transition not named in
    /// `LifecycleState::allowed_next`.
    pub fn transition(&mut self, next: LifecycleState) -> Result<(), HmrError> {
        if !self.state.can_transition_to(next) {
            return Err(HmrError::IllegalTransition(self.identity));
        }
        self.state = next;
        Ok(())
    }

    /// Installs the first loaded handle on the module's first activation
    /// path (`Initializing -> Active`), called by the coordinator once the
    /// module's initializer has run.
    pub fn install_first_handle(&mut self, handle: ModuleHandle) -> Result<(), HmrError> {
        self.transition(LifecycleState::Active)?;
        self.active = Some(handle);
        Ok(())
    }

    /// Sets the pending candidate, failing with `VersionConflict` if one is
    /// already staged.
    pub fn set_candidate(&mut self, candidate: ModuleHandle) -> Result<(), HmrError> {
        if self.candidate.is_some() {
            return Err(HmrError::VersionConflict(self.identity));
        }
        self.candidate = Some(candidate);
        Ok(())
    }

    /// Discards the pending candidate without touching `active` or `state`
    /// (spec §4.D failure model: any failure before step 6 is fully
    /// reversible).
    pub fn discard_candidate(&mut self) -> Option<ModuleHandle> {
        self.candidate.take()
    }

    /// Promotes the pending candidate to active, demoting the previous
    /// active handle into version history. Returns the demoted handle.
    ///
    /// Fails with `NotActive` if no candidate is staged.
    pub fn promote_candidate(&mut self) -> Result<Option<ModuleHandle>, HmrError> {
        let candidate = self
            .candidate
            .take()
            .ok_or(HmrError::NotActive(self.identity))?;
        let demoted = self.active.replace(candidate);
        if let Some(ref old) = demoted {
            self.history.push(old.clone());
        }
        Ok(demoted)
    }

    /// Restores `handle` as active directly, used by Recovery's rollback
    /// path to put the previous version back without going through
    /// `promote_candidate`.
    pub fn restore_active(&mut self, handle: ModuleHandle) {
        self.active = Some(handle);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn entry() -> RegistryEntry {
        RegistryEntry::new(
            ModuleIdentity::from_name("physics"),
            Vec::new(),
            RetentionPolicy::KeepAll,
        )
    }

    #[test]
    fn illegal_transition_is_rejected() {
        let mut e = entry();
        assert!(matches!(
            e.transition(LifecycleState::Active),
            Err(HmrError::IllegalTransition(_))
        ));
    }

    #[test]
    fn legal_transition_chain_succeeds() {
        let mut e = entry();
        for next in [
            LifecycleState::Building,
            LifecycleState::Built,
            LifecycleState::Loading,
            LifecycleState::Loaded,
            LifecycleState::Linking,
            LifecycleState::Linked,
            LifecycleState::Initializing,
        ] {
            e.transition(next).expect("named transition");
        }
        assert_eq!(e.state(), LifecycleState::Initializing);
    }

    #[test]
    fn second_candidate_is_version_conflict() {
        let mut e = entry();
        e.state = LifecycleState::Active;
        let identity = e.identity;
        let mock = |v: u64| -> ModuleHandle {
            hmr_loader::Loader::new(Box::new(hmr_loader::NullVerifier))
                .load(
                    &sample_descriptor(identity, v),
                    b"artifact",
                    hmr_loader::SymbolTable::default(),
                    &std::collections::BTreeSet::new(),
                    &|_| true,
                )
                .expect("load should succeed")
        };
        e.set_candidate(mock(2)).expect("first candidate");
        assert!(matches!(
            e.set_candidate(mock(3)),
            Err(HmrError::VersionConflict(_))
        ));
    }

    fn sample_descriptor(identity: ModuleIdentity, version: u64) -> hmr_types::VersionDescriptor {
        hmr_types::VersionDescriptor {
            magic: hmr_types::DESCRIPTOR_MAGIC,
            descriptor_version: hmr_types::DESCRIPTOR_VERSION,
            module_identity: identity,
            version_number: hmr_types::VersionNumber(version),
            content_hash: hmr_types::ContentHash::of(b"artifact"),
            abi_signature: hmr_types::AbiSignature([0u8; 32]),
            compatible_with: Vec::new(),
            capabilities: hmr_types::CapabilitySet::NONE,
            limits: hmr_types::ResourceLimits::new(65_536, 1, 5_000),
            signature: [0u8; 64],
        }
    }
}
