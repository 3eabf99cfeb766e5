// SPDX-License-Identifier: Apache-2.0
//! The module lifecycle state machine (spec §3, transitions in spec §4.D).

/// A registry entry's lifecycle state.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum LifecycleState {
    /// No registry entry exists yet for this identity.
    Unknown,
    /// Registered; awaiting a build.
    Discovered,
    /// The external build pipeline is producing an artifact.
    Building,
    /// A built artifact is available but not yet loaded.
    Built,
    /// The loader is verifying and relocating the artifact.
    Loading,
    /// A handle exists but symbols are not yet resolved.
    Loaded,
    /// Imports are being resolved against the registry.
    Linking,
    /// Imports resolved; ready to initialize.
    Linked,
    /// The module's initializer is running.
    Initializing,
    /// Participating in the running simulation.
    Active,
    /// A candidate handle is being swapped in.
    HotSwapping,
    /// A pause has been requested; draining in-flight accessors.
    Pausing,
    /// Paused; not scheduled, state retained.
    Paused,
    /// A resume has been requested.
    Resuming,
    /// Retirement has been requested; draining in-flight accessors.
    Stopping,
    /// Unrecoverable or quarantined failure.
    Error,
    /// Releasing the handle and arena.
    Unloading,
    /// Terminal: identity retired, never reused.
    Unloaded,
}

impl LifecycleState {
    /// Returns `true` for the two states the spec calls out as terminal
    /// (`Unloaded` always; `Error` only when recovery has given up).
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleState::Unloaded | LifecycleState::Error)
    }

    /// Returns `true` if lookups against an entry in this state should
    /// succeed (spec §4.A: `Active` or `HotSwapping`).
    #[must_use]
    pub fn is_lookup_eligible(self) -> bool {
        matches!(self, LifecycleState::Active | LifecycleState::HotSwapping)
    }

    /// Returns the set of states `self` may transition to directly, per the
    /// named transitions of spec §4.D. Used to reject illegal transitions
    /// before they touch any other subsystem's state.
    #[must_use]
    pub fn allowed_next(self) -> &'static [LifecycleState] {
        use LifecycleState::{
            Active, Building, Built, Discovered, Error, HotSwapping, Initializing, Linked,
            Linking, Loaded, Loading, Paused, Pausing, Resuming, Stopping, Unknown, Unloaded,
            Unloading,
        };
        match self {
            Unknown => &[Discovered],
            Discovered => &[Building, Stopping],
            Building => &[Built, Error, Stopping],
            Built => &[Loading, Stopping],
            Loading => &[Loaded, Error, Stopping],
            Loaded => &[Linking, Stopping],
            Linking => &[Linked, Error, Stopping],
            Linked => &[Initializing, Stopping],
            Initializing => &[Active, Error, Stopping],
            Active => &[HotSwapping, Pausing, Stopping, Error],
            // A swap in flight cannot be cancelled (spec §4.D): retirement
            // must wait for it to resolve to Active or Error first.
            HotSwapping => &[Active, Error],
            Pausing => &[Paused, Stopping],
            Paused => &[Resuming, Stopping],
            Resuming => &[Active, Stopping],
            Stopping => &[Unloading],
            Unloading => &[Unloaded],
            Error => &[Unloading],
            Unloaded => &[],
        }
    }

    /// Returns `true` if `self -> next` is a named transition.
    #[must_use]
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        self.allowed_next().contains(&next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_admits_hotswap_pause_and_stop() {
        assert!(LifecycleState::Active.can_transition_to(LifecycleState::HotSwapping));
        assert!(LifecycleState::Active.can_transition_to(LifecycleState::Pausing));
        assert!(LifecycleState::Active.can_transition_to(LifecycleState::Stopping));
        assert!(!LifecycleState::Active.can_transition_to(LifecycleState::Loaded));
    }

    #[test]
    fn discovered_admits_retirement_before_activation() {
        assert!(LifecycleState::Discovered.can_transition_to(LifecycleState::Stopping));
    }

    #[test]
    fn hotswapping_cannot_be_retired_directly() {
        assert!(!LifecycleState::HotSwapping.can_transition_to(LifecycleState::Stopping));
    }

    #[test]
    fn active_admits_quarantine_on_violation() {
        assert!(LifecycleState::Active.can_transition_to(LifecycleState::Error));
    }

    #[test]
    fn unloaded_is_terminal_with_no_successors() {
        assert!(LifecycleState::Unloaded.is_terminal());
        assert!(LifecycleState::Unloaded.allowed_next().is_empty());
    }

    #[test]
    fn error_can_still_be_unloaded() {
        assert!(LifecycleState::Error.is_terminal());
        assert!(LifecycleState::Error.can_transition_to(LifecycleState::Unloading));
    }

    #[test]
    fn lookup_eligibility_matches_active_and_hotswapping_only() {
        assert!(LifecycleState::Active.is_lookup_eligible());
        assert!(LifecycleState::HotSwapping.is_lookup_eligible());
        assert!(!LifecycleState::Paused.is_lookup_eligible());
        assert!(!LifecycleState::Loaded.is_lookup_eligible());
    }
}
