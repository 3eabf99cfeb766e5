// SPDX-License-Identifier: Apache-2.0
//! Capability enforcement (spec §4.F, §6).
//!
//! A [`CapabilityGuard`] wraps the `CapabilitySet` a module was granted at
//! load time and rejects any operation outside it. Grants never escalate
//! across a hot swap: [`CapabilityGuard::swap_in`] enforces that the
//! incoming set is a subset of (or equal to) the outgoing one.

use hmr_types::{Capability, CapabilitySet, HmrError, ModuleIdentity};

/// Checks module operations against a granted [`CapabilitySet`].
pub struct CapabilityGuard {
    identity: ModuleIdentity,
    granted: CapabilitySet,
}

impl CapabilityGuard {
    /// Creates a guard for `identity` holding exactly `granted`.
    #[must_use]
    pub fn new(identity: ModuleIdentity, granted: CapabilitySet) -> Self {
        Self { identity, granted }
    }

    /// The capability set currently granted.
    #[must_use]
    pub fn granted(&self) -> CapabilitySet {
        self.granted
    }

    /// Checks that `capability` is granted, producing `HmrError::CapabilityMissing` if not.
    pub fn require(&self, capability: Capability) -> Result<(), HmrError> {
        if self.granted.has(capability) {
            Ok(())
        } else {
            Err(HmrError::CapabilityMissing(self.identity))
        }
    }

    /// Replaces the granted set with `incoming`, enforcing monotonic
    /// non-escalation: `incoming` must not grant anything `self.granted`
    /// didn't already grant.
    pub fn swap_in(&mut self, incoming: CapabilitySet) -> Result<(), HmrError> {
        if incoming.is_subset_of(self.granted) {
            self.granted = incoming;
            Ok(())
        } else {
            Err(HmrError::CapabilityEscalation(self.identity))
        }
    }
}
