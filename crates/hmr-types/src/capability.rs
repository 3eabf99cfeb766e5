// SPDX-License-Identifier: Apache-2.0
//! The module capability set (spec §4.F) and its wire-format bitmask.

/// A single capability a module may be granted at registration.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum Capability {
    /// Permits requesting that another module be loaded.
    LoadModule = 0,
    /// Permits requesting that another module be unloaded.
    UnloadModule = 1,
    /// Permits reading state chunks through an accessor.
    ReadState = 2,
    /// Permits writing state chunks through an accessor.
    WriteState = 3,
    /// Permits allocating from the module's arena.
    AllocMemory = 4,
    /// Permits freeing arena allocations.
    FreeMemory = 5,
    /// Permits reading from the file system (external effect, checked only).
    FileRead = 6,
    /// Permits writing to the file system (external effect, checked only).
    FileWrite = 7,
    /// Permits opening network connections (external effect, checked only).
    Network = 8,
    /// Permits issuing raw system calls (external effect, checked only).
    Syscall = 9,
    /// Permits attaching a debugger or introspecting other modules.
    Debug = 10,
    /// Permits administrative operations (capability threshold changes, etc).
    Admin = 11,
}

impl Capability {
    /// All capabilities, in bit order.
    pub const ALL: [Capability; 12] = [
        Capability::LoadModule,
        Capability::UnloadModule,
        Capability::ReadState,
        Capability::WriteState,
        Capability::AllocMemory,
        Capability::FreeMemory,
        Capability::FileRead,
        Capability::FileWrite,
        Capability::Network,
        Capability::Syscall,
        Capability::Debug,
        Capability::Admin,
    ];

    const fn bit(self) -> u64 {
        1u64 << (self as u8)
    }
}

/// A bitmask of granted [`Capability`] values.
///
/// Mirrors the `capability_mask: u64` field of the artifact descriptor
/// (spec §6). Grants are monotonically non-increasing within a module
/// version: a candidate descriptor's mask must be a subset of the active
/// descriptor's mask, or registration is rejected as `CapabilityEscalation`.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct CapabilitySet(pub u64);

impl CapabilitySet {
    /// The empty capability set.
    pub const NONE: Self = Self(0);

    /// Builds a set from an explicit list of capabilities.
    #[must_use]
    pub fn from_iter(caps: impl IntoIterator<Item = Capability>) -> Self {
        caps.into_iter().fold(Self::NONE, |acc, c| acc.granting(c))
    }

    /// Returns a copy of this set with `cap` granted.
    #[must_use]
    pub fn granting(self, cap: Capability) -> Self {
        Self(self.0 | cap.bit())
    }

    /// Returns `true` if `cap` is granted.
    #[must_use]
    pub fn has(self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    /// Returns `true` if every capability in `self` is also granted in `other`,
    /// i.e. `self` does not escalate beyond `other`.
    #[must_use]
    pub fn is_subset_of(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grants_round_trip() {
        let set = CapabilitySet::from_iter([Capability::ReadState, Capability::WriteState]);
        assert!(set.has(Capability::ReadState));
        assert!(set.has(Capability::WriteState));
        assert!(!set.has(Capability::Network));
    }

    #[test]
    fn subset_check_detects_escalation() {
        let granted = CapabilitySet::from_iter([Capability::ReadState]);
        let requested = CapabilitySet::from_iter([Capability::ReadState, Capability::WriteState]);
        assert!(!requested.is_subset_of(granted));
        assert!(granted.is_subset_of(requested));
    }
}
