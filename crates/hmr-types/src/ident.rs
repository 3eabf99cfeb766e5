// SPDX-License-Identifier: Apache-2.0
//! Identifier types for modules, versions, and content.

/// Canonical 256-bit hash used for content hashes and ABI signatures.
pub type Hash32 = [u8; 32];

/// Stable opaque identifier assigned to a module at first discovery.
///
/// A `ModuleIdentity` is never reused once its registry entry reaches
/// `Unloaded`: a later artifact with the same human-readable name is a
/// distinct identity. Identities are 16 bytes, matching the artifact
/// descriptor's `module_identity` field (see the spec's external-interface
/// table).
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ModuleIdentity(pub [u8; 16]);

impl ModuleIdentity {
    /// Derives a stable identity from a human-readable name.
    ///
    /// This is a convenience for tests and for watchers that mint identities
    /// from a build target name; nothing requires identities to be
    /// label-derived.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let digest = blake3::hash(name.as_bytes());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest.as_bytes()[..16]);
        Self(bytes)
    }

    /// Returns the canonical byte representation of this identity.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl std::fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Monotonically increasing version number for a module.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct VersionNumber(pub u64);

impl VersionNumber {
    /// The version immediately after this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Content hash of a loaded code artifact (BLAKE3 of the artifact bytes).
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ContentHash(pub Hash32);

impl ContentHash {
    /// Computes the content hash of `bytes`.
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }
}

/// Hash of a module version's exported symbol types and state schema.
///
/// Two descriptors are declared-compatible under the spec's
/// equal-or-declared-compatible rule (see `AbiSignature::is_compatible_with`).
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct AbiSignature(pub Hash32);

impl AbiSignature {
    /// Returns `true` if `self` is equal to, or present in, `declared_compatible`.
    ///
    /// This implements the spec's open-question resolution: ABI compatibility
    /// is hash equality, widened by an explicit allow-list the candidate
    /// descriptor carries (`VersionDescriptor::compatible_with`). There is no
    /// structural subtyping of layouts — see DESIGN.md for the rationale.
    #[must_use]
    pub fn is_compatible_with(&self, active: &Self, declared_compatible: &[Self]) -> bool {
        self == active || declared_compatible.contains(active)
    }
}
