// SPDX-License-Identifier: Apache-2.0
//! The loaded-module handle produced by [`crate::Loader::load`].

use hmr_types::{AbiSignature, CapabilitySet, ContentHash, ModuleIdentity, ResourceLimits, VersionNumber};

use crate::symbols::SymbolTable;

/// A module artifact that has passed verification, linking, and self-check,
/// in the `Loaded` lifecycle state (spec §4.D). Registry promotion to
/// `Active` happens outside this crate.
#[derive(Clone, Debug)]
pub struct ModuleHandle {
    identity: ModuleIdentity,
    version: VersionNumber,
    content_hash: ContentHash,
    abi_signature: AbiSignature,
    capabilities: CapabilitySet,
    limits: ResourceLimits,
    symbols: SymbolTable,
}

impl ModuleHandle {
    /// Constructs a handle. Only [`crate::Loader`] should call this — it is
    /// `pub(crate)` so a handle can never exist without passing `load`'s
    /// verification steps.
    pub(crate) fn new(
        identity: ModuleIdentity,
        version: VersionNumber,
        content_hash: ContentHash,
        abi_signature: AbiSignature,
        capabilities: CapabilitySet,
        limits: ResourceLimits,
        symbols: SymbolTable,
    ) -> Self {
        Self {
            identity,
            version,
            content_hash,
            abi_signature,
            capabilities,
            limits,
            symbols,
        }
    }

    /// The module identity this handle belongs to.
    #[must_use]
    pub fn identity(&self) -> ModuleIdentity {
        self.identity
    }

    /// The loaded version number.
    #[must_use]
    pub fn version(&self) -> VersionNumber {
        self.version
    }

    /// Content hash of the verified artifact bytes.
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        self.content_hash
    }

    /// The loaded artifact's ABI signature.
    #[must_use]
    pub fn abi_signature(&self) -> AbiSignature {
        self.abi_signature
    }

    /// Capabilities granted to this module version.
    #[must_use]
    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    /// Declared resource limits for this module version.
    #[must_use]
    pub fn limits(&self) -> ResourceLimits {
        self.limits
    }

    /// The module's exported/imported symbol table.
    #[must_use]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }
}
