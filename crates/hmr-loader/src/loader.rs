// SPDX-License-Identifier: Apache-2.0
//! The Module Loader (spec §4.B).
//!
//! `Loader::load` is pure with respect to running modules: nothing it does
//! mutates a registry. It only ever produces a `ModuleHandle` or an error;
//! promoting that handle into the registry is the Swap Coordinator's job.

use std::collections::BTreeSet;

use hmr_types::{ContentHash, VersionDescriptor};
use tracing::{debug, instrument};

use crate::error::LoadError;
use crate::handle::ModuleHandle;
use crate::signature::SignatureVerifier;
use crate::symbols::SymbolTable;

/// A self-check the candidate module runs once linking completes, modeling
/// the module-declared self-check step of spec §4.B. Takes the loaded
/// content hash so a real embedding can dispatch to the artifact's own
/// exported self-check entry point; returns `true` on success.
pub type SelfCheck = dyn Fn(ContentHash) -> bool + Send + Sync;

/// Verifies and links one artifact into a [`ModuleHandle`].
pub struct Loader {
    verifier: Box<dyn SignatureVerifier>,
}

impl Loader {
    /// Creates a loader that verifies signatures with `verifier`.
    #[must_use]
    pub fn new(verifier: Box<dyn SignatureVerifier>) -> Self {
        Self { verifier }
    }

    /// Runs the full §4.B pipeline: schema check, signature verification,
    /// content-hash check, symbol resolution, and self-check.
    ///
    /// `available_exports` is the combined export set of every module the
    /// registry currently considers `Active` or `HotSwapping` (spec
    /// §4.D lookup eligibility) — the set new imports may resolve against.
    #[instrument(skip(self, artifact_bytes, symbols, available_exports, self_check))]
    pub fn load(
        &self,
        descriptor: &VersionDescriptor,
        artifact_bytes: &[u8],
        symbols: SymbolTable,
        available_exports: &BTreeSet<String>,
        self_check: &SelfCheck,
    ) -> Result<ModuleHandle, LoadError> {
        let identity = descriptor.module_identity;

        if !descriptor.is_known_schema() {
            return Err(LoadError::UnknownDescriptorSchema(identity));
        }

        if !self.verifier.verify(artifact_bytes, &descriptor.signature) {
            return Err(LoadError::SignatureInvalid(identity));
        }

        let actual_hash = ContentHash::of(artifact_bytes);
        if actual_hash != descriptor.content_hash {
            return Err(LoadError::LayoutMismatch(identity));
        }

        if let Some(symbol) = symbols.first_unresolved(available_exports) {
            return Err(LoadError::SymbolUnresolved {
                module: identity,
                symbol: symbol.to_string(),
            });
        }

        if !self_check(actual_hash) {
            return Err(LoadError::SelfCheckFailed(identity));
        }

        debug!(module = %identity, version = %descriptor.version_number, "module loaded");

        Ok(ModuleHandle::new(
            identity,
            descriptor.version_number,
            actual_hash,
            descriptor.abi_signature,
            descriptor.capabilities,
            descriptor.limits,
            symbols,
        ))
    }
}
