// SPDX-License-Identifier: Apache-2.0
//! Loader-local error type, converted to `HmrError` at the public boundary.

use hmr_types::{HmrError, ModuleIdentity};
use thiserror::Error;

/// Errors raised while loading a single artifact (spec §4.B).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The descriptor's magic/version does not match this runtime.
    #[error("descriptor schema not recognized for {0}")]
    UnknownDescriptorSchema(ModuleIdentity),
    /// The artifact's signature did not verify against its declared bytes.
    #[error("signature invalid for {0}")]
    SignatureInvalid(ModuleIdentity),
    /// A required import could not be resolved against the registry's
    /// export set.
    #[error("unresolved symbol `{symbol}` while loading {module}")]
    SymbolUnresolved {
        /// The module being loaded.
        module: ModuleIdentity,
        /// The unresolved import name.
        symbol: String,
    },
    /// The artifact declared a layout the loader could not parse.
    #[error("layout mismatch for {0}")]
    LayoutMismatch(ModuleIdentity),
    /// The module-declared self-check returned failure.
    #[error("self-check failed for {0}")]
    SelfCheckFailed(ModuleIdentity),
}

impl From<LoadError> for HmrError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::UnknownDescriptorSchema(m) | LoadError::LayoutMismatch(m) => {
                HmrError::LayoutMismatch(m)
            }
            LoadError::SignatureInvalid(m) => HmrError::SignatureInvalid(m),
            LoadError::SymbolUnresolved { module, symbol } => {
                HmrError::SymbolUnresolved { module, symbol }
            }
            LoadError::SelfCheckFailed(m) => HmrError::SelfCheckFailed(m),
        }
    }
}
