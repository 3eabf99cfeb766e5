// SPDX-License-Identifier: Apache-2.0
//! The unified error taxonomy (spec §7), exhaustive for the core.
//!
//! Individual crates (`hmr-loader`, `hmr-state`, `hmr-sandbox`,
//! `hmr-registry`) define narrower, locally meaningful error types and
//! convert into `HmrError` at their public boundary via `From` impls, the
//! same layering `warp-core`'s narrow `EngineError` has relative to any
//! application-wide error type.

use thiserror::Error;

use crate::ident::ModuleIdentity;

/// The full error taxonomy surfaced by the HMR runtime's public API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HmrError {
    // -- Identity -----------------------------------------------------
    /// No registry entry exists for the given identity.
    #[error("unknown module: {0}")]
    UnknownModule(ModuleIdentity),
    /// A candidate was proposed while one was already pending.
    #[error("version conflict: a candidate is already pending for {0}")]
    VersionConflict(ModuleIdentity),

    // -- Loading --------------------------------------------------------
    /// The artifact's signature did not verify.
    #[error("signature invalid for artifact of {0}")]
    SignatureInvalid(ModuleIdentity),
    /// A required symbol could not be resolved against the registry.
    #[error("unresolved symbol `{symbol}` while loading {module}")]
    SymbolUnresolved {
        /// Identity of the module being loaded.
        module: ModuleIdentity,
        /// The symbol name that failed to resolve.
        symbol: String,
    },
    /// The artifact's declared layout does not match what the loader found.
    #[error("layout mismatch for {0}")]
    LayoutMismatch(ModuleIdentity),
    /// The module-declared self-check failed after loading.
    #[error("self-check failed for {0}")]
    SelfCheckFailed(ModuleIdentity),
    /// Loading, linking, or migration exceeded its timeout.
    #[error("load timeout for {0}")]
    LoadTimeout(ModuleIdentity),

    // -- Compatibility ----------------------------------------------------
    /// The candidate's ABI signature is not declared compatible with the
    /// active one.
    #[error("ABI incompatible for {0}")]
    AbiIncompatible(ModuleIdentity),
    /// The candidate requests capabilities not granted at registration.
    #[error("capability escalation requested by candidate for {0}")]
    CapabilityEscalation(ModuleIdentity),

    // -- Update -----------------------------------------------------------
    /// A second `begin-update` was attempted before the first committed.
    #[error("update already in flight for {0}")]
    UpdateInFlight(ModuleIdentity),
    /// `commit-update` was called without a preceding `begin-update`.
    #[error("no update in flight for {0}")]
    NoUpdate(ModuleIdentity),
    /// A chunk's checksum did not match its bytes.
    #[error("corrupted chunk in {0}")]
    Corrupted(ModuleIdentity),

    // -- Swap ---------------------------------------------------------------
    /// The frame scheduler declined to admit the swap this frame.
    #[error("swap not admitted for {0}")]
    NotAdmitted(ModuleIdentity),
    /// A checkpoint could not be created because an update token is held.
    #[error("module busy with an update: {0}")]
    BusyUpdate(ModuleIdentity),
    /// The candidate's post-swap hook returned failure.
    #[error("post-swap hook failed for {0}")]
    PostSwapHookFailed(ModuleIdentity),

    // -- Sandbox --------------------------------------------------------
    /// The module's arena has no room for the requested allocation.
    #[error("arena exhausted for {0}")]
    OutOfArena(ModuleIdentity),
    /// The active module lacks a capability required by the operation.
    #[error("capability missing for {0}")]
    CapabilityMissing(ModuleIdentity),
    /// An access escaped the arena or the target chunk's declared range.
    #[error("bounds violation by {0}")]
    BoundsViolation(ModuleIdentity),
    /// A declared resource quota was exceeded.
    #[error("quota exceeded for {0}")]
    QuotaExceeded(ModuleIdentity),

    // -- Lifecycle ------------------------------------------------------
    /// The requested state transition is not a named transition.
    #[error("illegal lifecycle transition for {0}")]
    IllegalTransition(ModuleIdentity),
    /// Lookup was attempted on an entry not in `Active` or `HotSwapping`.
    #[error("module not active: {0}")]
    NotActive(ModuleIdentity),
    /// The module is quarantined and not admittable.
    #[error("module quarantined: {0}")]
    ModuleQuarantined(ModuleIdentity),

    // -- Recovery -------------------------------------------------------
    /// Rollback was attempted but no checkpoint exists.
    #[error("no checkpoint available for {0}")]
    NoCheckpoint(ModuleIdentity),
    /// Rollback itself failed.
    #[error("rollback failed for {0}")]
    RollbackFailed(ModuleIdentity),
}

impl HmrError {
    /// The module identity this error concerns, when it concerns exactly one.
    #[must_use]
    pub fn module(&self) -> Option<ModuleIdentity> {
        match self {
            HmrError::UnknownModule(m)
            | HmrError::VersionConflict(m)
            | HmrError::SignatureInvalid(m)
            | HmrError::SymbolUnresolved { module: m, .. }
            | HmrError::LayoutMismatch(m)
            | HmrError::SelfCheckFailed(m)
            | HmrError::LoadTimeout(m)
            | HmrError::AbiIncompatible(m)
            | HmrError::CapabilityEscalation(m)
            | HmrError::UpdateInFlight(m)
            | HmrError::NoUpdate(m)
            | HmrError::Corrupted(m)
            | HmrError::NotAdmitted(m)
            | HmrError::BusyUpdate(m)
            | HmrError::PostSwapHookFailed(m)
            | HmrError::OutOfArena(m)
            | HmrError::CapabilityMissing(m)
            | HmrError::BoundsViolation(m)
            | HmrError::QuotaExceeded(m)
            | HmrError::IllegalTransition(m)
            | HmrError::NotActive(m)
            | HmrError::ModuleQuarantined(m)
            | HmrError::NoCheckpoint(m)
            | HmrError::RollbackFailed(m) => Some(*m),
        }
    }

    /// Returns `true` for errors the spec routes to Recovery rather than
    /// back to the caller (post-commit path and sandbox violations,
    /// spec §7 propagation policy).
    #[must_use]
    pub fn routes_to_recovery(&self) -> bool {
        matches!(
            self,
            HmrError::PostSwapHookFailed(_)
                | HmrError::Corrupted(_)
                | HmrError::CapabilityMissing(_)
                | HmrError::BoundsViolation(_)
                | HmrError::QuotaExceeded(_)
        )
    }
}
