// SPDX-License-Identifier: Apache-2.0
//! State Manager error type, converted to `HmrError` at the public boundary.

use hmr_types::{HmrError, ModuleIdentity};
use thiserror::Error;

use crate::chunk::ChunkId;

/// Errors raised by `hmr-state` operations (spec §4.C).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// A second `begin-update` was attempted before the first committed.
    #[error("update already in flight for {0}")]
    UpdateInFlight(ModuleIdentity),
    /// `commit-update` was called without a preceding `begin-update`.
    #[error("no update in flight for {0}")]
    NoUpdate(ModuleIdentity),
    /// A `write-chunk` referenced a chunk the module does not own.
    #[error("unknown chunk {1:?} for {0}")]
    UnknownChunk(ModuleIdentity, ChunkId),
    /// A chunk's checksum did not match its bytes and no backup exists.
    #[error("corrupted chunk in {0}")]
    Corrupted(ModuleIdentity),
    /// A checkpoint could not be created because an update token is held.
    #[error("module busy with an update: {0}")]
    BusyUpdate(ModuleIdentity),
    /// Rollback was attempted but no checkpoint exists.
    #[error("no checkpoint available for {0}")]
    NoCheckpoint(ModuleIdentity),
    /// A checkpoint's chunk bytes could not be restored.
    #[error("rollback failed for {0}")]
    RollbackFailed(ModuleIdentity),
    /// A (de)compression pass failed.
    #[error("decompression failed for {0}: {1}")]
    CompressionFailed(ModuleIdentity, hmr_cas::DecompressError),
}

impl From<StateError> for HmrError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::UpdateInFlight(m) => HmrError::UpdateInFlight(m),
            StateError::NoUpdate(m) => HmrError::NoUpdate(m),
            StateError::UnknownChunk(m, _) => HmrError::BoundsViolation(m),
            StateError::Corrupted(m) | StateError::CompressionFailed(m, _) => {
                HmrError::Corrupted(m)
            }
            StateError::BusyUpdate(m) => HmrError::BusyUpdate(m),
            StateError::NoCheckpoint(m) => HmrError::NoCheckpoint(m),
            StateError::RollbackFailed(m) => HmrError::RollbackFailed(m),
        }
    }
}
