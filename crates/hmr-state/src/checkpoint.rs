// SPDX-License-Identifier: Apache-2.0
//! Checkpoint creation and rollback (spec §4.C, §4.D step 2).
//!
//! A checkpoint stores every chunk's compressed bytes in a content-addressed
//! [`hmr_cas::ChunkCas`], keyed by [`ChunkId`]. Compression lets slowly
//! changing modules share most of their checkpoint history's storage, since
//! identical chunk bytes across checkpoints hash to the same blob.

use std::collections::BTreeMap;

use hmr_cas::{BlobHash, ChunkCas};
use hmr_types::{ModuleIdentity, VersionNumber};

use crate::chunk::ChunkId;
use crate::error::StateError;
use crate::state::ModuleState;

/// An immutable snapshot of a module's whole chunk set at a version.
#[derive(Clone, Debug)]
pub struct Checkpoint {
    identity: ModuleIdentity,
    version: VersionNumber,
    chunk_blobs: BTreeMap<ChunkId, BlobHash>,
}

impl Checkpoint {
    /// The module this checkpoint was taken from.
    #[must_use]
    pub fn identity(&self) -> ModuleIdentity {
        self.identity
    }

    /// The version the module was at when this checkpoint was taken.
    #[must_use]
    pub fn version(&self) -> VersionNumber {
        self.version
    }

    /// The chunk-to-blob mapping this checkpoint records.
    #[must_use]
    pub fn chunk_blobs(&self) -> &BTreeMap<ChunkId, BlobHash> {
        &self.chunk_blobs
    }
}

/// Creates a checkpoint of `state` at `version`, storing each chunk's raw
/// bytes (compressed) into `cas` and pinning the resulting blobs so a later
/// `collect` cannot evict them out from under a pending rollback.
///
/// Fails with `BusyUpdate` if `state` currently holds an update token (spec
/// §4.D step 2: checkpoint creation is refused while an update is in flight).
pub fn create_checkpoint(
    state: &mut ModuleState,
    version: VersionNumber,
    cas: &mut dyn ChunkCas,
) -> Result<Checkpoint, StateError> {
    if state.has_pending_update() {
        return Err(StateError::BusyUpdate(state.identity()));
    }

    let identity = state.identity();
    let mut chunk_blobs = BTreeMap::new();
    for (chunk_id, chunk) in state.chunks_mut() {
        let raw = chunk
            .raw_bytes()
            .map_err(|e| StateError::CompressionFailed(identity, e))?;
        let compressed = hmr_cas::compress(raw);
        let hash = cas.put(&compressed);
        cas.pin(&hash);
        chunk_blobs.insert(*chunk_id, hash);
    }

    Ok(Checkpoint {
        identity,
        version,
        chunk_blobs,
    })
}

/// Restores `state` from `checkpoint`, replacing every chunk's bytes with
/// the checkpoint's recorded blob contents.
///
/// Fails with `RollbackFailed` if the checkpoint references a chunk no
/// longer in `state`, or a blob no longer present in `cas`.
pub fn rollback(
    state: &mut ModuleState,
    checkpoint: &Checkpoint,
    cas: &dyn ChunkCas,
) -> Result<(), StateError> {
    let identity = state.identity();
    for (chunk_id, hash) in checkpoint.chunk_blobs() {
        let compressed = cas
            .get(hash)
            .ok_or(StateError::RollbackFailed(identity))?;
        let raw = hmr_cas::decompress(&compressed)
            .map_err(|_| StateError::RollbackFailed(identity))?;
        let chunk = state
            .chunks_mut()
            .get_mut(chunk_id)
            .ok_or(StateError::RollbackFailed(identity))?;
        chunk.set_raw_bytes(raw);
    }
    Ok(())
}
