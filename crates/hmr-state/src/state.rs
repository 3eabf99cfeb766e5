// SPDX-License-Identifier: Apache-2.0
//! Per-module chunked state (spec §4.C).

use std::collections::BTreeMap;

use hmr_types::ModuleIdentity;

use crate::chunk::{Chunk, ChunkId};
use crate::error::StateError;
use crate::update::UpdateToken;

/// Outcome of [`ModuleState::validate`] for one chunk.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ChunkValidation {
    /// The chunk this result concerns.
    pub chunk_id: ChunkId,
    /// `true` if the chunk's checksum matched its stored bytes.
    pub ok: bool,
}

/// A module's full chunked state plus the exclusive update token, if any is
/// currently held (spec §4.C: begin-update/write-chunk/commit-update).
pub struct ModuleState {
    identity: ModuleIdentity,
    chunks: BTreeMap<ChunkId, Chunk>,
    pending_update: Option<UpdateToken>,
}

impl ModuleState {
    /// Creates module state from an initial chunk layout.
    #[must_use]
    pub fn new(identity: ModuleIdentity, chunks: BTreeMap<ChunkId, Chunk>) -> Self {
        Self {
            identity,
            chunks,
            pending_update: None,
        }
    }

    /// The module this state belongs to.
    #[must_use]
    pub fn identity(&self) -> ModuleIdentity {
        self.identity
    }

    /// Read-only access to the committed chunk set.
    #[must_use]
    pub fn chunks(&self) -> &BTreeMap<ChunkId, Chunk> {
        &self.chunks
    }

    /// Mutable access to the committed chunk set, for validation and
    /// compression passes that do not go through the update-token protocol.
    pub fn chunks_mut(&mut self) -> &mut BTreeMap<ChunkId, Chunk> {
        &mut self.chunks
    }

    /// Returns `true` if an update token is currently held.
    #[must_use]
    pub fn has_pending_update(&self) -> bool {
        self.pending_update.is_some()
    }

    /// Begins an exclusive update. Fails with `UpdateInFlight` if a token is
    /// already held.
    pub fn begin_update(&mut self) -> Result<(), StateError> {
        if self.pending_update.is_some() {
            return Err(StateError::UpdateInFlight(self.identity));
        }
        self.pending_update = Some(UpdateToken::default());
        Ok(())
    }

    /// Stages a write to `chunk_id` under the held update token.
    ///
    /// Fails with `NoUpdate` if no token is held, or `UnknownChunk` if the
    /// module does not own `chunk_id`.
    pub fn write_chunk(&mut self, chunk_id: ChunkId, bytes: Vec<u8>) -> Result<(), StateError> {
        if !self.chunks.contains_key(&chunk_id) {
            return Err(StateError::UnknownChunk(self.identity, chunk_id));
        }
        let token = self
            .pending_update
            .as_mut()
            .ok_or(StateError::NoUpdate(self.identity))?;
        token.write_chunk(chunk_id, bytes);
        Ok(())
    }

    /// Atomically publishes every staged write and releases the token,
    /// refreshing each written chunk's checksum. Returns the chunk ids that
    /// were written.
    ///
    /// Fails with `NoUpdate` if no token is held.
    pub fn commit_update(&mut self) -> Result<Vec<ChunkId>, StateError> {
        let token = self
            .pending_update
            .take()
            .ok_or(StateError::NoUpdate(self.identity))?;
        let written: Vec<ChunkId> = token.dirty_chunks().to_vec();
        for (chunk_id, bytes) in token.into_staged() {
            if let Some(chunk) = self.chunks.get_mut(&chunk_id) {
                chunk.set_raw_bytes(bytes);
            }
        }
        Ok(written)
    }

    /// Recomputes the checksum of every chunk and compares it with the
    /// stored checksum (spec §4.C validation). Decompression failures are
    /// reported as a failing validation rather than propagated, matching
    /// the spec's "mark Corrupted" outcome for any integrity failure.
    pub fn validate(&mut self) -> Vec<ChunkValidation> {
        self.chunks
            .iter_mut()
            .map(|(chunk_id, chunk)| ChunkValidation {
                chunk_id: *chunk_id,
                ok: chunk.validate().unwrap_or(false),
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sample_state() -> ModuleState {
        let mut chunks = BTreeMap::new();
        chunks.insert(ChunkId(0), Chunk::new(vec![0u8; 64]));
        chunks.insert(ChunkId(1), Chunk::new(vec![1u8; 64]));
        ModuleState::new(ModuleIdentity::from_name("physics"), chunks)
    }

    #[test]
    fn second_begin_update_is_rejected() {
        let mut state = sample_state();
        state.begin_update().expect("first begin");
        assert!(matches!(
            state.begin_update(),
            Err(StateError::UpdateInFlight(_))
        ));
    }

    #[test]
    fn commit_without_begin_is_rejected() {
        let mut state = sample_state();
        assert!(matches!(
            state.commit_update(),
            Err(StateError::NoUpdate(_))
        ));
    }

    #[test]
    fn write_chunk_without_begin_is_rejected() {
        let mut state = sample_state();
        assert!(matches!(
            state.write_chunk(ChunkId(0), vec![9u8; 64]),
            Err(StateError::NoUpdate(_))
        ));
    }

    #[test]
    fn write_to_unknown_chunk_is_rejected() {
        let mut state = sample_state();
        state.begin_update().expect("begin");
        assert!(matches!(
            state.write_chunk(ChunkId(99), vec![9u8; 64]),
            Err(StateError::UnknownChunk(_, _))
        ));
    }

    #[test]
    fn commit_publishes_staged_writes() {
        let mut state = sample_state();
        state.begin_update().expect("begin");
        state
            .write_chunk(ChunkId(0), vec![7u8; 64])
            .expect("write");
        let written = state.commit_update().expect("commit");
        assert_eq!(written, vec![ChunkId(0)]);
        assert!(!state.has_pending_update());
        let checks = state.validate();
        assert!(checks.iter().all(|c| c.ok));
    }

    #[test]
    fn fresh_state_validates_clean() {
        let mut state = sample_state();
        assert!(state.validate().iter().all(|c| c.ok));
    }
}
