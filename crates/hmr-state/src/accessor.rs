// SPDX-License-Identifier: Apache-2.0
//! The capability-checked, bounds-checked state accessor (spec §4.F).
//!
//! Every touch a module makes to its own state goes through a
//! [`StateAccessor`], which checks the active module's granted capability
//! before the operation runs and bounds-checks the access against both the
//! module's arena limit and the target chunk's declared length. An access
//! that escapes either bound is reported as `HmrError::BoundsViolation`.

use hmr_sandbox::{CapabilityGuard, ModuleArena};
use hmr_types::{Capability, HmrError};

use crate::chunk::ChunkId;
use crate::state::ModuleState;

/// A capability- and bounds-checked view onto one module's state.
pub struct StateAccessor<'a> {
    state: &'a mut ModuleState,
    capabilities: &'a CapabilityGuard,
    arena: &'a ModuleArena,
}

impl<'a> StateAccessor<'a> {
    /// Creates an accessor scoping `state` to the capability and arena
    /// checks in `capabilities`/`arena`. The three must belong to the same
    /// module; this is a caller invariant, not something this type checks.
    #[must_use]
    pub fn new(
        state: &'a mut ModuleState,
        capabilities: &'a CapabilityGuard,
        arena: &'a ModuleArena,
    ) -> Self {
        Self {
            state,
            capabilities,
            arena,
        }
    }

    fn check_bounds(&self, chunk_id: ChunkId, offset: usize, len: usize) -> Result<(), HmrError> {
        let chunk_len = self
            .state
            .chunks()
            .get(&chunk_id)
            .map(crate::chunk::Chunk::stored_len);
        let Some(chunk_len) = chunk_len else {
            return Err(HmrError::BoundsViolation(self.state.identity()));
        };
        let end = offset
            .checked_add(len)
            .ok_or_else(|| HmrError::BoundsViolation(self.state.identity()))?;
        if end > chunk_len {
            return Err(HmrError::BoundsViolation(self.state.identity()));
        }
        if len as u64 > self.arena.memory_limit() {
            return Err(HmrError::BoundsViolation(self.state.identity()));
        }
        Ok(())
    }

    /// Reads `len` bytes at `offset` from `chunk_id`, checking `ReadState`
    /// and the access's bounds first.
    pub fn read(&mut self, chunk_id: ChunkId, offset: usize, len: usize) -> Result<Vec<u8>, HmrError> {
        self.capabilities.require(Capability::ReadState)?;
        self.check_bounds(chunk_id, offset, len)?;
        let identity = self.state.identity();
        let chunk = self
            .state
            .chunks_mut()
            .get_mut(&chunk_id)
            .ok_or(HmrError::BoundsViolation(identity))?;
        let raw = chunk
            .raw_bytes()
            .map_err(|_| HmrError::Corrupted(identity))?;
        Ok(raw[offset..offset + len].to_vec())
    }

    /// Writes `bytes` at `offset` into `chunk_id`'s staged update,
    /// checking `WriteState` and the access's bounds against the *current*
    /// committed length first.
    ///
    /// Requires an update token to already be held via
    /// [`ModuleState::begin_update`]; this method only stages the write.
    pub fn write(
        &mut self,
        chunk_id: ChunkId,
        offset: usize,
        bytes: &[u8],
    ) -> Result<(), HmrError> {
        self.capabilities.require(Capability::WriteState)?;
        self.check_bounds(chunk_id, offset, bytes.len())?;
        let identity = self.state.identity();
        let current = self
            .state
            .chunks_mut()
            .get_mut(&chunk_id)
            .ok_or(HmrError::BoundsViolation(identity))?
            .raw_bytes()
            .map_err(|_| HmrError::Corrupted(identity))?
            .to_vec();
        let mut patched = current;
        patched[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.state
            .write_chunk(chunk_id, patched)
            .map_err(HmrError::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::chunk::Chunk;
    use hmr_sandbox::GlobalArenaPool;
    use hmr_types::{CapabilitySet, ModuleIdentity};
    use std::collections::BTreeMap;

    fn sample() -> (ModuleState, CapabilityGuard, ModuleArena) {
        let identity = ModuleIdentity::from_name("physics");
        let mut chunks = BTreeMap::new();
        chunks.insert(ChunkId(0), Chunk::new(vec![1u8; 64]));
        let state = ModuleState::new(identity, chunks);
        let guard = CapabilityGuard::new(
            identity,
            CapabilitySet::from_iter([Capability::ReadState, Capability::WriteState]),
        );
        let arena = ModuleArena::new(identity, 4096, GlobalArenaPool::new());
        (state, guard, arena)
    }

    #[test]
    fn read_within_bounds_succeeds() {
        let (mut state, guard, arena) = sample();
        let mut accessor = StateAccessor::new(&mut state, &guard, &arena);
        let bytes = accessor.read(ChunkId(0), 0, 16).expect("read");
        assert_eq!(bytes, vec![1u8; 16]);
    }

    #[test]
    fn read_past_chunk_end_is_bounds_violation() {
        let (mut state, guard, arena) = sample();
        let mut accessor = StateAccessor::new(&mut state, &guard, &arena);
        assert!(matches!(
            accessor.read(ChunkId(0), 60, 16),
            Err(HmrError::BoundsViolation(_))
        ));
    }

    #[test]
    fn write_without_capability_is_rejected() {
        let identity = ModuleIdentity::from_name("physics");
        let mut chunks = BTreeMap::new();
        chunks.insert(ChunkId(0), Chunk::new(vec![1u8; 64]));
        let mut state = ModuleState::new(identity, chunks);
        let guard = CapabilityGuard::new(identity, CapabilitySet::NONE);
        let arena = ModuleArena::new(identity, 4096, GlobalArenaPool::new());
        let mut accessor = StateAccessor::new(&mut state, &guard, &arena);
        assert!(matches!(
            accessor.write(ChunkId(0), 0, &[9u8; 4]),
            Err(HmrError::CapabilityMissing(_))
        ));
    }

    #[test]
    fn write_within_bounds_stages_and_commits() {
        let (mut state, guard, arena) = sample();
        state.begin_update().expect("begin");
        {
            let mut accessor = StateAccessor::new(&mut state, &guard, &arena);
            accessor.write(ChunkId(0), 0, &[9u8; 4]).expect("write");
        }
        state.commit_update().expect("commit");
        assert_eq!(state.chunks()[&ChunkId(0)].checksum(), {
            let mut expected = vec![1u8; 64];
            expected[0..4].copy_from_slice(&[9u8; 4]);
            hmr_cas::crc64(&expected)
        });
    }
}
