// SPDX-License-Identifier: Apache-2.0
//! The begin-update/write-chunk/commit-update token protocol (spec §4.C).

use std::collections::BTreeMap;

use crate::chunk::ChunkId;

/// An exclusive update token held by a module between `begin-update` and
/// `commit-update`. Writes made while the token is held go into a staging
/// area and are not visible to readers of committed state until commit.
#[derive(Debug, Default)]
pub struct UpdateToken {
    staged: BTreeMap<ChunkId, Vec<u8>>,
    dirty: Vec<ChunkId>,
}

impl UpdateToken {
    /// Stages a write to `chunk_id`. Marks the chunk dirty the first time it
    /// is written under this token; subsequent writes replace the staged
    /// bytes without duplicating the dirty mark.
    pub fn write_chunk(&mut self, chunk_id: ChunkId, bytes: Vec<u8>) {
        if self.staged.insert(chunk_id, bytes).is_none() {
            self.dirty.push(chunk_id);
        }
    }

    /// Chunk ids written under this token, in first-write order.
    #[must_use]
    pub fn dirty_chunks(&self) -> &[ChunkId] {
        &self.dirty
    }

    /// Consumes the token, returning its staged writes for the caller to
    /// publish atomically.
    #[must_use]
    pub fn into_staged(self) -> BTreeMap<ChunkId, Vec<u8>> {
        self.staged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_write_does_not_duplicate_dirty_mark() {
        let mut token = UpdateToken::default();
        token.write_chunk(ChunkId(1), vec![1]);
        token.write_chunk(ChunkId(1), vec![2]);
        assert_eq!(token.dirty_chunks(), &[ChunkId(1)]);
        assert_eq!(token.into_staged()[&ChunkId(1)], vec![2]);
    }

    #[test]
    fn multiple_chunks_tracked_independently() {
        let mut token = UpdateToken::default();
        token.write_chunk(ChunkId(1), vec![1]);
        token.write_chunk(ChunkId(2), vec![2]);
        assert_eq!(token.dirty_chunks().len(), 2);
    }
}
