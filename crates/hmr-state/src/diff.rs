// SPDX-License-Identifier: Apache-2.0
//! 64-byte-wide XOR dirty-block diffing (spec §4.C).
//!
//! Diff generation is deterministic and order-independent: it only compares
//! two byte slices block by block, with no dependency on prior diff state,
//! so it is safe to run on any snapshot pair.

use crate::chunk::ChunkId;

/// Width of one dirty-block comparison window.
pub const BLOCK_SIZE: usize = 64;

/// One changed region within a chunk: a byte offset and the new bytes that
/// should replace the bytes at that offset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirtyBlock {
    /// Byte offset within the chunk where this block begins.
    pub offset: usize,
    /// The new bytes for this block (length is `BLOCK_SIZE`, except
    /// possibly the final block of a chunk whose length isn't a multiple
    /// of `BLOCK_SIZE`).
    pub bytes: Vec<u8>,
}

/// A diff against one chunk: the chunk it applies to and its changed blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkDiff {
    /// The chunk this diff applies to.
    pub chunk_id: ChunkId,
    /// Changed regions, in ascending offset order.
    pub blocks: Vec<DirtyBlock>,
}

/// Compares `before` and `after` (equal-length raw chunk bytes) in
/// `BLOCK_SIZE`-wide windows and returns the blocks that differ.
///
/// Panics-free on length mismatch: the shorter length is used for the
/// compared prefix, and any trailing bytes in the longer buffer are
/// reported as one final dirty block covering the length change.
#[must_use]
pub fn diff_chunk(chunk_id: ChunkId, before: &[u8], after: &[u8]) -> ChunkDiff {
    let compared = before.len().min(after.len());
    let mut blocks = Vec::new();

    let mut offset = 0;
    while offset < compared {
        let end = (offset + BLOCK_SIZE).min(compared);
        let window_before = &before[offset..end];
        let window_after = &after[offset..end];
        if window_before != window_after {
            blocks.push(DirtyBlock {
                offset,
                bytes: window_after.to_vec(),
            });
        }
        offset = end;
    }

    if after.len() > compared {
        blocks.push(DirtyBlock {
            offset: compared,
            bytes: after[compared..].to_vec(),
        });
    }

    ChunkDiff { chunk_id, blocks }
}

/// Applies `diff` to `base`, returning the patched bytes. `base` is resized
/// to fit any block whose offset+len extends past its current length (the
/// growth case produced by [`diff_chunk`] when `after` was longer).
#[must_use]
pub fn apply_diff(base: &[u8], diff: &ChunkDiff) -> Vec<u8> {
    let mut result = base.to_vec();
    for block in &diff.blocks {
        let end = block.offset + block.bytes.len();
        if result.len() < end {
            result.resize(end, 0);
        }
        result[block.offset..end].copy_from_slice(&block.bytes);
    }
    result
}
