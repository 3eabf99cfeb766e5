// SPDX-License-Identifier: Apache-2.0
//! A content-addressed store for compressed chunk bytes.
//!
//! Checkpoints (spec §3) are immutable snapshots of a module's whole chunk
//! set; many checkpoints of a slowly-changing module share most of their
//! chunk bytes. Keying compressed chunk copies by content hash lets
//! `hmr-state` dedup storage across a module's checkpoint history without
//! the checkpoint type itself needing to know about sharing. Mirrors
//! `echo-cas`'s `BlobStore` trait, narrowed to this one dedup use.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A BLAKE3 content hash of a blob stored in a [`ChunkCas`].
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct BlobHash(pub [u8; 32]);

impl std::fmt::Display for BlobHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Computes the content hash of `bytes`.
#[must_use]
pub fn blob_hash(bytes: &[u8]) -> BlobHash {
    BlobHash(*blake3::hash(bytes).as_bytes())
}

/// A content-addressed store for compressed chunk byte blobs.
///
/// `get` returning `None` is not an error — it means not-yet-stored or
/// already garbage collected, matching `echo-cas`'s absence semantics.
pub trait ChunkCas {
    /// Stores `bytes`, returning its content hash. Idempotent.
    fn put(&mut self, bytes: &[u8]) -> BlobHash;
    /// Retrieves a stored blob by hash.
    fn get(&self, hash: &BlobHash) -> Option<Arc<[u8]>>;
    /// Marks `hash` as a retention root, preventing `collect` from evicting it.
    fn pin(&mut self, hash: &BlobHash);
    /// Removes a retention root. No-op if not pinned.
    fn unpin(&mut self, hash: &BlobHash);
    /// Evicts every unpinned blob. Returns the number of blobs removed.
    fn collect(&mut self) -> usize;
}

/// An in-memory [`ChunkCas`], sufficient for a single-process runtime.
#[derive(Default)]
pub struct MemoryChunkCas {
    blobs: HashMap<BlobHash, Arc<[u8]>>,
    pins: HashSet<BlobHash>,
}

impl MemoryChunkCas {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Returns `true` if no blobs are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl ChunkCas for MemoryChunkCas {
    fn put(&mut self, bytes: &[u8]) -> BlobHash {
        let hash = blob_hash(bytes);
        self.blobs.entry(hash).or_insert_with(|| Arc::from(bytes));
        hash
    }

    fn get(&self, hash: &BlobHash) -> Option<Arc<[u8]>> {
        self.blobs.get(hash).cloned()
    }

    fn pin(&mut self, hash: &BlobHash) {
        self.pins.insert(*hash);
    }

    fn unpin(&mut self, hash: &BlobHash) {
        self.pins.remove(hash);
    }

    fn collect(&mut self) -> usize {
        let before = self.blobs.len();
        let pins = &self.pins;
        self.blobs.retain(|hash, _| pins.contains(hash));
        before - self.blobs.len()
    }
}
