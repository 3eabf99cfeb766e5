// SPDX-License-Identifier: Apache-2.0
//! The basic unit of module state (spec §4.C).

use hmr_cas::crc64;

/// Identifies one chunk within a module's state. Stable across checkpoints;
/// a module's chunk layout (count, size, id assignment) is declared at
/// registration and does not change across a hot swap unless the candidate's
/// migration explicitly re-chunks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ChunkId(pub u64);

/// A fixed-size byte region of module state plus its checksum.
///
/// Compression is lazy: a chunk may be holding compressed bytes
/// (`compressed == true`) and is decompressed transparently on the next
/// write or read that needs the raw form (spec §4.C compression contract).
#[derive(Clone, Debug)]
pub struct Chunk {
    bytes: Vec<u8>,
    checksum: u64,
    compressed: bool,
}

impl Chunk {
    /// Creates a chunk from raw bytes, computing its checksum.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        let checksum = crc64(&bytes);
        Self {
            bytes,
            checksum,
            compressed: false,
        }
    }

    /// The chunk's raw byte length. Panics-free: returns the length of the
    /// stored representation, which may be the compressed length while
    /// [`Chunk::is_compressed`] is `true`.
    #[must_use]
    pub fn stored_len(&self) -> usize {
        self.bytes.len()
    }

    /// The checksum computed over the chunk's raw (uncompressed) bytes at
    /// the time it was last written.
    #[must_use]
    pub fn checksum(&self) -> u64 {
        self.checksum
    }

    /// Returns `true` if the chunk is currently holding a compressed copy.
    #[must_use]
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Raw bytes, decompressing in place first if needed.
    pub fn raw_bytes(&mut self) -> Result<&[u8], hmr_cas::DecompressError> {
        if self.compressed {
            let restored = hmr_cas::decompress(&self.bytes)?;
            self.bytes = restored;
            self.compressed = false;
        }
        Ok(&self.bytes)
    }

    /// Replaces the chunk's raw bytes, recomputing its checksum and clearing
    /// any compressed flag.
    pub fn set_raw_bytes(&mut self, bytes: Vec<u8>) {
        self.checksum = crc64(&bytes);
        self.bytes = bytes;
        self.compressed = false;
    }

    /// Compresses the chunk's stored bytes in place. No-op if already
    /// compressed. The checksum continues to describe the raw bytes so
    /// validation (spec §4.C) does not need to decompress to check
    /// integrity of already-compressed chunks at rest.
    pub fn compress(&mut self) -> Result<(), hmr_cas::DecompressError> {
        if self.compressed {
            return Ok(());
        }
        self.raw_bytes()?;
        self.bytes = hmr_cas::compress(&self.bytes);
        self.compressed = true;
        Ok(())
    }

    /// Recomputes the checksum over the chunk's current raw bytes and
    /// compares it with the stored checksum (spec §4.C validation).
    pub fn validate(&mut self) -> Result<bool, hmr_cas::DecompressError> {
        let stored = self.checksum;
        let raw = self.raw_bytes()?;
        Ok(crc64(raw) == stored)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn compress_then_raw_bytes_round_trips() {
        let mut chunk = Chunk::new(vec![7u8; 256]);
        let original_checksum = chunk.checksum();
        chunk.compress().expect("compress");
        assert!(chunk.is_compressed());
        let raw = chunk.raw_bytes().expect("decompress").to_vec();
        assert_eq!(raw, vec![7u8; 256]);
        assert_eq!(chunk.checksum(), original_checksum);
    }

    #[test]
    fn validate_detects_corruption() {
        let mut chunk = Chunk::new(vec![1, 2, 3, 4]);
        assert!(chunk.validate().expect("validate"));
        chunk.bytes[0] = 0xff;
        assert!(!chunk.validate().expect("validate"));
    }

    #[test]
    fn set_raw_bytes_updates_checksum() {
        let mut chunk = Chunk::new(vec![0u8; 8]);
        chunk.set_raw_bytes(vec![9u8; 8]);
        assert!(chunk.validate().expect("validate"));
    }
}
