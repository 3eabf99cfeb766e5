// SPDX-License-Identifier: Apache-2.0
//! hmr-cas: content-addressed chunk storage, CRC64 checksums, and the
//! chunk compressor underlying `hmr-state`'s compression and deduplication
//! (spec §4.C).
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::use_self,
    clippy::multiple_crate_versions
)]

mod cas;
mod compress;
mod crc64;

/// Content-addressed store for compressed chunk blobs.
pub use cas::{blob_hash, BlobHash, ChunkCas, MemoryChunkCas};
/// The LZ-style chunk compressor.
pub use compress::{compress, decompress, DecompressError};
/// CRC64 chunk checksum.
pub use crc64::crc64;
