// SPDX-License-Identifier: Apache-2.0
//! hmr-state: per-module chunked state, the update-token protocol,
//! dirty-block diffing, checkpoint/rollback, validation, and the
//! capability-checked state accessor (spec §4.C, §4.F).
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

mod accessor;
mod checkpoint;
mod chunk;
mod diff;
mod error;
mod retention;
mod state;
mod update;

/// The capability- and bounds-checked state accessor.
pub use accessor::StateAccessor;
/// Checkpoint creation and rollback.
pub use checkpoint::{create_checkpoint, rollback, Checkpoint};
/// The basic chunk type.
pub use chunk::{Chunk, ChunkId};
/// 64-byte dirty-block diffing.
pub use diff::{apply_diff, diff_chunk, ChunkDiff, DirtyBlock, BLOCK_SIZE};
/// `hmr-state`-local error type.
pub use error::StateError;
/// Version-history retention.
pub use retention::{RetentionPolicy, VersionHistory};
/// Per-module chunked state.
pub use state::{ChunkValidation, ModuleState};
/// The begin-update/write-chunk/commit-update token.
pub use update::UpdateToken;
