// SPDX-License-Identifier: Apache-2.0
//! hmr-sandbox: per-module arenas, capability enforcement, and violation
//! tracking (spec §4.F). Bounds-checking of chunk accesses lives in
//! `hmr-state`, which owns chunk layout; this crate supplies the arena
//! capacity and capability primitives that check draws against.
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

mod arena;
mod capability;
mod violation;

/// Per-module bounded arena allocation.
pub use arena::{ArenaBlock, GlobalArenaPool, ModuleArena};
/// Capability enforcement against a module's granted `CapabilitySet`.
pub use capability::CapabilityGuard;
/// Sandbox violation counting and threshold tripping.
pub use violation::ViolationTracker;
