// SPDX-License-Identifier: Apache-2.0
//! hmr-registry: the Module Registry (spec §4.A), the Swap Coordinator's
//! atomic hot-swap protocol (spec §4.D), and the Recovery Orchestrator's
//! rollback → quarantine → escalate ladder (spec §4.H).
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

mod entry;
mod recovery;
mod registry;
mod swap;

pub use entry::RegistryEntry;
/// Runs the rollback → quarantine → escalate recovery ladder (spec §4.H).
pub use recovery::RecoveryOrchestrator;
pub use registry::Registry;
/// Runs the eight-step atomic hot-swap protocol (spec §4.D).
pub use swap::attempt_swap;
