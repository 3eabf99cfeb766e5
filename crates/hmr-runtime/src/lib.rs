// SPDX-License-Identifier: Apache-2.0
//! hmr-runtime: the top-level orchestration context (spec §2, §5) — a
//! fixed-size worker pool, an explicit [`RuntimeConfig`], and a [`Runtime`]
//! that drives the frame loop and the administrative control surface of
//! spec §6 over every other `hmr-*` component.
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

mod config;
mod module;
mod runtime;
mod worker_pool;

/// Explicit, builder-constructed runtime tunables (spec §10.4).
pub use config::{RuntimeConfig, RuntimeConfigBuilder};
/// Per-module state a registered module needs outside its registry entry.
pub use module::ModuleRuntimeState;
/// The top-level orchestration context.
pub use runtime::Runtime;
/// A fixed-size work-stealing thread pool for one frame's jobs.
pub use worker_pool::WorkerPool;

/// Installs a `tracing-subscriber` fmt layer at `INFO` as this process's
/// global default subscriber.
///
/// Mirrors `jitosd`'s subscriber install (`FmtSubscriber::builder()
/// .with_max_level(Level::INFO).finish()` then
/// `tracing::subscriber::set_global_default`), minus the async runtime that
/// binary wraps it in — `hmr-runtime` has no async surface of its own. This
/// is the only crate in the workspace that installs a subscriber; every
/// other crate just emits `tracing` events against whatever the embedding
/// binary installs (spec §10.2).
///
/// # Errors
///
/// Returns the underlying error if a global subscriber is already set.
pub fn install_tracing() -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}
