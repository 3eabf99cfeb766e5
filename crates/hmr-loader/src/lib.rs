// SPDX-License-Identifier: Apache-2.0
//! hmr-loader: artifact verification, symbol resolution, and `Loaded`-state
//! handle construction for the HMR Module Loader (spec §4.B). Pure with
//! respect to running modules — registry mutation happens in `hmr-registry`.
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

mod error;
mod handle;
mod loader;
mod signature;
mod symbols;

/// Loader-local error type.
pub use error::LoadError;
/// The `Loaded`-state handle produced by a successful load.
pub use handle::ModuleHandle;
/// The loader itself.
pub use loader::{Loader, SelfCheck};
/// Pluggable signature verification.
pub use signature::{Blake3KeyedVerifier, NullVerifier, SignatureVerifier};
/// Exported/imported symbol tables.
pub use symbols::SymbolTable;
