// SPDX-License-Identifier: Apache-2.0
//! hmr-types: identifiers, version descriptor, capability set, and the
//! unified error taxonomy for the HMR runtime.
//!
//! This crate has no runtime behavior of its own — it is the vocabulary
//! the rest of the workspace (`hmr-state`, `hmr-sandbox`, `hmr-loader`,
//! `hmr-scheduler`, `hmr-telemetry`, `hmr-registry`, `hmr-runtime`) shares.
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

mod capability;
mod descriptor;
mod error;
mod ident;
mod lifecycle;

/// Capability set and its wire-format bitmask.
pub use capability::{Capability, CapabilitySet};
/// The module version descriptor and its wire-format constants.
pub use descriptor::{ResourceLimits, VersionDescriptor, DESCRIPTOR_MAGIC, DESCRIPTOR_VERSION};
/// The unified error taxonomy.
pub use error::HmrError;
/// Identifier and hashing primitives.
pub use ident::{AbiSignature, ContentHash, Hash32, ModuleIdentity, VersionNumber};
/// The module lifecycle state machine.
pub use lifecycle::LifecycleState;
