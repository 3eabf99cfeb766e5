// SPDX-License-Identifier: Apache-2.0
//! hmr-scheduler: the Frame Scheduler (spec §4.E) — accessor reference
//! counting, per-frame HMR budget accounting, and swap admission.
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
mod budget;
mod scheduler;
mod swap;

/// Accessor reference counting.
pub use accessor::{AccessorCounter, AccessorGuard};
/// Per-frame HMR budget accounting.
pub use budget::FrameBudget;
/// The frame scheduler itself.
pub use scheduler::{AdmittedWindow, FrameScheduler};
/// Swap admission requests and bounded backoff.
pub use swap::{BackoffTracker, ResourceProjection, SwapRequest, MAX_BACKOFF_FRAMES, SAFETY_MARGIN_NS};
