// SPDX-License-Identifier: Apache-2.0
//! hmr-telemetry: Health & Telemetry (spec §4.G) — a fixed-capacity
//! per-module metrics ring drained by external collectors, plus a
//! bounded-window trend estimator flagging health-degrading modules for
//! the Recovery Orchestrator (§4.H).
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

mod metrics;
mod registry;
mod ring;
mod trend;

/// The fixed per-module metric set sampled once per frame.
pub use metrics::FrameMetrics;
/// Per-module metrics ring storage keyed by module identity.
pub use registry::TelemetryRegistry;
/// The fixed-capacity metrics ring itself.
pub use ring::MetricsRing;
/// Bounded-window trend estimation and its health signal.
pub use trend::{HealthSignal, TrendEstimator};
