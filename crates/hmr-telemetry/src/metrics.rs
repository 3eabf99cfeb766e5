// SPDX-License-Identifier: Apache-2.0
//! The fixed metric set sampled once per module per frame (spec §4.G).

/// One frame's worth of per-module metrics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameMetrics {
    /// Time spent in the last `begin-update`..`commit-update` cycle, in ns.
    pub update_latency_ns: u64,
    /// Size of the most recent checkpoint, in bytes.
    pub checkpoint_size_bytes: u64,
    /// Size of the most recent diff, in bytes.
    pub diff_size_bytes: u64,
    /// Time spent validating this module's chunks, in ns.
    pub validation_time_ns: u64,
    /// Live arena bytes at sample time.
    pub memory_in_use_bytes: u64,
    /// Cumulative successful swaps for this module.
    pub swap_count: u64,
    /// Cumulative failed swaps for this module.
    pub swap_failure_count: u64,
    /// Cumulative sandbox capability violations for this module.
    pub capability_violations: u64,
}
