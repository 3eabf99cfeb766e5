// SPDX-License-Identifier: Apache-2.0
//! Explicit runtime configuration (spec §10.4).
//!
//! A plain struct built via a fluent builder and threaded into
//! [`crate::Runtime::new`] rather than read from a singleton or parsed from
//! the environment, mirroring `rmg-core::sandbox::EchoConfig`'s
//! "constructed by the caller" shape.

use hmr_state::RetentionPolicy;

/// Tunables for one [`crate::Runtime`] instance.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub(crate) frame_budget_ns: u64,
    pub(crate) capability_violation_threshold: u64,
    pub(crate) recovery_cooldown_frames: u64,
    pub(crate) checkpoint_retention: RetentionPolicy,
    pub(crate) telemetry_ring_capacity: usize,
    pub(crate) telemetry_trend_window: usize,
    pub(crate) telemetry_failure_rate_threshold: f64,
    pub(crate) telemetry_memory_growth_threshold_bytes: i64,
    pub(crate) worker_count: Option<usize>,
}

impl RuntimeConfig {
    /// Starts a builder seeded with conservative defaults.
    #[must_use]
    pub fn builder() -> RuntimeConfigBuilder {
        RuntimeConfigBuilder::default()
    }
}

/// Fluent builder for [`RuntimeConfig`].
pub struct RuntimeConfigBuilder {
    frame_budget_ns: u64,
    capability_violation_threshold: u64,
    recovery_cooldown_frames: u64,
    checkpoint_retention: RetentionPolicy,
    telemetry_ring_capacity: usize,
    telemetry_trend_window: usize,
    telemetry_failure_rate_threshold: f64,
    telemetry_memory_growth_threshold_bytes: i64,
    worker_count: Option<usize>,
}

impl Default for RuntimeConfigBuilder {
    fn default() -> Self {
        Self {
            frame_budget_ns: 2_000_000,
            capability_violation_threshold: 3,
            recovery_cooldown_frames: 60,
            checkpoint_retention: RetentionPolicy::KeepLast(8),
            telemetry_ring_capacity: 64,
            telemetry_trend_window: 16,
            telemetry_failure_rate_threshold: 0.25,
            telemetry_memory_growth_threshold_bytes: 64 * 1024 * 1024,
            worker_count: None,
        }
    }
}

impl RuntimeConfigBuilder {
    /// Per-frame nanosecond ceiling the Frame Scheduler admits swaps
    /// against (spec §4.E).
    #[must_use]
    pub fn frame_budget_ns(mut self, ns: u64) -> Self {
        self.frame_budget_ns = ns;
        self
    }

    /// Sandbox violations a module may accrue before Recovery quarantines
    /// it (spec §4.F/§4.H).
    #[must_use]
    pub fn capability_violation_threshold(mut self, threshold: u64) -> Self {
        self.capability_violation_threshold = threshold;
        self
    }

    /// Frames Recovery waits before a quarantined module may be considered
    /// for re-admission.
    #[must_use]
    pub fn recovery_cooldown_frames(mut self, frames: u64) -> Self {
        self.recovery_cooldown_frames = frames;
        self
    }

    /// How many entries a registry entry's version history ring retains.
    #[must_use]
    pub fn checkpoint_retention(mut self, policy: RetentionPolicy) -> Self {
        self.checkpoint_retention = policy;
        self
    }

    /// Capacity of each module's telemetry ring (spec §4.G).
    #[must_use]
    pub fn telemetry_ring_capacity(mut self, capacity: usize) -> Self {
        self.telemetry_ring_capacity = capacity;
        self
    }

    /// Trailing-window size for the telemetry trend estimator.
    #[must_use]
    pub fn telemetry_trend_window(mut self, window: usize) -> Self {
        self.telemetry_trend_window = window;
        self
    }

    /// Fraction of windowed frames with a swap failure that trips the
    /// health-degrading signal.
    #[must_use]
    pub fn telemetry_failure_rate_threshold(mut self, threshold: f64) -> Self {
        self.telemetry_failure_rate_threshold = threshold;
        self
    }

    /// Byte growth across the telemetry trend window that trips the
    /// health-degrading signal.
    #[must_use]
    pub fn telemetry_memory_growth_threshold_bytes(mut self, threshold: i64) -> Self {
        self.telemetry_memory_growth_threshold_bytes = threshold;
        self
    }

    /// Fixes the worker pool's thread count. Leaving this unset falls back
    /// to `WorkerPool::from_environment` at `Runtime::new` time.
    #[must_use]
    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = Some(count);
        self
    }

    /// Finalizes the configuration.
    #[must_use]
    pub fn build(self) -> RuntimeConfig {
        RuntimeConfig {
            frame_budget_ns: self.frame_budget_ns,
            capability_violation_threshold: self.capability_violation_threshold,
            recovery_cooldown_frames: self.recovery_cooldown_frames,
            checkpoint_retention: self.checkpoint_retention,
            telemetry_ring_capacity: self.telemetry_ring_capacity,
            telemetry_trend_window: self.telemetry_trend_window,
            telemetry_failure_rate_threshold: self.telemetry_failure_rate_threshold,
            telemetry_memory_growth_threshold_bytes: self.telemetry_memory_growth_threshold_bytes,
            worker_count: self.worker_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = RuntimeConfig::builder()
            .frame_budget_ns(5_000)
            .capability_violation_threshold(1)
            .worker_count(2)
            .build();
        assert_eq!(config.frame_budget_ns, 5_000);
        assert_eq!(config.capability_violation_threshold, 1);
        assert_eq!(config.worker_count, Some(2));
    }

    #[test]
    fn unset_worker_count_defers_to_environment() {
        let config = RuntimeConfig::builder().build();
        assert_eq!(config.worker_count, None);
    }
}
