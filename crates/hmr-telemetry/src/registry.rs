// SPDX-License-Identifier: Apache-2.0
//! Per-module telemetry storage, keyed by [`ModuleIdentity`] (spec §4.G).

use std::collections::HashMap;
use std::sync::Mutex;

use hmr_types::ModuleIdentity;

use crate::metrics::FrameMetrics;
use crate::ring::MetricsRing;
use crate::trend::{HealthSignal, TrendEstimator};

struct ModuleTelemetry {
    ring: MetricsRing,
    trend: TrendEstimator,
}

/// Owns one [`MetricsRing`] and one [`TrendEstimator`] per registered module.
pub struct TelemetryRegistry {
    ring_capacity: usize,
    trend_window: usize,
    failure_rate_threshold: f64,
    memory_growth_threshold_bytes: i64,
    modules: Mutex<HashMap<ModuleIdentity, ModuleTelemetry>>,
}

impl TelemetryRegistry {
    /// Creates a registry that lazily allocates per-module storage on first
    /// `record`, sized and thresholded uniformly for every module.
    #[must_use]
    pub fn new(
        ring_capacity: usize,
        trend_window: usize,
        failure_rate_threshold: f64,
        memory_growth_threshold_bytes: i64,
    ) -> Self {
        Self {
            ring_capacity,
            trend_window,
            failure_rate_threshold,
            memory_growth_threshold_bytes,
            modules: Mutex::new(HashMap::new()),
        }
    }

    /// Records a sample for `module`, returning its current health signal.
    pub fn record(&self, module: ModuleIdentity, sample: FrameMetrics) -> HealthSignal {
        let mut modules = self
            .modules
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let entry = modules.entry(module).or_insert_with(|| ModuleTelemetry {
            ring: MetricsRing::new(self.ring_capacity),
            trend: TrendEstimator::new(
                self.trend_window,
                self.failure_rate_threshold,
                self.memory_growth_threshold_bytes,
            ),
        });
        entry.ring.push(sample);
        entry.trend.observe(sample)
    }

    /// Drains every retained sample for `module`, oldest first.
    pub fn drain(&self, module: ModuleIdentity) -> Vec<FrameMetrics> {
        self.modules
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&module)
            .map(|entry| entry.ring.drain())
            .unwrap_or_default()
    }

    /// Returns the most recent sample for `module`, if any.
    #[must_use]
    pub fn latest(&self, module: ModuleIdentity) -> Option<FrameMetrics> {
        self.modules
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&module)
            .and_then(|entry| entry.ring.latest())
    }

    /// Drops all telemetry state for `module`, e.g. once it reaches
    /// `Unloaded`.
    pub fn forget(&self, module: ModuleIdentity) {
        self.modules
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&module);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_isolated_per_module() {
        let registry = TelemetryRegistry::new(4, 4, 1.0, i64::MAX);
        let a = ModuleIdentity::from_name("physics");
        let b = ModuleIdentity::from_name("render");
        registry.record(
            a,
            FrameMetrics {
                swap_count: 1,
                ..FrameMetrics::default()
            },
        );
        registry.record(b, FrameMetrics::default());
        assert_eq!(registry.latest(a).map(|s| s.swap_count), Some(1));
        assert_eq!(registry.latest(b).map(|s| s.swap_count), Some(0));
    }

    #[test]
    fn forget_clears_module_state() {
        let registry = TelemetryRegistry::new(4, 4, 1.0, i64::MAX);
        let module = ModuleIdentity::from_name("physics");
        registry.record(module, FrameMetrics::default());
        registry.forget(module);
        assert!(registry.latest(module).is_none());
    }

    #[test]
    fn record_returns_current_health_signal() {
        let registry = TelemetryRegistry::new(4, 2, 0.5, i64::MAX);
        let module = ModuleIdentity::from_name("physics");
        registry.record(
            module,
            FrameMetrics {
                swap_failure_count: 1,
                ..FrameMetrics::default()
            },
        );
        let signal = registry.record(
            module,
            FrameMetrics {
                swap_failure_count: 1,
                ..FrameMetrics::default()
            },
        );
        assert!(signal.failure_rate_degraded);
    }
}
