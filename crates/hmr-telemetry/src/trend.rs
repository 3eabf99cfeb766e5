// SPDX-License-Identifier: Apache-2.0
//! A bounded-window trend estimator over a module's metrics history
//! (spec §4.G).

use std::collections::VecDeque;

use crate::metrics::FrameMetrics;

/// A health-degrading signal raised when a module's moving averages cross
/// a configured threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HealthSignal {
    /// `true` if the failure-rate threshold was crossed this window.
    pub failure_rate_degraded: bool,
    /// `true` if the memory-growth threshold was crossed this window.
    pub memory_growth_degraded: bool,
}

impl HealthSignal {
    /// `true` if either signal is degraded.
    #[must_use]
    pub fn is_degrading(self) -> bool {
        self.failure_rate_degraded || self.memory_growth_degraded
    }
}

/// Computes moving averages of swap-failure rate and memory growth over a
/// bounded trailing window of samples.
pub struct TrendEstimator {
    window: VecDeque<FrameMetrics>,
    window_size: usize,
    failure_rate_threshold: f64,
    memory_growth_threshold_bytes: i64,
}

impl TrendEstimator {
    /// Creates an estimator over the last `window_size` samples.
    ///
    /// `failure_rate_threshold` is a fraction (e.g. `0.1` for 10% of frames
    /// in the window reporting at least one swap failure).
    /// `memory_growth_threshold_bytes` is the maximum tolerated increase in
    /// `memory_in_use_bytes` from the oldest to the newest sample.
    #[must_use]
    pub fn new(
        window_size: usize,
        failure_rate_threshold: f64,
        memory_growth_threshold_bytes: i64,
    ) -> Self {
        Self {
            window: VecDeque::with_capacity(window_size.max(1)),
            window_size: window_size.max(1),
            failure_rate_threshold,
            memory_growth_threshold_bytes,
        }
    }

    /// Feeds one more sample into the window, evaluating the current
    /// health signal.
    pub fn observe(&mut self, sample: FrameMetrics) -> HealthSignal {
        self.window.push_back(sample);
        while self.window.len() > self.window_size {
            self.window.pop_front();
        }

        let failing = self
            .window
            .iter()
            .filter(|s| s.swap_failure_count > 0)
            .count();
        #[allow(clippy::cast_precision_loss)]
        let failure_rate = failing as f64 / self.window.len() as f64;

        let memory_growth = match (self.window.front(), self.window.back()) {
            (Some(first), Some(last)) => {
                i64::try_from(last.memory_in_use_bytes)
                    .unwrap_or(i64::MAX)
                    .saturating_sub(i64::try_from(first.memory_in_use_bytes).unwrap_or(i64::MAX))
            }
            _ => 0,
        };

        HealthSignal {
            failure_rate_degraded: failure_rate >= self.failure_rate_threshold,
            memory_growth_degraded: memory_growth >= self.memory_growth_threshold_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(memory: u64, failed: u64) -> FrameMetrics {
        FrameMetrics {
            memory_in_use_bytes: memory,
            swap_failure_count: failed,
            ..FrameMetrics::default()
        }
    }

    #[test]
    fn flags_failure_rate_once_threshold_crossed() {
        let mut estimator = TrendEstimator::new(4, 0.5, i64::MAX);
        estimator.observe(sample(0, 0));
        estimator.observe(sample(0, 1));
        let signal = estimator.observe(sample(0, 1));
        assert!(signal.failure_rate_degraded);
    }

    #[test]
    fn flags_memory_growth_once_threshold_crossed() {
        let mut estimator = TrendEstimator::new(3, 1.0, 1000);
        estimator.observe(sample(1_000, 0));
        let signal = estimator.observe(sample(5_000, 0));
        assert!(signal.memory_growth_degraded);
    }

    #[test]
    fn healthy_trend_raises_no_signal() {
        let mut estimator = TrendEstimator::new(4, 0.5, 1_000_000);
        let signal = estimator.observe(sample(100, 0));
        assert!(!signal.is_degrading());
    }

    #[test]
    fn window_evicts_oldest_sample() {
        let mut estimator = TrendEstimator::new(2, 0.5, i64::MAX);
        estimator.observe(sample(0, 1));
        estimator.observe(sample(0, 0));
        let signal = estimator.observe(sample(0, 0));
        assert!(!signal.failure_rate_degraded);
    }
}
