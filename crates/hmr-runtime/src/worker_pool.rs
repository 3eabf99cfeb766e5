// SPDX-License-Identifier: Apache-2.0
//! A fixed-size worker pool driving one frame's jobs to completion (spec
//! §5: "the number of workers is fixed at initialization").
//!
//! Generalizes `warp-core`'s `boaw::execute_parallel_sharded` work-stealing
//! loop from rewrite-rule `ExecItem`s to arbitrary frame-scoped closures:
//! workers claim jobs one at a time from a shared atomic cursor rather than
//! each owning a fixed slice, so a slow job on one worker doesn't leave
//! others idle.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Environment variable overriding the worker count, mirroring
/// `warp-core::engine_impl::default_worker_count`'s `ECHO_WORKERS`.
const WORKER_COUNT_ENV: &str = "HMR_WORKERS";

/// Chooses a worker count: `HMR_WORKERS` if set and valid, else
/// `available_parallelism()`.
#[must_use]
fn default_worker_count() -> usize {
    if let Ok(val) = std::env::var(WORKER_COUNT_ENV) {
        if let Ok(n) = val.parse::<usize>() {
            return n.max(1);
        }
    }
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
}

/// A fixed-size thread pool for running one frame's worth of independent
/// per-module jobs to completion.
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// Creates a pool with exactly `workers` threads (minimum 1).
    #[must_use]
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Creates a pool sized by [`default_worker_count`].
    #[must_use]
    pub fn from_environment() -> Self {
        Self::new(default_worker_count())
    }

    /// The number of worker threads this pool runs.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers
    }

    /// Runs `job` once per item in `items`, distributing work across
    /// `self.worker_count()` threads via a shared atomic cursor (each
    /// thread claims the next unclaimed index until none remain). Blocks
    /// until every item has completed.
    ///
    /// A single item's panic unwinds this call (propagated via
    /// `std::thread::scope`'s join), matching `boaw::execute_parallel`'s
    /// panic-propagation behavior rather than silently dropping work.
    pub fn run<T, F>(&self, items: &[T], job: F)
    where
        T: Sync,
        F: Fn(&T) + Sync,
    {
        if items.is_empty() {
            return;
        }
        let worker_count = self.workers.min(items.len());
        if worker_count <= 1 {
            for item in items {
                job(item);
            }
            return;
        }

        let cursor = AtomicUsize::new(0);
        std::thread::scope(|scope| {
            for _ in 0..worker_count {
                scope.spawn(|| loop {
                    let index = cursor.fetch_add(1, Ordering::Relaxed);
                    let Some(item) = items.get(index) else {
                        break;
                    };
                    job(item);
                });
            }
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    #[test]
    fn single_worker_runs_every_item_serially() {
        let pool = WorkerPool::new(1);
        let sum = AtomicU64::new(0);
        let items: Vec<u64> = (1..=10).collect();
        pool.run(&items, |n| {
            sum.fetch_add(*n, Ordering::Relaxed);
        });
        assert_eq!(sum.load(Ordering::Relaxed), 55);
    }

    #[test]
    fn multiple_workers_process_every_item_exactly_once() {
        let pool = WorkerPool::new(4);
        let sum = AtomicU64::new(0);
        let items: Vec<u64> = (1..=1000).collect();
        pool.run(&items, |n| {
            sum.fetch_add(*n, Ordering::Relaxed);
        });
        assert_eq!(sum.load(Ordering::Relaxed), 500_500);
    }

    #[test]
    fn empty_item_list_is_a_no_op() {
        let pool = WorkerPool::new(4);
        let items: Vec<u64> = Vec::new();
        pool.run(&items, |_| panic!("should never run"));
    }

    #[test]
    fn worker_count_is_at_least_one() {
        assert_eq!(WorkerPool::new(0).worker_count(), 1);
    }
}
