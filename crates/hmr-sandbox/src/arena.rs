// SPDX-License-Identifier: Apache-2.0
//! Per-module arena allocation (spec §4.F).
//!
//! Each module draws its allocations from a bounded [`ModuleArena`] backed by
//! a [`GlobalArenaPool`] of size-class buckets. The pool reuses freed buffers
//! within a size class rather than returning them to the system allocator,
//! bounding churn the way the spec's "lock-free free-lists bucketed by size
//! class" calls for. This crate forbids `unsafe_code` (carried over from the
//! teacher's lint policy), so the buckets are `Mutex`-guarded free lists
//! rather than lock-free stacks built on raw atomics/CAS — see DESIGN.md for
//! the tradeoff.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use hmr_types::ModuleIdentity;

/// Rounds `size` up to the nearest power-of-two size class, with a floor of 64.
fn size_class(size: usize) -> usize {
    size.max(64).next_power_of_two()
}

/// A pool of reusable byte buffers, bucketed by power-of-two size class.
///
/// Shared across every module's [`ModuleArena`]; buckets never mix buffers
/// across modules at the same instant because a buffer is only returned to
/// its bucket when its owning [`ArenaBlock`] drops, after which it carries
/// no residual data a reader could observe cross-module.
#[derive(Clone, Default)]
pub struct GlobalArenaPool {
    buckets: Arc<Mutex<std::collections::HashMap<usize, Vec<Vec<u8>>>>>,
}

impl GlobalArenaPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn take(&self, class: usize) -> Vec<u8> {
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        buckets
            .get_mut(&class)
            .and_then(Vec::pop)
            .unwrap_or_else(|| vec![0u8; class])
    }

    fn give_back(&self, class: usize, mut buf: Vec<u8>) {
        buf.clear();
        buf.resize(class, 0);
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        buckets.entry(class).or_default().push(buf);
    }
}

/// An allocation owned by one module, backed by a buffer from its size class.
///
/// Dropping the block returns the buffer to the [`GlobalArenaPool`] and
/// decrements the owning arena's live-byte counter, so resource accounting
/// stays accurate without the caller needing to call a `free` method.
pub struct ArenaBlock {
    bytes: Vec<u8>,
    class: usize,
    pool: GlobalArenaPool,
    live_bytes: Arc<AtomicU64>,
}

impl ArenaBlock {
    /// The requested (not rounded-up) usable length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the block has zero usable length.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Read-only view of the block's bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutable view of the block's bytes.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl Drop for ArenaBlock {
    fn drop(&mut self) {
        self.live_bytes
            .fetch_sub(self.class as u64, Ordering::AcqRel);
        let buf = std::mem::take(&mut self.bytes);
        self.pool.give_back(self.class, buf);
    }
}

/// Resource accounting for one module's arena (spec §4.F).
pub struct ModuleArena {
    identity: ModuleIdentity,
    memory_limit: u64,
    pool: GlobalArenaPool,
    live_bytes: Arc<AtomicU64>,
    peak_bytes: AtomicU64,
    total_allocations: AtomicU64,
}

impl ModuleArena {
    /// Creates a fresh arena for `identity`, bounded by `memory_limit` bytes.
    #[must_use]
    pub fn new(identity: ModuleIdentity, memory_limit: u64, pool: GlobalArenaPool) -> Self {
        Self {
            identity,
            memory_limit,
            pool,
            live_bytes: Arc::new(AtomicU64::new(0)),
            peak_bytes: AtomicU64::new(0),
            total_allocations: AtomicU64::new(0),
        }
    }

    /// The module this arena belongs to.
    #[must_use]
    pub fn identity(&self) -> ModuleIdentity {
        self.identity
    }

    /// The declared ceiling on live bytes for this arena.
    #[must_use]
    pub fn memory_limit(&self) -> u64 {
        self.memory_limit
    }

    /// Bytes currently live (allocated and not yet dropped).
    #[must_use]
    pub fn live_bytes(&self) -> u64 {
        self.live_bytes.load(Ordering::Acquire)
    }

    /// The highest `live_bytes` has reached since this arena was created.
    #[must_use]
    pub fn peak_bytes(&self) -> u64 {
        self.peak_bytes.load(Ordering::Acquire)
    }

    /// Total number of successful allocations since this arena was created.
    #[must_use]
    pub fn total_allocations(&self) -> u64 {
        self.total_allocations.load(Ordering::Acquire)
    }

    /// Allocates `size` bytes from the arena.
    ///
    /// Returns `None` if granting the allocation would push `live_bytes`
    /// above `memory_limit` (spec invariant: "sum of live per-module arena
    /// allocations ≤ module's declared peak memory").
    #[must_use]
    pub fn allocate(&self, size: usize) -> Option<ArenaBlock> {
        let class = size_class(size) as u64;
        let mut current = self.live_bytes.load(Ordering::Acquire);
        loop {
            let next = current.checked_add(class)?;
            if next > self.memory_limit {
                return None;
            }
            match self.live_bytes.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
        self.peak_bytes
            .fetch_max(self.live_bytes.load(Ordering::Acquire), Ordering::AcqRel);
        self.total_allocations.fetch_add(1, Ordering::AcqRel);

        let mut bytes = self.pool.take(class as usize);
        bytes.truncate(size);
        Some(ArenaBlock {
            bytes,
            class: class as usize,
            pool: self.pool.clone(),
            live_bytes: Arc::clone(&self.live_bytes),
        })
    }
}
