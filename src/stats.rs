//! Pool statistics — plain counters a caller can snapshot through
//! `GlobalPool::stats()` / `LocalPool::stats()`.
//!
//! Byte totals (`bytes_in_use`, `bytes_free`, `live_regions`) are derived
//! fresh from the block and region lists at snapshot time rather than kept
//! incrementally — a pool's allocate/free hot path already walks those
//! lists, so a second O(n) walk on an explicit `stats()` call is cheap and
//! immune to drift between the in-band headers and a shadow counter.

use std::sync::atomic::{AtomicU64, Ordering};

/// A point-in-time snapshot of a pool's activity.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolStats {
    pub bytes_in_use: usize,
    pub bytes_free: usize,
    pub live_regions: usize,
    pub allocations: u64,
    pub frees: u64,
    pub regions_acquired: u64,
    pub regions_released: u64,
}

/// Monotonic event counters a pool updates as it runs.
#[derive(Default)]
pub struct StatsCounters {
    allocations: AtomicU64,
    frees: AtomicU64,
    regions_acquired: AtomicU64,
    regions_released: AtomicU64,
}

impl StatsCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_allocation(&self) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_free(&self) {
        self.frees.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_region_acquired(&self) {
        self.regions_acquired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_region_released(&self) {
        self.regions_released.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, bytes_in_use: usize, bytes_free: usize, live_regions: usize) -> PoolStats {
        PoolStats {
            bytes_in_use,
            bytes_free,
            live_regions,
            allocations: self.allocations.load(Ordering::Relaxed),
            frees: self.frees.load(Ordering::Relaxed),
            regions_acquired: self.regions_acquired.load(Ordering::Relaxed),
            regions_released: self.regions_released.load(Ordering::Relaxed),
        }
    }
}
