//! Shared test fixtures for `mfalloc`'s integration suite.
//!
//! These assertions are intentionally strict — no tolerances, no "close
//! enough". A test here exists to catch a broken invariant, not to pass.

use mfalloc::config::AllocatorConfig;
use mfalloc::pool::Pool;
use std::collections::HashSet;

/// Region size used by tests that don't care about the exact value but
/// want something small enough to force region growth quickly.
pub const SMALL_REGION_SIZE: usize = 64 * 1024;

/// Install an `env_logger` subscriber so `log::debug!`/`log::info!` calls
/// from the allocator are visible under `cargo test -- --nocapture`.
/// Harmless to call more than once across the suite.
pub fn init_test_logging() {
    let _ = env_logger::try_init();
}

/// A pool wrapped for test convenience, with the region size pinned so
/// growth-triggering tests don't need to allocate hundreds of megabytes.
pub struct PoolFixture {
    pub pool: Pool,
}

impl PoolFixture {
    /// Lazy pool, default (small) region size.
    pub fn new() -> Self {
        Self::with_config(AllocatorConfig {
            region_size: SMALL_REGION_SIZE,
            ..Default::default()
        })
    }

    /// Eager pool, default (small) region size.
    pub fn eager() -> Self {
        Self::with_config(AllocatorConfig {
            region_size: SMALL_REGION_SIZE,
            eager: true,
            ..Default::default()
        })
    }

    pub fn with_region_size(region_size: usize) -> Self {
        Self::with_config(AllocatorConfig {
            region_size,
            ..Default::default()
        })
    }

    pub fn eager_with_region_size(region_size: usize) -> Self {
        Self::with_config(AllocatorConfig {
            region_size,
            eager: true,
            ..Default::default()
        })
    }

    pub fn with_config(config: AllocatorConfig) -> Self {
        init_test_logging();
        let pool = Pool::new(config).expect("pool construction should succeed with a valid config");
        Self { pool }
    }
}

impl Default for PoolFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Assert every address in `ptrs` is distinct.
pub fn assert_all_addresses_unique(ptrs: &[*mut u8]) {
    let mut seen = HashSet::with_capacity(ptrs.len());
    for &p in ptrs {
        assert!(
            seen.insert(p as usize),
            "duplicate address {:p} returned by two live allocations",
            p
        );
    }
}

/// Assert `[p, p + len)` does not overlap any region in `others`.
pub fn assert_disjoint(p: *mut u8, len: usize, others: &[(*mut u8, usize)]) {
    let start = p as usize;
    let end = start + len;
    for &(q, qlen) in others {
        let qstart = q as usize;
        let qend = qstart + qlen;
        assert!(
            end <= qstart || start >= qend,
            "allocation [{:#x}, {:#x}) overlaps live allocation [{:#x}, {:#x})",
            start,
            end,
            qstart,
            qend
        );
    }
}

/// Tracks pointers handed out by a fixture and flags double frees /
/// use-after-free writes that this test harness itself can observe.
#[derive(Default)]
pub struct MemorySafetyChecker {
    live: HashSet<usize>,
    freed: HashSet<usize>,
}

impl MemorySafetyChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note_allocated(&mut self, ptr: *mut u8) {
        let addr = ptr as usize;
        assert!(
            !self.live.contains(&addr),
            "allocator returned an address already live: {:#x}",
            addr
        );
        self.live.insert(addr);
        self.freed.remove(&addr);
    }

    pub fn note_freed(&mut self, ptr: *mut u8) {
        let addr = ptr as usize;
        assert!(
            self.live.remove(&addr),
            "freed an address the checker never saw allocated: {:#x}",
            addr
        );
        assert!(
            self.freed.insert(addr),
            "double free observed by the checker at {:#x}",
            addr
        );
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

/// Run a closure in a freshly spawned child process via `assert_cmd`-style
/// trampoline isn't needed here: `mfalloc::error::AllocError::fatal` calls
/// `std::process::exit`, so tests that need to observe a fatal path spawn
/// themselves as a subprocess through `std::process::Command` with an
/// environment variable switch. See `tests/boundary_scenarios.rs`.
pub const FATAL_TEST_ENV_VAR: &str = "MFALLOC_TEST_FATAL_CASE";
