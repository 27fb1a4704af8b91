//! # mfalloc — a best-fit, coalescing, segregated-pool allocator
//!
//! `mfalloc` hands out memory from anonymous `mmap` regions using a
//! best-fit, address-ordered free list. Every block carries an in-band
//! header; no side table tracks live allocations. A pool grows by mapping
//! a new region whenever no existing free block is large enough, and gives
//! a region back to the OS the moment coalescing leaves it entirely empty
//! (never the very last one — see [`config`]).
//!
//! ## Overview
//!
//! - **Region manager** ([`heap::region`]): one `mmap`-backed span per
//!   region, threaded into a singly linked list through an in-band header.
//! - **Block list** ([`heap::block`]): a doubly linked chain of blocks
//!   spanning every region. No block stores its own size — it is derived
//!   from the address of its neighbor, or the end of its region.
//! - **Best-fit selector** ([`selector`]): an O(n) scan for the
//!   tightest-fitting free block, with an early exit on an exact match.
//! - **Split/merge engine** ([`engine`]): splits a block on allocation when
//!   the leftover is worth keeping, and coalesces adjacent free blocks
//!   (within the same region only) on free.
//! - **Reallocate policy** ([`realloc`]): shrink in place, relocate when
//!   shrinking past half, absorb a free neighbor when growing, relocate as
//!   a last resort.
//! - **Synchronization shell** ([`sync`]): a single mutex-guarded pool
//!   shared process-wide, or one pool per thread with no locking at all.
//!
//! ## Quick Start
//!
//! ```rust
//! use mfalloc::config::AllocatorConfig;
//!
//! mfalloc::init(AllocatorConfig::default()).unwrap();
//!
//! let ptr = mfalloc::allocate(128).expect("allocation failed");
//! unsafe {
//!     std::ptr::write_bytes(ptr, 0, 128);
//! }
//!
//! let ptr = mfalloc::reallocate(ptr, 256).expect("reallocation failed");
//! mfalloc::free(ptr);
//!
//! mfalloc::destroy();
//! ```
//!
//! ## Error Handling
//!
//! Out-of-memory is the allocator's one recoverable condition: `allocate`
//! and `reallocate` surface it as `None`, never a panic. Every other
//! failure — use before init, double free, reallocate of a freed block, an
//! invalid pointer, a failed OS primitive, a poisoned lock — means an
//! allocator invariant was violated by the caller or the environment, and
//! is unrecoverable: see [`error::AllocError::fatal`].
//!
//! ## Modules
//!
//! - [`config`]: pool tuning parameters and validation.
//! - [`error`]: the fatal/recoverable error taxonomy.
//! - [`heap`]: regions, blocks, page-size helpers, and the raw `mmap` shim.
//! - [`selector`]: best-fit block selection.
//! - [`engine`]: split-on-allocate and merge-on-free.
//! - [`realloc`]: the reallocate policy.
//! - [`pool`]: the single-threaded allocator core these pieces compose into.
//! - [`sync`]: the global-mutex and per-thread synchronization disciplines.
//! - [`stats`]: pool statistics snapshots.

pub mod config;
pub mod engine;
pub mod error;
pub mod heap;
pub mod pool;
pub mod realloc;
pub mod selector;
pub mod stats;
pub mod sync;

pub use config::AllocatorConfig;
pub use error::{AllocError, Result};
pub use pool::Pool;
pub use stats::PoolStats;
pub use sync::{GlobalPool, LocalPool};

use config::PoolMode;
use std::sync::atomic::{AtomicU8, Ordering};

const MODE_UNINIT: u8 = 0;
const MODE_GLOBAL: u8 = 1;
const MODE_PER_THREAD: u8 = 2;

static GLOBAL_POOL: GlobalPool = GlobalPool::uninit();
static ACTIVE_MODE: AtomicU8 = AtomicU8::new(MODE_UNINIT);

/// Initialize the allocator for the process (global mode) or the calling
/// thread (per-thread mode), per `config.pool_mode`.
///
/// Per-thread mode requires every thread that will allocate to call this
/// once before its first allocation.
pub fn init(config: AllocatorConfig) -> Result<()> {
    match config.pool_mode {
        PoolMode::Global => {
            GLOBAL_POOL.init(config)?;
            ACTIVE_MODE.store(MODE_GLOBAL, Ordering::SeqCst);
        }
        PoolMode::PerThread => {
            LocalPool::handle().init(config)?;
            ACTIVE_MODE.store(MODE_PER_THREAD, Ordering::SeqCst);
        }
    }
    Ok(())
}

/// Unmap every live region and return to the uninitialized state.
/// Idempotent.
pub fn destroy() {
    match ACTIVE_MODE.load(Ordering::SeqCst) {
        MODE_GLOBAL => GLOBAL_POOL.destroy(),
        MODE_PER_THREAD => LocalPool::handle().destroy(),
        _ => {}
    }
}

/// Allocate `size` bytes. Returns `None` on out-of-memory; every other
/// failure is fatal (see [`error::AllocError::fatal`]).
pub fn allocate(size: usize) -> Option<*mut u8> {
    match ACTIVE_MODE.load(Ordering::SeqCst) {
        MODE_GLOBAL => GLOBAL_POOL.allocate(size),
        MODE_PER_THREAD => LocalPool::handle().allocate(size),
        _ => AllocError::UseBeforeInit.fatal(),
    }
}

/// Free a pointer previously returned by [`allocate`] or [`reallocate`].
/// A null pointer is a no-op.
pub fn free(ptr: *mut u8) {
    match ACTIVE_MODE.load(Ordering::SeqCst) {
        MODE_GLOBAL => GLOBAL_POOL.free(ptr),
        MODE_PER_THREAD => LocalPool::handle().free(ptr),
        _ => {
            if !ptr.is_null() {
                AllocError::UseBeforeInit.fatal()
            }
        }
    }
}

/// Resize a previous allocation. `ptr` null behaves like `allocate(size)`;
/// `size == 0` behaves like `free(ptr)` and returns `None`.
pub fn reallocate(ptr: *mut u8, size: usize) -> Option<*mut u8> {
    match ACTIVE_MODE.load(Ordering::SeqCst) {
        MODE_GLOBAL => GLOBAL_POOL.reallocate(ptr, size),
        MODE_PER_THREAD => LocalPool::handle().reallocate(ptr, size),
        _ => AllocError::UseBeforeInit.fatal(),
    }
}

/// Snapshot the active pool's statistics, or `None` before `init`.
pub fn stats() -> Option<PoolStats> {
    match ACTIVE_MODE.load(Ordering::SeqCst) {
        MODE_GLOBAL => GLOBAL_POOL.stats(),
        MODE_PER_THREAD => LocalPool::handle().stats(),
        _ => None,
    }
}

/// Crate version string, from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
