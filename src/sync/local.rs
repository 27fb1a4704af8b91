//! Per-thread mode: allocator state with thread-local storage duration,
//! no locking. Each thread must `init` before its first allocation; a
//! thread's regions are unmapped automatically when the thread exits,
//! standing in for the allocator's original `atexit`-registered destructor.

use crate::config::AllocatorConfig;
use crate::error::{AllocError, Result};
use crate::pool::Pool;
use crate::stats::PoolStats;
use std::cell::RefCell;

thread_local! {
    static POOL: RefCell<Option<Pool>> = const { RefCell::new(None) };
}

/// A handle onto the calling thread's own pool. Zero-sized: all state lives
/// in the `thread_local!` above, so every `LocalPool` value is equivalent —
/// the type exists to give per-thread mode the same call shape as
/// [`crate::sync::global::GlobalPool`].
#[derive(Default)]
pub struct LocalPool;

impl LocalPool {
    pub const fn handle() -> Self {
        LocalPool
    }

    pub fn init(&self, config: AllocatorConfig) -> Result<()> {
        let pool = Pool::new(config)?;
        POOL.with(|cell| *cell.borrow_mut() = Some(pool));
        Ok(())
    }

    /// Idempotent: destroying an already-destroyed (or never-initialized)
    /// thread pool is a no-op.
    pub fn destroy(&self) {
        POOL.with(|cell| {
            cell.borrow_mut().take();
        });
    }

    pub fn allocate(&self, size: usize) -> Option<*mut u8> {
        POOL.with(|cell| {
            let mut guard = cell.borrow_mut();
            match guard.as_mut() {
                None => AllocError::UseBeforeInit.fatal(),
                Some(pool) => match pool.allocate(size) {
                    Ok(ptr) => Some(ptr),
                    Err(AllocError::OutOfMemory { .. }) => None,
                    Err(e) => e.fatal(),
                },
            }
        })
    }

    pub fn free(&self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        POOL.with(|cell| {
            let mut guard = cell.borrow_mut();
            match guard.as_mut() {
                None => AllocError::UseBeforeInit.fatal(),
                Some(pool) => {
                    if let Err(e) = pool.free(ptr) {
                        e.fatal();
                    }
                }
            }
        })
    }

    pub fn reallocate(&self, ptr: *mut u8, size: usize) -> Option<*mut u8> {
        POOL.with(|cell| {
            let mut guard = cell.borrow_mut();
            match guard.as_mut() {
                None => AllocError::UseBeforeInit.fatal(),
                Some(pool) => match pool.reallocate(ptr, size) {
                    Ok(opt) => opt,
                    Err(e) => e.fatal(),
                },
            }
        })
    }

    pub fn stats(&self) -> Option<PoolStats> {
        POOL.with(|cell| cell.borrow().as_ref().map(Pool::stats))
    }
}
