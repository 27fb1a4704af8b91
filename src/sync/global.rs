//! Global-pool mode: one allocator state guarded by one mutex, shared by
//! every thread. Every public entry point acquires the mutex at entrance
//! and releases it on every exit path; reallocate never drops the lock
//! between its internal allocate and free.

use crate::config::AllocatorConfig;
use crate::error::{AllocError, Result};
use crate::pool::Pool;
use crate::stats::PoolStats;
use std::sync::Mutex;

/// A process-wide allocator pool behind a single mutex.
pub struct GlobalPool {
    inner: Mutex<Option<Pool>>,
}

impl GlobalPool {
    pub const fn uninit() -> Self {
        GlobalPool {
            inner: Mutex::new(None),
        }
    }

    /// Map the first region (if `config.eager`) and make the pool ready for
    /// use. Calling this twice simply replaces the existing pool, unmapping
    /// its regions.
    pub fn init(&self, config: AllocatorConfig) -> Result<()> {
        let pool = Pool::new(config)?;
        let mut guard = self.inner.lock()?;
        *guard = Some(pool);
        Ok(())
    }

    /// Unmap every region and return to the uninitialized state.
    /// Idempotent: destroying an already-destroyed (or never-initialized)
    /// pool is a no-op, matching the allocator's original double-destroy
    /// safety.
    pub fn destroy(&self) {
        match self.inner.lock() {
            Ok(mut guard) => {
                guard.take();
            }
            Err(poisoned) => {
                poisoned.into_inner().take();
            }
        }
    }

    pub fn allocate(&self, size: usize) -> Option<*mut u8> {
        let mut guard = self.lock_or_fatal();
        match guard.as_mut() {
            None => AllocError::UseBeforeInit.fatal(),
            Some(pool) => match pool.allocate(size) {
                Ok(ptr) => Some(ptr),
                Err(AllocError::OutOfMemory { .. }) => None,
                Err(e) => e.fatal(),
            },
        }
    }

    pub fn free(&self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        let mut guard = self.lock_or_fatal();
        match guard.as_mut() {
            None => AllocError::UseBeforeInit.fatal(),
            Some(pool) => {
                if let Err(e) = pool.free(ptr) {
                    e.fatal();
                }
            }
        }
    }

    pub fn reallocate(&self, ptr: *mut u8, size: usize) -> Option<*mut u8> {
        let mut guard = self.lock_or_fatal();
        match guard.as_mut() {
            None => AllocError::UseBeforeInit.fatal(),
            Some(pool) => match pool.reallocate(ptr, size) {
                Ok(opt) => opt,
                Err(e) => e.fatal(),
            },
        }
    }

    pub fn stats(&self) -> Option<PoolStats> {
        self.lock_or_fatal().as_ref().map(Pool::stats)
    }

    /// A poisoned global mutex means some other thread panicked mid-mutation
    /// of shared allocator state — the block/region lists may be half
    /// updated, so there is no safe way to keep going.
    fn lock_or_fatal(&self) -> std::sync::MutexGuard<'_, Option<Pool>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::error!("mfalloc: global pool mutex poisoned by a panicking thread");
                AllocError::LockPoisoned(poisoned.to_string()).fatal()
            }
        }
    }
}

impl Default for GlobalPool {
    fn default() -> Self {
        Self::uninit()
    }
}
