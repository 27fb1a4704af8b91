//! The single-threaded allocator core: region manager, block list, and the
//! best-fit/split/merge engine wired together into one pool of memory.
//!
//! `Pool` itself holds no lock and makes no thread-safety claim — that is
//! [`crate::sync::global`] and [`crate::sync::local`]'s job. Every method
//! here assumes exclusive access for its duration.

use crate::config::{AllocatorConfig, HEADER_SIZE, REGION_HEADER_SIZE};
use crate::engine;
use crate::error::{AllocError, Result};
use crate::heap::block::{BlockHeader, BlockStatus};
use crate::heap::region::RegionManager;
use crate::selector;
use crate::stats::{PoolStats, StatsCounters};

pub struct Pool {
    config: AllocatorConfig,
    pub(crate) regions: RegionManager,
    pub(crate) first_block: *mut BlockHeader,
    counters: StatsCounters,
}

impl Pool {
    pub fn new(config: AllocatorConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| AllocError::Configuration(e.to_string()))?;

        let mut pool = Pool {
            regions: RegionManager::new(config.region_size),
            first_block: std::ptr::null_mut(),
            counters: StatsCounters::new(),
            config,
        };

        if pool.config.eager {
            pool.grow(1)?;
        }

        Ok(pool)
    }

    /// Map a new region sized to hold at least `min_payload` bytes, install
    /// its sole free block, and append it to the block list.
    pub(crate) fn grow(&mut self, min_payload: usize) -> Result<*mut BlockHeader> {
        let region = self.regions.acquire(min_payload)?;
        let region_number = unsafe { (*region).number };
        let addr = unsafe { (region as *mut u8).add(REGION_HEADER_SIZE) };
        let new_block = unsafe { BlockHeader::install_free(addr, region_number) };

        match self.last_block() {
            Some(tail) => unsafe {
                (*tail).next_block = new_block;
                (*new_block).prev_block = tail;
            },
            None => self.first_block = new_block,
        }

        self.counters.record_region_acquired();
        Ok(new_block)
    }

    fn last_block(&self) -> Option<*mut BlockHeader> {
        if self.first_block.is_null() {
            return None;
        }
        let mut node = self.first_block;
        loop {
            let next = unsafe { (*node).next_block };
            if next.is_null() {
                return Some(node);
            }
            node = next;
        }
    }

    /// Allocate `size` bytes, growing the pool by a fresh region whenever no
    /// free block is large enough. `size` of zero is rounded up to one byte
    /// (see design §11.2): zero stays the sole special case in `reallocate`.
    pub fn allocate(&mut self, size: usize) -> Result<*mut u8> {
        let size = size.max(1);

        loop {
            // SAFETY: `first_block` heads a list this pool exclusively owns
            // and keeps consistent, and `regions` owns every region it points into.
            let found = unsafe { selector::select(self.first_block, size, &self.regions) };

            match found {
                Some(block) => {
                    unsafe { engine::split_on_allocate(block, size, &self.regions) };
                    self.counters.record_allocation();
                    log::debug!("mfalloc: allocated {size} bytes at {:p}", block);
                    return Ok(BlockHeader::payload(block));
                }
                None => {
                    self.grow(size)?;
                }
            }
        }
    }

    pub fn free(&mut self, ptr: *mut u8) -> Result<()> {
        // SAFETY: callers only ever pass pointers previously returned by
        // `allocate`/`reallocate` on this pool.
        let block = unsafe { BlockHeader::from_payload(ptr) };

        if self.config.validate_blocks && self.regions.lookup(unsafe { (*block).region_number }).is_none() {
            return Err(AllocError::InvalidPointer {
                address: ptr as usize,
                reason: "block's region_number does not match any live region".to_string(),
            });
        }

        if unsafe { (*block).status } == BlockStatus::Free {
            return Err(AllocError::DoubleFree {
                address: ptr as usize,
            });
        }

        let region_released = unsafe {
            engine::merge_on_free(
                block,
                &mut self.first_block,
                &mut self.regions,
                self.config.eager,
            )
        };
        if region_released {
            self.counters.record_region_released();
        }
        self.counters.record_free();
        log::debug!("mfalloc: freed block at {:p}", block);
        Ok(())
    }

    pub fn reallocate(&mut self, ptr: *mut u8, size: usize) -> Result<Option<*mut u8>> {
        crate::realloc::reallocate(self, ptr, size)
    }

    pub fn stats(&self) -> PoolStats {
        let mut bytes_in_use = 0usize;
        let mut bytes_free = 0usize;
        let mut node = self.first_block;
        while !node.is_null() {
            let status = unsafe { (*node).status };
            let size = unsafe { BlockHeader::payload_size(node, &self.regions) };
            match status {
                BlockStatus::Allocated => bytes_in_use += size,
                BlockStatus::Free => bytes_free += size,
            }
            node = unsafe { (*node).next_block };
        }

        self.counters
            .snapshot(bytes_in_use, bytes_free, self.regions.count())
    }

    /// Walk the block list checking the structural invariants that every
    /// mutation is supposed to leave intact: no two adjacent free blocks in
    /// the same region, a minimum usable gap between blocks, and consistent
    /// back-pointers. Returns the first violation found, if any.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let mut node = self.first_block;
        while !node.is_null() {
            let next = unsafe { (*node).next_block };
            if !next.is_null() {
                let same_region = unsafe { (*node).region_number == (*next).region_number };
                if same_region {
                    let both_free = unsafe {
                        (*node).status == BlockStatus::Free && (*next).status == BlockStatus::Free
                    };
                    if both_free {
                        return Err(format!(
                            "adjacent free blocks at {node:p} and {next:p} were not coalesced"
                        ));
                    }

                    let gap = next as usize - node as usize;
                    if gap < HEADER_SIZE + 1 {
                        return Err(format!(
                            "blocks {node:p} and {next:p} leave no room for a header and a payload byte"
                        ));
                    }
                }

                if unsafe { (*next).prev_block } != node {
                    return Err(format!("block {node:p}'s successor does not point back to it"));
                }
            }
            node = next;
        }
        Ok(())
    }
}

// SAFETY: a `Pool`'s raw pointers are only ever followed while the caller
// holds exclusive access — a lock in `sync::global`, thread-confinement in
// `sync::local` — never concurrently from two threads.
unsafe impl Send for Pool {}
