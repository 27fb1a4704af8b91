//! Reallocate policy (design §4.5): shrink in place when the leftover is
//! too small to matter, relocate a badly oversized block to a better-fitting
//! site, absorb a free neighbor to satisfy growth without moving, and fall
//! back to allocate-copy-free only when nothing cheaper is possible.

use crate::config::HEADER_SIZE;
use crate::engine;
use crate::error::{AllocError, Result};
use crate::heap::block::{BlockHeader, BlockStatus};
use crate::pool::Pool;

pub fn reallocate(pool: &mut Pool, ptr: *mut u8, size: usize) -> Result<Option<*mut u8>> {
    if ptr.is_null() {
        return pool.allocate(size).map(Some);
    }
    if size == 0 {
        pool.free(ptr)?;
        return Ok(None);
    }

    // SAFETY: `ptr` was previously returned by this pool's `allocate`/`reallocate`.
    let block = unsafe { BlockHeader::from_payload(ptr) };
    if unsafe { (*block).status } == BlockStatus::Free {
        return Err(AllocError::ReallocOfFreed {
            address: ptr as usize,
        });
    }

    let pc = unsafe { BlockHeader::payload_size(block, &pool.regions) };

    if size <= pc {
        shrink(pool, block, pc, size).map(Some)
    } else {
        grow(pool, block, pc, size)
    }
}

/// Case A: `size <= pc`.
fn shrink(pool: &mut Pool, block: *mut BlockHeader, pc: usize, size: usize) -> Result<*mut u8> {
    let leftover = pc - size;

    // A.1
    if leftover <= HEADER_SIZE {
        return Ok(BlockHeader::payload(block));
    }

    // A.2: shrinking to under half the current payload is worth a move to
    // a better-fitting site, if one is available without growing the pool.
    if size.saturating_mul(2) < pc {
        match try_relocate(pool, block, pc, size) {
            Some(new_ptr) => return Ok(new_ptr),
            None => { /* fall through to A.3 */ }
        }
    }

    // A.3
    // SAFETY: `block` is allocated with derived size `pc >= size`, so
    // splitting at `size` leaves a valid trailing free block.
    unsafe { engine::split_on_allocate(block, size, &pool.regions) };
    Ok(BlockHeader::payload(block))
}

/// Try relocating `block`'s first `size` bytes to a fresh, better-fitting
/// allocation without growing the pool. Returns `None` if no free block
/// already large enough exists, leaving `block` untouched.
fn try_relocate(
    pool: &mut Pool,
    block: *mut BlockHeader,
    _pc: usize,
    size: usize,
) -> Option<*mut u8> {
    let found = unsafe { crate::selector::select(pool.first_block, size, &pool.regions) };
    let candidate = found?;
    if candidate == block {
        return None;
    }

    unsafe { engine::split_on_allocate(candidate, size, &pool.regions) };
    let new_ptr = BlockHeader::payload(candidate);
    unsafe {
        std::ptr::copy_nonoverlapping(BlockHeader::payload(block), new_ptr, size);
    }
    pool.free(BlockHeader::payload(block)).ok()?;
    Some(new_ptr)
}

/// Case B: `size > pc`.
fn grow(pool: &mut Pool, block: *mut BlockHeader, pc: usize, size: usize) -> Result<Option<*mut u8>> {
    let next = unsafe { (*block).next_block };
    let region_number = unsafe { (*block).region_number };
    let next_is_free_neighbor = !next.is_null()
        && unsafe { (*next).status } == BlockStatus::Free
        && unsafe { (*next).region_number } == region_number;

    if next_is_free_neighbor {
        let next_payload = unsafe { BlockHeader::payload_size(next, &pool.regions) };
        let total = pc + HEADER_SIZE + next_payload;

        if total >= size {
            let leftover = total - size;
            let next_next = unsafe { (*next).next_block };

            if leftover <= HEADER_SIZE {
                // B.1: consume N entirely.
                unsafe {
                    (*block).next_block = next_next;
                    if !next_next.is_null() {
                        (*next_next).prev_block = block;
                    }
                }
            } else {
                // B.2: consume N, leave a smaller trailing free block.
                let new_addr = unsafe { BlockHeader::payload(block).add(size) };
                let new_free = unsafe { BlockHeader::install_free(new_addr, region_number) };
                unsafe {
                    (*new_free).next_block = next_next;
                    (*new_free).prev_block = block;
                    if !next_next.is_null() {
                        (*next_next).prev_block = new_free;
                    }
                    (*block).next_block = new_free;
                }
            }

            return Ok(Some(BlockHeader::payload(block)));
        }
    }

    // B.4: relocate. B.3 ("otherwise") is exactly this fallthrough.
    match pool.allocate(size) {
        Ok(new_ptr) => {
            unsafe {
                std::ptr::copy_nonoverlapping(BlockHeader::payload(block), new_ptr, pc);
            }
            pool.free(BlockHeader::payload(block))?;
            Ok(Some(new_ptr))
        }
        Err(AllocError::OutOfMemory { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}
