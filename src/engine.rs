//! Split-on-allocate and merge-on-free: the engine that keeps the block
//! list's invariants (no two free blocks ever touch; every block's derived
//! size stays consistent with its header) true across every mutation.

use crate::heap::block::{BlockHeader, BlockStatus, HEADER_SIZE};
use crate::heap::region::{RegionHeader, RegionManager};
use std::mem::size_of;

/// Claim `block` for an allocation of `size` bytes, splitting off a
/// trailing free block when the leftover space is large enough to host
/// another header plus at least one byte of payload.
///
/// # Safety
/// `block` must be a free block in `regions` with a derived payload size
/// of at least `size`.
pub unsafe fn split_on_allocate(block: *mut BlockHeader, size: usize, regions: &RegionManager) {
    let full_size = unsafe { BlockHeader::payload_size(block, regions) };
    let leftover = full_size - size;

    if leftover <= HEADER_SIZE {
        unsafe { (*block).status = BlockStatus::Allocated };
        return;
    }

    let region_number = unsafe { (*block).region_number };
    let new_addr = unsafe { BlockHeader::payload(block).add(size) };
    let old_next = unsafe { (*block).next_block };

    let new_block = unsafe { BlockHeader::install_free(new_addr, region_number) };
    unsafe {
        (*new_block).next_block = old_next;
        (*new_block).prev_block = block;
        if !old_next.is_null() {
            (*old_next).prev_block = new_block;
        }
        (*block).next_block = new_block;
        (*block).status = BlockStatus::Allocated;
    }
}

/// Free `block`, coalescing with a free neighbor on either side, then
/// releasing its region if the result is the sole, whole-region free block.
///
/// `first_block` is the pool's head-of-list pointer; updated in place if
/// the merge removes the current head. `keep_last_region_alive` sanctions
/// retaining a single empty region only for eager-init pools (design §4.4);
/// a lazy pool reclaims all the way back to zero regions.
///
/// Returns whether the merge emptied and released an entire region.
///
/// # Safety
/// `block` must be an allocated block belonging to a region `regions` owns,
/// and `*first_block` must be the current head of the same list `block`
/// belongs to.
pub unsafe fn merge_on_free(
    block: *mut BlockHeader,
    first_block: &mut *mut BlockHeader,
    regions: &mut RegionManager,
    keep_last_region_alive: bool,
) -> bool {
    let region_number = unsafe { (*block).region_number };
    let prev = unsafe { (*block).prev_block };
    let next = unsafe { (*block).next_block };
    // Coalescing only makes sense within a region: a cross-region neighbor
    // in the block list is not address-adjacent, so merging across that
    // boundary would corrupt derived payload sizes on both sides.
    let prev_free = !prev.is_null()
        && unsafe { (*prev).region_number } == region_number
        && unsafe { (*prev).status } == BlockStatus::Free;
    let next_free = !next.is_null()
        && unsafe { (*next).region_number } == region_number
        && unsafe { (*next).status } == BlockStatus::Free;

    let surviving = if prev_free && next_free {
        // Case 1: absorb both neighbors into `prev`.
        let next_next = unsafe { (*next).next_block };
        unsafe {
            (*prev).next_block = next_next;
            if !next_next.is_null() {
                (*next_next).prev_block = prev;
            }
        }
        prev
    } else if prev_free {
        // Case 2: absorb `block` into `prev`.
        unsafe {
            (*prev).next_block = next;
            if !next.is_null() {
                (*next).prev_block = prev;
            }
        }
        prev
    } else if next_free {
        // Case 3: absorb `next` into `block`.
        let next_next = unsafe { (*next).next_block };
        unsafe {
            (*block).next_block = next_next;
            if !next_next.is_null() {
                (*next_next).prev_block = block;
            }
            (*block).status = BlockStatus::Free;
        }
        block
    } else {
        // Case 4: no neighbor to merge with.
        unsafe { (*block).status = BlockStatus::Free };
        block
    };

    if *first_block == block && surviving != block {
        *first_block = surviving;
    }

    reclaim_if_whole_region(surviving, first_block, regions, keep_last_region_alive)
}

/// If `block` is now the sole block occupying its entire region, unlink it
/// and hand the region back to the OS — unless it is the pool's last
/// remaining region and `keep_last_region_alive` is set (eager-init pools
/// only; see design §4.4).
fn reclaim_if_whole_region(
    block: *mut BlockHeader,
    first_block: &mut *mut BlockHeader,
    regions: &mut RegionManager,
    keep_last_region_alive: bool,
) -> bool {
    if keep_last_region_alive && regions.count() <= 1 {
        return false;
    }

    let region_number = unsafe { (*block).region_number };
    let region = match regions.lookup(region_number) {
        Some(r) => r,
        None => return false,
    };
    let payload_start = unsafe { (region as *mut u8).add(size_of::<RegionHeader>()) };
    if BlockHeader::payload(block) != payload_start {
        return false;
    }

    let prev = unsafe { (*block).prev_block };
    let next = unsafe { (*block).next_block };
    let prev_in_other_region = prev.is_null() || unsafe { (*prev).region_number } != region_number;
    let next_in_other_region = next.is_null() || unsafe { (*next).region_number } != region_number;
    if !(prev_in_other_region && next_in_other_region) {
        return false;
    }

    if prev.is_null() {
        *first_block = next;
    } else {
        unsafe { (*prev).next_block = next };
    }
    if !next.is_null() {
        unsafe { (*next).prev_block = prev };
    }

    if let Err(e) = regions.release(region_number) {
        log::error!("mfalloc: failed to release emptied region #{region_number}: {e}");
        return false;
    }
    true
}
