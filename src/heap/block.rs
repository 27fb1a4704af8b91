//! Block headers — the in-band metadata preceding every allocation.
//!
//! Blocks thread into one doubly linked list that spans every region in a
//! pool, mirroring the allocator's original `BlockInformation` struct. A
//! block's payload size is never stored: it is derived from the address of
//! the next block, or from the end of the owning region when a block sits
//! at a region's tail.

use crate::heap::region::RegionManager;
use std::mem::size_of;

/// Whether a block is in use or available for the best-fit selector.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    Free = 0,
    Allocated = 1,
}

/// In-band header immediately preceding every block's payload.
#[repr(C)]
pub struct BlockHeader {
    /// Next block in address order across the whole pool, or null at the tail.
    pub next_block: *mut BlockHeader,
    /// Previous block in address order, or null at the head.
    pub prev_block: *mut BlockHeader,
    pub status: BlockStatus,
    /// Number of the region this block's bytes live in.
    pub region_number: u32,
}

pub const HEADER_SIZE: usize = size_of::<BlockHeader>();

impl BlockHeader {
    /// Pointer to the first byte of this block's payload.
    pub fn payload(this: *mut BlockHeader) -> *mut u8 {
        unsafe { (this as *mut u8).add(HEADER_SIZE) }
    }

    /// Recover a block header from one of its payload pointers.
    ///
    /// # Safety
    /// `payload` must have been returned by [`BlockHeader::payload`] for a
    /// still-live block header.
    pub unsafe fn from_payload(payload: *mut u8) -> *mut BlockHeader {
        unsafe { payload.sub(HEADER_SIZE) as *mut BlockHeader }
    }

    /// Derive this block's usable payload size.
    ///
    /// - If there is a next block in the *same* region, the gap between the
    ///   two headers is the payload size.
    /// - Otherwise (no next block, or the next block starts a new region),
    ///   the block runs to the end of its own region.
    ///
    /// # Safety
    /// `this` must point at a live, correctly linked block header, and
    /// `regions` must be the manager owning `this`'s region.
    pub unsafe fn payload_size(this: *const BlockHeader, regions: &RegionManager) -> usize {
        let hdr = unsafe { &*this };
        let region_end = regions
            .region_end(hdr.region_number)
            .expect("block must belong to a live region");

        if hdr.next_block.is_null() {
            return region_end - (this as usize) - HEADER_SIZE;
        }

        let next_region_number = unsafe { (*hdr.next_block).region_number };
        if next_region_number == hdr.region_number {
            (hdr.next_block as usize) - (this as usize) - HEADER_SIZE
        } else {
            region_end - (this as usize) - HEADER_SIZE
        }
    }

    /// Write a fresh, unlinked free block header at `addr`.
    ///
    /// # Safety
    /// `addr` must be valid for at least `HEADER_SIZE` writable bytes and
    /// not currently host a live block header.
    pub unsafe fn install_free(addr: *mut u8, region_number: u32) -> *mut BlockHeader {
        let header = addr as *mut BlockHeader;
        unsafe {
            header.write(BlockHeader {
                next_block: std::ptr::null_mut(),
                prev_block: std::ptr::null_mut(),
                status: BlockStatus::Free,
                region_number,
            });
        }
        header
    }
}
