//! Best-fit selection over the pool's global block list.
//!
//! Mirrors the allocator's original `__my_malloc_block_fitsBetter` comparator
//! exactly: the scan starts from the very first block of the pool (whatever
//! its status), walks forward, and keeps whichever block `fits_better`
//! prefers. The tail-block special cases and the "better candidate already
//! has no room to split" tie-break are reproduced verbatim from design
//! §4.3's decision table rather than approximated.

use crate::heap::block::{BlockHeader, BlockStatus, HEADER_SIZE};
use crate::heap::region::RegionManager;

/// Scan the block list for the best-fitting block for a `size`-byte request,
/// starting from `first_block`. Returns `None` if the pool has no blocks yet,
/// or if the best candidate found cannot actually hold `size` bytes (the
/// caller then grows the pool and retries).
///
/// # Safety
/// `first_block` must be null or point at the head of a valid, correctly
/// linked block list, and `regions` must own every region that list's blocks
/// reference.
pub unsafe fn select(
    first_block: *mut BlockHeader,
    size: usize,
    regions: &RegionManager,
) -> Option<*mut BlockHeader> {
    if first_block.is_null() {
        return None;
    }

    let mut best = first_block;
    let mut node = unsafe { (*first_block).next_block };

    while !node.is_null() {
        if unsafe { fits_better(node, best, size, regions) } {
            best = node;
            if unsafe { BlockHeader::payload_size(best, regions) } == size {
                break;
            }
        }
        node = unsafe { (*node).next_block };
    }

    let best_is_free = unsafe { (*best).status } == BlockStatus::Free;
    if !best_is_free {
        return None;
    }
    if unsafe { BlockHeader::payload_size(best, regions) } < size {
        return None;
    }

    Some(best)
}

/// design §4.3's `fits_better(candidate, current, s)` decision table,
/// reproduced row for row.
///
/// # Safety
/// `candidate` and `current` must both be live block headers in `regions`.
unsafe fn fits_better(
    candidate: *mut BlockHeader,
    current: *mut BlockHeader,
    size: usize,
    regions: &RegionManager,
) -> bool {
    if unsafe { (*candidate).status } != BlockStatus::Free {
        return false;
    }
    if current.is_null() || unsafe { (*current).status } != BlockStatus::Free {
        return true;
    }

    let pc = unsafe { BlockHeader::payload_size(candidate, regions) };

    // Tail block: growing past it means extending the region, so a split
    // needs a whole header's worth of room, not just `size` bytes.
    if unsafe { (*candidate).next_block }.is_null() {
        if pc == size {
            return true;
        }
        if pc < HEADER_SIZE + size {
            return false;
        }
        if pc == HEADER_SIZE + size {
            return true;
        }
    }

    if pc < size {
        return false;
    }
    if pc == size {
        return true;
    }

    let pb = unsafe { BlockHeader::payload_size(current, regions) };
    if pb > size + HEADER_SIZE && pc <= size + HEADER_SIZE {
        return false;
    }

    (pc - size) < (pb - size)
}
