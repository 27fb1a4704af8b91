//! System page size helpers.
//!
//! Region sizes are rounded up to a multiple of the system page size before
//! being handed to [`crate::heap::mapping`] — `mmap` only ever hands back
//! whole pages anyway, so rounding up front keeps the region header's `size`
//! field equal to what was actually mapped.

use std::sync::atomic::{AtomicUsize, Ordering};

/// System page size, queried once and cached.
static SYSTEM_PAGE_SIZE: AtomicUsize = AtomicUsize::new(0);

/// Get system page size dynamically, caching the result.
pub fn get_page_size() -> usize {
    let cached = SYSTEM_PAGE_SIZE.load(Ordering::Relaxed);
    if cached != 0 {
        return cached;
    }

    let size = page_size::get();
    SYSTEM_PAGE_SIZE.store(size, Ordering::Relaxed);
    size
}

/// Round `size` up to the next multiple of the system page size.
pub fn align_to_page(size: usize) -> usize {
    let ps = get_page_size();
    size.div_ceil(ps) * ps
}
