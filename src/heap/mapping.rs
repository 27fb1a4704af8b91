//! Anonymous memory mappings — the OS-primitive collaborator the region
//! manager asks for raw, page-backed storage.
//!
//! Grounded directly on the allocator's original `mmap(NULL, size,
//! PROT_READ|PROT_WRITE, MAP_PRIVATE|MAP_ANONYMOUS, -1, 0)` call: one mapping
//! per region, torn down with a matching `munmap` when the region manager
//! releases it (or at destroy time).

use crate::error::{AllocError, Result};
use crate::heap::page::align_to_page;

/// Map a new anonymous, zero-filled region of at least `requested` bytes.
///
/// The mapping is rounded up to a whole number of pages; the actual mapped
/// length is returned alongside the base address so the caller can record it
/// as the region's authoritative size.
///
/// Returns [`AllocError::OutOfMemory`] if the OS declines the mapping — this
/// is the allocator's one recoverable error, never a fatal one.
pub fn map_anonymous(requested: usize) -> Result<(*mut u8, usize)> {
    let len = align_to_page(requested);

    // SAFETY: a fixed, well-formed set of flags requesting a private,
    // anonymous, zero-filled mapping; `addr = NULL` lets the kernel choose
    // the base address. `len` is page-aligned and nonzero.
    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            len,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            -1,
            0,
        )
    };

    if ptr == libc::MAP_FAILED {
        return Err(AllocError::OutOfMemory { requested });
    }

    Ok((ptr as *mut u8, len))
}

/// Unmap a region previously returned by [`map_anonymous`].
///
/// # Safety
/// `ptr` must be the exact base address returned by a prior `map_anonymous`
/// call and `len` must be that call's returned length; the mapping must not
/// already have been unmapped.
pub unsafe fn unmap(ptr: *mut u8, len: usize) -> Result<()> {
    let rc = unsafe { libc::munmap(ptr as *mut libc::c_void, len) };
    if rc != 0 {
        let errno = std::io::Error::last_os_error();
        return Err(AllocError::OsPrimitiveFailure {
            operation: "munmap".to_string(),
            reason: errno.to_string(),
        });
    }
    Ok(())
}
