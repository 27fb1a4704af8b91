//! Region headers and the region manager.
//!
//! A region is one `mmap`-backed span of anonymous memory. Its header sits
//! in-band at the very front of the mapping; regions are threaded into a
//! singly linked list through that header's `next` field, exactly as the
//! allocator this crate is modeled on threads its `MemoryBlockinformation`
//! structs.

use crate::error::Result;
use crate::heap::block::HEADER_SIZE;
use crate::heap::mapping;
use std::mem::size_of;

/// In-band header occupying the first bytes of every mapped region.
#[repr(C)]
pub struct RegionHeader {
    /// Total size of the mapping, header included, in bytes.
    pub size: usize,
    /// Next region in the pool's region list, or null for the tail.
    pub next: *mut RegionHeader,
    /// This region's identity, assigned by [`RegionManager::next_free_number`].
    pub number: u32,
}

/// Owns the region list for a single pool.
///
/// Not `Send`/`Sync` on its own — the raw pointers here are only safe to
/// follow under whatever discipline the owning pool enforces
/// ([`crate::sync::global`]'s mutex or [`crate::sync::local`]'s
/// thread-confinement).
pub struct RegionManager {
    head: *mut RegionHeader,
    default_region_size: usize,
}

impl RegionManager {
    pub fn new(default_region_size: usize) -> Self {
        RegionManager {
            head: std::ptr::null_mut(),
            default_region_size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_null()
    }

    /// Map and link a new region sized to hold at least `min_payload` bytes
    /// of usable block space, defaulting to `default_region_size` when that
    /// is larger.
    pub fn acquire(&mut self, min_payload: usize) -> Result<*mut RegionHeader> {
        let header_and_one_block = size_of::<RegionHeader>() + HEADER_SIZE + min_payload;
        let size = self.default_region_size.max(header_and_one_block);

        let (ptr, mapped_len) = mapping::map_anonymous(size)?;
        let header = ptr as *mut RegionHeader;
        let number = self.next_free_number();

        // SAFETY: `ptr` is a fresh mapping at least `size_of::<RegionHeader>()`
        // bytes long, exclusively owned at this point.
        unsafe {
            header.write(RegionHeader {
                size: mapped_len,
                next: std::ptr::null_mut(),
                number,
            });
        }

        match self.last_mut() {
            Some(tail) => unsafe { (*tail).next = header },
            None => self.head = header,
        }

        log::info!(
            "mfalloc: acquired region #{number} ({mapped_len} bytes, requested >= {min_payload})"
        );

        Ok(header)
    }

    /// Unmap and unlink the region with the given number.
    pub fn release(&mut self, number: u32) -> Result<()> {
        let mut prev: *mut RegionHeader = std::ptr::null_mut();
        let mut node = self.head;

        while !node.is_null() {
            // SAFETY: `node` comes from walking the list this manager owns.
            let (node_number, node_next, node_size) =
                unsafe { ((*node).number, (*node).next, (*node).size) };

            if node_number == number {
                if prev.is_null() {
                    self.head = node_next;
                } else {
                    unsafe { (*prev).next = node_next };
                }
                // SAFETY: `node` was mapped by `acquire` with this exact
                // base/length pair and is being removed from the list, so
                // nothing else can reach it afterward.
                unsafe { mapping::unmap(node as *mut u8, node_size)? };
                log::info!("mfalloc: released region #{number} ({node_size} bytes)");
                return Ok(());
            }

            prev = node;
            node = node_next;
        }

        Ok(())
    }

    pub fn lookup(&self, number: u32) -> Option<*mut RegionHeader> {
        let mut node = self.head;
        while !node.is_null() {
            let (node_number, node_next) = unsafe { ((*node).number, (*node).next) };
            if node_number == number {
                return Some(node);
            }
            node = node_next;
        }
        None
    }

    /// Address one past the last byte of the region with the given number.
    pub fn region_end(&self, number: u32) -> Option<usize> {
        self.lookup(number)
            .map(|r| unsafe { r as usize + (*r).size })
    }

    pub fn last(&self) -> Option<*mut RegionHeader> {
        self.last_mut()
    }

    fn last_mut(&self) -> Option<*mut RegionHeader> {
        if self.head.is_null() {
            return None;
        }
        let mut node = self.head;
        loop {
            let next = unsafe { (*node).next };
            if next.is_null() {
                return Some(node);
            }
            node = next;
        }
    }

    pub fn count(&self) -> usize {
        let mut n = 0;
        let mut node = self.head;
        while !node.is_null() {
            n += 1;
            node = unsafe { (*node).next };
        }
        n
    }

    /// Smallest non-negative integer not currently assigned to a live
    /// region. Converges in at most `count() + 1` full passes over the
    /// list: each pass either confirms the candidate is free or bumps it
    /// past a collision and rescans.
    fn next_free_number(&self) -> u32 {
        let mut candidate: u32 = 0;
        loop {
            let mut restarted = false;
            let mut node = self.head;
            while !node.is_null() {
                let (number, next) = unsafe { ((*node).number, (*node).next) };
                if number == candidate {
                    candidate += 1;
                    restarted = true;
                }
                node = next;
            }
            if !restarted {
                return candidate;
            }
        }
    }
}

impl Drop for RegionManager {
    fn drop(&mut self) {
        let mut node = self.head;
        while !node.is_null() {
            let (next, size) = unsafe { ((*node).next, (*node).size) };
            // SAFETY: every region on this list was mapped by `acquire` with
            // exactly this base/length pair, and the manager owns it exclusively.
            if let Err(e) = unsafe { mapping::unmap(node as *mut u8, size) } {
                log::error!("mfalloc: failed to unmap region during destroy: {e}");
            }
            node = next;
        }
        self.head = std::ptr::null_mut();
    }
}
