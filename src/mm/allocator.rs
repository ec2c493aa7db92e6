//! Kernel Heap Allocator
//!
//! Uses `linked_list_allocator` for heap management. Descriptor tables,
//! child lists and synchronization records all live on this heap.
//!
//! # Memory Layout
//! The heap is a static array of `config::HEAP_SIZE` bytes. It becomes
//! the global allocator only when built with the `kernel-heap` feature
//! (bare metal); host builds keep the system allocator.
//!
//! # Security Considerations
//! - Heap is initialized exactly once
//! - linked_list_allocator provides bounds checking

use core::ptr::addr_of_mut;

use linked_list_allocator::LockedHeap;
use spin::Once;

use crate::config::HEAP_SIZE;

/// Kernel heap instance
#[cfg_attr(all(feature = "kernel-heap", not(test)), global_allocator)]
static ALLOCATOR: LockedHeap = LockedHeap::empty();

/// Static heap memory region
static mut HEAP_MEMORY: [u8; HEAP_SIZE] = [0; HEAP_SIZE];

static HEAP_INIT: Once<()> = Once::new();

/// Initialize the kernel heap
///
/// Safe to call more than once; only the first call hands the region to
/// the allocator.
pub fn init_heap() {
    HEAP_INIT.call_once(|| {
        // SAFETY:
        // - HEAP_MEMORY is a valid static array
        // - `Once` guarantees this runs a single time
        // - No other code accesses HEAP_MEMORY directly
        unsafe {
            let heap_start = addr_of_mut!(HEAP_MEMORY) as *mut u8;
            ALLOCATOR.lock().init(heap_start, HEAP_SIZE);
        }
    });
}

/// Get the size of the kernel heap
pub fn heap_size() -> usize {
    HEAP_SIZE
}

/// Bytes currently handed out by the kernel heap.
pub fn heap_used() -> usize {
    ALLOCATOR.lock().used()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::alloc::Layout;

    #[test]
    fn test_heap_allocates_after_init() {
        init_heap();
        init_heap();

        let layout = Layout::from_size_align(256, 8).unwrap();
        let block = ALLOCATOR.lock().allocate_first_fit(layout).unwrap();
        assert!(heap_used() >= 256);

        // SAFETY: block came from this heap with this layout
        unsafe { ALLOCATOR.lock().deallocate(block, layout) };
        assert_eq!(ALLOCATOR.lock().size(), heap_size());
    }
}
