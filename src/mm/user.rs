//! User Memory Access
//!
//! Every byte the kernel reads from or writes to a user program goes
//! through [`UserMemory`]. Callers validate the whole range first (see
//! `syscall::validate`); implementations may assume `addr..addr + len`
//! lies inside user space.

use core::ptr;

use super::address::UserAddr;

/// Byte-level access to the current process's address space.
pub trait UserMemory {
    /// Copy `dst.len()` bytes starting at `addr` into `dst`.
    fn read(&self, addr: UserAddr, dst: &mut [u8]);

    /// Copy `src` into user memory starting at `addr`.
    fn write(&self, addr: UserAddr, src: &[u8]);
}

/// Direct access through the active page tables.
///
/// Used on the trap path, where the faulting process's address space is
/// still installed and user pages are reachable from kernel mode. A host
/// process has nothing mapped in the user window, so only the paths that
/// never dereference can run under the test harness.
#[derive(Debug)]
pub struct DirectMemory {
    _private: (),
}

impl DirectMemory {
    /// # Safety
    /// The caller must guarantee that the current process's address space
    /// is active and that every validated user address is mapped for the
    /// lifetime of the returned value.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl UserMemory for DirectMemory {
    fn read(&self, addr: UserAddr, dst: &mut [u8]) {
        if dst.is_empty() {
            return;
        }
        // SAFETY:
        // - Range was validated to lie in user space by the caller
        // - Mapping is guaranteed by the contract of `DirectMemory::new`
        // - `dst` is a kernel buffer, so the ranges cannot overlap
        unsafe {
            ptr::copy_nonoverlapping(addr.as_usize() as *const u8, dst.as_mut_ptr(), dst.len());
        }
    }

    fn write(&self, addr: UserAddr, src: &[u8]) {
        if src.is_empty() {
            return;
        }
        // SAFETY: Same as `read`, with the user range as destination.
        unsafe {
            ptr::copy_nonoverlapping(src.as_ptr(), addr.as_usize() as *mut u8, src.len());
        }
    }
}
