//! User Virtual Addresses
//!
//! Type-safe wrapper for addresses handed to the kernel by user programs.
//! A `UserAddr` can only be built through a range check, so any function
//! taking one knows the address lies strictly inside user space.
//!
//! # Security Properties
//! - Null and kernel-space addresses cannot be represented
//! - Offset arithmetic is checked and re-validated
//! - Raw pointers are only produced by `mm::user::DirectMemory`

use core::fmt;

use crate::config::{USER_BOTTOM, USER_TOP};

/// Check whether `addr` lies strictly between the lowest usable user
/// address and the top of user space.
#[inline]
pub const fn is_user(addr: usize) -> bool {
    addr > USER_BOTTOM && addr < USER_TOP
}

/// A validated user-space address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct UserAddr(usize);

impl UserAddr {
    /// Create a user address.
    ///
    /// Returns None if the address is outside `(USER_BOTTOM, USER_TOP)`.
    #[inline]
    pub const fn new(addr: usize) -> Option<Self> {
        if is_user(addr) {
            Some(Self(addr))
        } else {
            None
        }
    }

    /// Get the raw address value.
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0
    }

    /// Add an offset, re-checking that the result is still user space.
    #[inline]
    pub const fn checked_add(self, offset: usize) -> Option<Self> {
        match self.0.checked_add(offset) {
            Some(addr) => Self::new(addr),
            None => None,
        }
    }
}

impl fmt::Debug for UserAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserAddr({:#010x})", self.0)
    }
}

impl fmt::Display for UserAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
