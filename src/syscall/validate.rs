//! System Call Input Validation
//!
//! Every user address is checked here before the kernel touches the
//! memory behind it.
//!
//! # Security Principles
//! - Validate ALL inputs before use
//! - Fail-secure: an address outside user space is a fault, and a fault
//!   terminates the process
//! - Prevent common vulnerabilities:
//!   - Buffer overflows (both ends of every range are checked)
//!   - Address wrap-around (checked arithmetic)
//!   - TOCTOU races (data is copied into kernel buffers before use)
//!   - Null pointer dereference (null is never a user address)

use alloc::string::String;
use alloc::vec::Vec;

use crate::config::{MAX_TRANSFER, MAX_USER_STRING, WORD_SIZE};
use crate::mm::{UserAddr, UserMemory};

use super::handler::Fault;

/// Validate a single user address.
#[inline]
pub fn validate(addr: usize) -> Result<UserAddr, Fault> {
    UserAddr::new(addr).ok_or(Fault::BadAddress(addr))
}

/// A validated user-space byte range.
///
/// Constructed only after both ends were validated, so every offset below
/// `len` names a user address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserBuffer {
    start: UserAddr,
    len: usize,
}

impl UserBuffer {
    #[inline]
    pub fn start(&self) -> UserAddr {
        self.start
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Address `offset` bytes into the buffer.
    ///
    /// Returns None when `offset` is past the end.
    pub fn at(&self, offset: usize) -> Option<UserAddr> {
        if offset < self.len {
            self.start.checked_add(offset)
        } else {
            None
        }
    }
}

/// Validate a user-space buffer
///
/// # Security Checks
/// 1. Start address is within user space (even for zero length)
/// 2. Start + length doesn't overflow
/// 3. Last byte is within user space
pub fn validate_buffer(ptr: usize, len: usize) -> Result<UserBuffer, Fault> {
    let start = validate(ptr)?;

    if len > 0 {
        let last = ptr.checked_add(len - 1).ok_or(Fault::BadAddress(ptr))?;
        validate(last)?;
    }

    Ok(UserBuffer { start, len })
}

/// Validate the buffer of a `read` or `write`.
///
/// The whole requested range is checked, then the transfer is capped at
/// `MAX_TRANSFER` bytes so the returned count stays non-negative.
pub fn validate_transfer(ptr: usize, size: u32) -> Result<UserBuffer, Fault> {
    let mut buf = validate_buffer(ptr, size as usize)?;
    buf.len = buf.len.min(MAX_TRANSFER);
    Ok(buf)
}

/// Read one ABI word (little endian).
pub fn read_word<M: UserMemory + ?Sized>(mem: &M, addr: usize) -> Result<u32, Fault> {
    let buf = validate_buffer(addr, WORD_SIZE)?;
    let mut bytes = [0u8; WORD_SIZE];
    mem.read(buf.start(), &mut bytes);
    Ok(u32::from_le_bytes(bytes))
}

/// Copy a NUL-terminated string in from user space.
///
/// Each byte's address is validated before it is read, so a string
/// running off the end of user space faults at the first bad byte.
/// Returns `Ok(None)` if the string is longer than `MAX_USER_STRING` or
/// is not UTF-8; that is an ordinary failure, not a fault.
pub fn read_user_str<M: UserMemory + ?Sized>(mem: &M, ptr: usize) -> Result<Option<String>, Fault> {
    let mut bytes = Vec::new();

    for offset in 0..MAX_USER_STRING {
        let addr = ptr.checked_add(offset).ok_or(Fault::BadAddress(ptr))?;
        let addr = validate(addr)?;

        let mut byte = [0u8; 1];
        mem.read(addr, &mut byte);
        if byte[0] == 0 {
            return Ok(String::from_utf8(bytes).ok());
        }
        bytes.push(byte[0]);
    }

    Ok(None)
}
