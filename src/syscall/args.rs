//! Argument Marshaling
//!
//! Arguments sit on the user stack right above the call number:
//!
//! ```text
//!   esp + 12  │ arg 2 │
//!   esp +  8  │ arg 1 │
//!   esp +  4  │ arg 0 │
//!   esp       │  no.  │
//! ```
//!
//! Only the slots are validated here. Pointer arguments are validated
//! again by the operation that dereferences them.

use crate::config::{MAX_SYSCALL_ARGS, WORD_SIZE};
use crate::mm::UserMemory;

use super::handler::Fault;
use super::validate::read_word;

/// Untyped argument words for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Args {
    words: [u32; MAX_SYSCALL_ARGS],
    len: usize,
}

impl Args {
    /// Number of words fetched.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Raw word `i`, or 0 if it was not marshaled.
    #[inline]
    pub fn word(&self, i: usize) -> u32 {
        debug_assert!(i < self.len, "argument {} not marshaled", i);
        if i < self.len {
            self.words[i]
        } else {
            0
        }
    }

    /// Word `i` as a signed integer (status, handle, pid).
    #[inline]
    pub fn int(&self, i: usize) -> i32 {
        self.word(i) as i32
    }

    /// Word `i` as an unsigned size or position.
    #[inline]
    pub fn uint(&self, i: usize) -> u32 {
        self.word(i)
    }

    /// Word `i` as a user pointer (not yet validated).
    #[inline]
    pub fn ptr(&self, i: usize) -> usize {
        self.word(i) as usize
    }
}

/// Fetch `count` argument words above `esp`, validating each slot.
pub fn marshal<M: UserMemory + ?Sized>(mem: &M, esp: usize, count: usize) -> Result<Args, Fault> {
    debug_assert!(count <= MAX_SYSCALL_ARGS);

    let mut args = Args::default();
    for i in 0..count.min(MAX_SYSCALL_ARGS) {
        let slot = (i + 1)
            .checked_mul(WORD_SIZE)
            .and_then(|offset| esp.checked_add(offset))
            .ok_or(Fault::BadAddress(esp))?;
        args.words[i] = read_word(mem, slot)?;
        args.len = i + 1;
    }
    Ok(args)
}
