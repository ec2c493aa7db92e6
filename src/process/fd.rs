//! Descriptor Table
//!
//! Maps small integer handles to open files for one process. Only the
//! owning process's syscalls ever touch it, so it needs no lock.
//!
//! # Design
//! - Growable vector of optional slots; the slot index is the handle
//! - Slots 0 and 1 are the console and never hold a file
//! - `allocate` hands out the lowest free handle, so closed numbers are
//!   reused by later opens

use alloc::vec::Vec;
use core::fmt;

use crate::config::{FIRST_FD, MAX_OPEN_FILES};

/// A descriptor handle as seen by user programs.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct Fd(i32);

impl Fd {
    /// Standard input (console keyboard).
    pub const STDIN: Self = Self(0);

    /// Standard output (console screen).
    pub const STDOUT: Self = Self(1);

    /// Create a handle from a raw user value.
    ///
    /// Returns None for negative values.
    #[inline]
    pub const fn new(raw: i32) -> Option<Self> {
        if raw >= 0 {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Get the raw value.
    #[inline]
    pub const fn as_raw(self) -> i32 {
        self.0
    }

    /// Check if this is one of the console handles.
    #[inline]
    pub const fn is_console(self) -> bool {
        self.0 < FIRST_FD
    }

    #[inline]
    const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Fd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for descriptor table operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdError {
    /// The handle is a console handle.
    Reserved,
    /// No file is open under this handle.
    NotOpen,
    /// The process already holds `MAX_OPEN_FILES` files.
    TableFull,
}

impl fmt::Display for FdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reserved => write!(f, "console handle"),
            Self::NotOpen => write!(f, "handle not open"),
            Self::TableFull => write!(f, "too many open files"),
        }
    }
}

/// Per-process descriptor table.
#[derive(Debug)]
pub struct FdTable<F> {
    slots: Vec<Option<F>>,
    open: usize,
}

impl<F> FdTable<F> {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            open: 0,
        }
    }

    /// Number of open files.
    #[inline]
    pub fn len(&self) -> usize {
        self.open
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.open == 0
    }

    /// Install `file` under the lowest free handle.
    ///
    /// On failure the file is handed back so the caller decides how to
    /// close it.
    pub fn allocate(&mut self, file: F) -> Result<Fd, (FdError, F)> {
        if self.open >= MAX_OPEN_FILES {
            return Err((FdError::TableFull, file));
        }

        let first = FIRST_FD as usize;
        let free = self
            .slots
            .iter()
            .enumerate()
            .skip(first)
            .find(|(_, slot)| slot.is_none())
            .map(|(i, _)| i);

        let index = match free {
            Some(i) => i,
            None => {
                if self.slots.len() < first {
                    self.slots.resize_with(first, || None);
                }
                self.slots.push(None);
                self.slots.len() - 1
            }
        };

        self.slots[index] = Some(file);
        self.open += 1;
        Ok(Fd(index as i32))
    }

    /// Look up an open file.
    pub fn get(&self, fd: Fd) -> Result<&F, FdError> {
        if fd.is_console() {
            return Err(FdError::Reserved);
        }
        self.slots
            .get(fd.index())
            .and_then(Option::as_ref)
            .ok_or(FdError::NotOpen)
    }

    /// Look up an open file for mutation.
    pub fn get_mut(&mut self, fd: Fd) -> Result<&mut F, FdError> {
        if fd.is_console() {
            return Err(FdError::Reserved);
        }
        self.slots
            .get_mut(fd.index())
            .and_then(Option::as_mut)
            .ok_or(FdError::NotOpen)
    }

    /// Remove a file from the table and return it.
    ///
    /// The handle becomes invalid immediately and may be handed out again.
    pub fn release(&mut self, fd: Fd) -> Result<F, FdError> {
        if fd.is_console() {
            return Err(FdError::Reserved);
        }
        let file = self
            .slots
            .get_mut(fd.index())
            .and_then(Option::take)
            .ok_or(FdError::NotOpen)?;
        self.open -= 1;

        while matches!(self.slots.last(), Some(None)) && self.slots.len() > FIRST_FD as usize {
            self.slots.pop();
        }
        Ok(file)
    }

    /// Drop every open file. Used on process exit.
    pub fn close_all(&mut self) {
        self.slots.clear();
        self.open = 0;
    }
}

impl<F> Default for FdTable<F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fd(raw: i32) -> Fd {
        Fd::new(raw).unwrap()
    }

    #[test]
    fn test_handles_start_after_console() {
        let mut table = FdTable::new();
        let handles: Vec<Fd> = (0..5)
            .map(|i| table.allocate(i).map_err(|(e, _)| e).unwrap())
            .collect();

        assert_eq!(handles.iter().map(|h| h.as_raw()).collect::<Vec<_>>(), [2, 3, 4, 5, 6]);
        assert_eq!(table.len(), 5);
        assert_eq!(table.get(fd(4)), Ok(&2));
    }

    #[test]
    fn test_console_handles_rejected() {
        let mut table: FdTable<u32> = FdTable::new();
        assert_eq!(table.get(Fd::STDIN), Err(FdError::Reserved));
        assert_eq!(table.get_mut(Fd::STDOUT), Err(FdError::Reserved));
        assert_eq!(table.release(Fd::STDIN), Err(FdError::Reserved));
        assert!(Fd::new(-1).is_none());
    }

    #[test]
    fn test_release_invalidates_and_reuses() {
        let mut table = FdTable::new();
        let a = table.allocate("a").map_err(|(e, _)| e).unwrap();
        let b = table.allocate("b").map_err(|(e, _)| e).unwrap();

        assert_eq!(table.release(a), Ok("a"));
        assert_eq!(table.get(a), Err(FdError::NotOpen));
        assert_eq!(table.release(a), Err(FdError::NotOpen));

        let c = table.allocate("c").map_err(|(e, _)| e).unwrap();
        assert_eq!(c, a);
        assert_eq!(table.get(b), Ok(&"b"));
        assert_eq!(table.get(fd(99)), Err(FdError::NotOpen));
    }

    #[test]
    fn test_release_last_shrinks() {
        let mut table = FdTable::new();
        let a = table.allocate(1u8).map_err(|(e, _)| e).unwrap();
        table.release(a).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.allocate(2u8).map_err(|(e, _)| e).unwrap(), a);
    }

    #[test]
    fn test_table_full_returns_file() {
        let mut table = FdTable::new();
        for i in 0..MAX_OPEN_FILES {
            assert!(table.allocate(i).is_ok());
        }
        match table.allocate(usize::MAX) {
            Err((FdError::TableFull, file)) => assert_eq!(file, usize::MAX),
            other => panic!("unexpected {:?}", other.map_err(|(e, _)| e)),
        }
    }

    #[test]
    fn test_close_all() {
        let mut table = FdTable::new();
        let a = table.allocate(()).map_err(|(e, _)| e).unwrap();
        table.allocate(()).map_err(|(e, _)| e).unwrap();
        table.close_all();
        assert!(table.is_empty());
        assert_eq!(table.get(a), Err(FdError::NotOpen));
    }
}
