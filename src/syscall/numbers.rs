//! System call numbers
//!
//! The number is the word at the user stack pointer; the arguments follow
//! it, one word each.

use super::handler::Fault;

/// Every call the kernel accepts.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syscall {
    /// Power the machine off.
    Halt = 0,
    /// Terminate the calling process.
    Exit = 1,
    /// Start a child process and wait for it to load.
    Exec = 2,
    /// Wait for a child to exit and collect its status.
    Wait = 3,
    Create = 4,
    Remove = 5,
    Open = 6,
    Filesize = 7,
    Read = 8,
    Write = 9,
    Seek = 10,
    Tell = 11,
    Close = 12,
}

impl Syscall {
    /// Number of argument words the call takes.
    pub const fn arity(self) -> usize {
        match self {
            Self::Halt => 0,
            Self::Exit
            | Self::Exec
            | Self::Wait
            | Self::Remove
            | Self::Open
            | Self::Filesize
            | Self::Tell
            | Self::Close => 1,
            Self::Create | Self::Seek => 2,
            Self::Read | Self::Write => 3,
        }
    }
}

impl TryFrom<u32> for Syscall {
    type Error = Fault;

    fn try_from(no: u32) -> Result<Self, Self::Error> {
        Ok(match no {
            0 => Self::Halt,
            1 => Self::Exit,
            2 => Self::Exec,
            3 => Self::Wait,
            4 => Self::Create,
            5 => Self::Remove,
            6 => Self::Open,
            7 => Self::Filesize,
            8 => Self::Read,
            9 => Self::Write,
            10 => Self::Seek,
            11 => Self::Tell,
            12 => Self::Close,
            _ => return Err(Fault::UnknownSyscall(no)),
        })
    }
}
