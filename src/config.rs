//! Kernel configuration constants for the user-program boundary.
//!
//! Everything here is fixed at compile time. The user address layout
//! follows the classic 32-bit split: program images are linked at
//! `USER_BOTTOM`, the kernel owns everything from `USER_TOP` upwards.

use log::LevelFilter;

/// Lowest usable user address. The address itself is not valid.
pub const USER_BOTTOM: usize = 0x0804_8000;

/// Top of user space (first kernel address). Not valid for user access.
pub const USER_TOP: usize = 0xC000_0000;

/// Size of one user ABI word (call number and each argument slot).
pub const WORD_SIZE: usize = 4;

/// Maximum number of argument words any system call takes.
pub const MAX_SYSCALL_ARGS: usize = 3;

/// First descriptor handed out by `open`; 0 and 1 are the console.
pub const FIRST_FD: i32 = 2;

/// Per-process cap on simultaneously open files.
pub const MAX_OPEN_FILES: usize = 128;

/// Longest file name or command line copied in from user space,
/// terminating NUL included.
pub const MAX_USER_STRING: usize = 4096;

/// Kernel bounce buffer size used by `read`/`write`.
pub const IO_CHUNK: usize = 512;

/// Largest byte count one `read`/`write` moves. Counts are returned in a
/// signed register, so anything above would look like the failure value.
pub const MAX_TRANSFER: usize = i32::MAX as usize;

/// Kernel heap size (64 KiB, conservative for testing)
pub const HEAP_SIZE: usize = 64 * 1024;

/// Log level used when the kernel does not ask for another one.
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;
