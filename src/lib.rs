//! PantherOS User-Program Boundary
//!
//! The trusted path between untrusted user programs and the kernel:
//! system call dispatch, user pointer validation, per-process descriptor
//! tables and the exec/wait rendezvous between parents and children.
//!
//! # Security Features
//! - Every user address is range-checked before it is dereferenced
//! - A bad address kills the offending process, never the kernel
//! - Descriptor tables are owned by their process (`&mut Process`)
//! - File transfers are serialized by one global file lock
//!
//! # Architecture
//! - `syscall`: dispatcher, marshaler, validator
//! - `process`: descriptor table, child records, exit path
//! - `kernel`: collaborator traits implemented by the rest of the kernel
//! - `fixed_point`: 17.14 arithmetic used by the scheduler

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

pub mod config;
pub mod fixed_point;
pub mod kernel;
pub mod logger;
pub mod mm;
pub mod process;
pub mod syscall;

#[cfg(test)]
mod sim;

use log::SetLoggerError;

pub use kernel::{Console, FileSystem, OpenFile, Scheduler, TrapFrame, WaitQueue};
pub use process::{ChildRecord, Fd, Pid, Process};
pub use syscall::{Control, Dispatcher, Fault};

/// Bring up the heap and kernel logging.
///
/// Called once during boot, before the first user process starts.
pub fn init(console: &'static dyn Console) -> Result<(), SetLoggerError> {
    mm::init_heap();
    logger::init(console, config::DEFAULT_LOG_LEVEL)?;
    log::info!("[BOOT] Heap initialized ({} KiB)", mm::heap_size() / 1024);
    Ok(())
}
