//! User Processes
//!
//! The per-process state the syscall layer works on: descriptor table,
//! the records of spawned children, the process's own record (if it was
//! spawned by another process) and its exit status.
//!
//! # Ownership
//! - The descriptor table is only reachable through `&mut Process`, i.e.
//!   from the owning process's own syscalls
//! - Child records are shared with exactly one other process via `Arc`

pub mod fd;
pub mod record;

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt::Write;

use crate::kernel::{Console, ConsoleWriter, Scheduler};

pub use fd::{Fd, FdError, FdTable};
pub use record::{ChildRecord, ChildState, Pid};

/// A user process as seen from its own syscalls.
#[derive(Debug)]
pub struct Process<F> {
    pid: Pid,
    name: String,
    files: FdTable<F>,
    children: Vec<Arc<ChildRecord>>,
    record: Option<Arc<ChildRecord>>,
    exit_status: Option<i32>,
}

impl<F> Process<F> {
    /// Create a process with no parent (the initial process).
    pub fn new(pid: Pid, name: &str) -> Self {
        Self {
            pid,
            name: name.to_string(),
            files: FdTable::new(),
            children: Vec::new(),
            record: None,
            exit_status: None,
        }
    }

    /// Create the process for a spawned command line.
    ///
    /// The name is the first word of the command line; `record` is the one
    /// the scheduler returned to the parent from `spawn`.
    pub fn spawned(cmd_line: &str, record: Arc<ChildRecord>) -> Self {
        let name = cmd_line.split_whitespace().next().unwrap_or("");
        let mut process = Self::new(record.pid(), name);
        process.record = Some(record);
        process
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn files(&self) -> &FdTable<F> {
        &self.files
    }

    #[inline]
    pub fn files_mut(&mut self) -> &mut FdTable<F> {
        &mut self.files
    }

    /// Exit status, once the process has exited.
    #[inline]
    pub fn exit_status(&self) -> Option<i32> {
        self.exit_status
    }

    #[inline]
    pub fn has_exited(&self) -> bool {
        self.exit_status.is_some()
    }

    /// Signal the parent that loading finished.
    ///
    /// Called by the loader after the program image is (or is not) in
    /// place. A failed load must be followed by `exit(-1)`.
    pub fn finish_load(&self, success: bool, sched: &dyn Scheduler) {
        if let Some(record) = &self.record {
            record.finish_load(success, sched);
        }
    }

    /// Remember a child whose load succeeded so it can be waited on.
    pub fn adopt(&mut self, child: Arc<ChildRecord>) {
        self.children.push(child);
    }

    /// Take the record of child `pid` out of the child list.
    ///
    /// After this the child is no longer waitable.
    pub fn reap(&mut self, pid: Pid) -> Option<Arc<ChildRecord>> {
        let index = self.children.iter().position(|c| c.pid() == pid)?;
        Some(self.children.swap_remove(index))
    }

    /// Number of children that can still be waited on.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Terminate the process.
    ///
    /// Records the status, prints the exit line, closes every open file,
    /// orphans the children and publishes the status to the parent. Only
    /// the first call has an effect.
    pub fn exit(&mut self, status: i32, console: &dyn Console, sched: &dyn Scheduler) {
        if self.exit_status.is_some() {
            return;
        }
        self.exit_status = Some(status);

        let _ = writeln!(ConsoleWriter(console), "{}: exit({})", self.name, status);
        log::debug!("process {} ({}) exited with {}", self.pid, self.name, status);

        self.files.close_all();
        self.children.clear();
        if let Some(record) = self.record.take() {
            record.exit(status, sched);
        }
    }
}
