//! Kernel Collaborators
//!
//! The syscall layer does not own a file system, a scheduler or a console.
//! It reaches them through the traits below, implemented by the rest of
//! the kernel (and by the simulation harness in tests).

use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::process::ChildRecord;

/// Register state captured when a user program executes the syscall trap.
///
/// The call number and arguments are not in here: they live on the user
/// stack at `esp` and are fetched through the marshaler.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrapFrame {
    /// User stack pointer at trap time.
    pub esp: usize,
    /// Result register, written back to the user program.
    pub eax: u32,
}

impl TrapFrame {
    pub const fn new(esp: usize) -> Self {
        Self { esp, eax: 0 }
    }

    /// Result register reinterpreted as the signed value user code sees.
    #[inline]
    pub const fn result(&self) -> i32 {
        self.eax as i32
    }
}

/// A file opened through [`FileSystem::open`].
///
/// Closing is dropping. The file keeps its own cursor.
pub trait OpenFile: Send {
    /// File length in bytes.
    fn length(&self) -> u32;

    /// Read at the cursor, advancing it. Returns bytes read.
    fn read(&mut self, buf: &mut [u8]) -> u32;

    /// Write at the cursor, advancing it. Returns bytes written.
    fn write(&mut self, buf: &[u8]) -> u32;

    /// Move the cursor. Positions past the end are allowed.
    fn seek(&mut self, position: u32);

    /// Current cursor position.
    fn tell(&self) -> u32;
}

/// The file system.
///
/// Name-level operations must be safe to call from several processes at
/// once; transfers on an [`OpenFile`] are serialized by the syscall layer.
pub trait FileSystem: Sync {
    type File: OpenFile;

    fn create(&self, name: &str, initial_size: u32) -> bool;

    fn remove(&self, name: &str) -> bool;

    fn open(&self, name: &str) -> Option<Self::File>;
}

/// Console device backing handles 0 and 1.
pub trait Console: Sync {
    /// Block until one character is typed.
    fn read_char(&self) -> u8;

    fn write(&self, bytes: &[u8]);
}

/// `core::fmt` adapter over a [`Console`].
pub struct ConsoleWriter<'a>(pub &'a dyn Console);

impl fmt::Write for ConsoleWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write(s.as_bytes());
        Ok(())
    }
}

/// A readiness signal threads block on.
///
/// The queue only counts notifications. The parked threads themselves are
/// kept by the [`Scheduler`], keyed by the queue's address.
#[derive(Debug, Default)]
pub struct WaitQueue {
    epoch: AtomicUsize,
}

impl WaitQueue {
    pub const fn new() -> Self {
        Self {
            epoch: AtomicUsize::new(0),
        }
    }

    /// Take a ticket. Must happen before the awaited condition is checked.
    #[inline]
    pub fn ticket(&self) -> usize {
        self.epoch.load(Ordering::Acquire)
    }

    /// Whether the queue was notified after `ticket` was taken.
    #[inline]
    pub fn notified_since(&self, ticket: usize) -> bool {
        self.epoch.load(Ordering::Acquire) != ticket
    }

    /// Publish a notification and wake everything parked on the queue.
    pub fn notify_all<S: Scheduler + ?Sized>(&self, sched: &S) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        sched.wake_all(self);
    }
}

/// Thread and process management.
pub trait Scheduler: Sync {
    /// Start a new process running `cmd_line`.
    ///
    /// The returned record is shared with the new process, which must
    /// call `Process::finish_load` once its image is loaded (or fails to
    /// load) and `Process::exit` when it terminates. Returns None if no process could be created at all.
    fn spawn(&self, cmd_line: &str) -> Option<Arc<ChildRecord>>;

    /// Shut the machine down.
    fn power_off(&self);

    /// Park the calling thread on `queue`.
    ///
    /// Returns at once if `queue.notified_since(ticket)`. Otherwise the
    /// thread must not run again before `wake_all(queue)`. Spurious
    /// returns are allowed; callers re-check their condition.
    fn block(&self, queue: &WaitQueue, ticket: usize);

    /// Make every thread parked on `queue` runnable again.
    fn wake_all(&self, queue: &WaitQueue);
}
