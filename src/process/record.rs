//! Child Synchronization Record
//!
//! Shared between a child process and its parent through an `Arc`. The
//! record outlives whichever side lets go last: the parent drops its
//! reference when `wait` reaps the child (or when the parent exits), the
//! child drops its reference when it terminates.
//!
//! # Lifecycle
//! ```text
//!  SPAWNING ──finish_load(ok)──▶ LOADED ──exit(status)──▶ EXITED
//!      │                                                    ▲
//!      └──────────────── exit(status) before load ──────────┘
//!                        (reported to exec as a failed load)
//! ```
//! Each transition happens at most once; later attempts are ignored.

use bitflags::bitflags;
use spin::Mutex;

use crate::kernel::{Scheduler, WaitQueue};

bitflags! {
    /// Progress flags of a child process.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChildState: u8 {
        /// The load outcome is known (readiness signal raised).
        const LOADED = 1 << 0;
        /// The program image loaded successfully.
        const LOAD_OK = 1 << 1;
        /// The child terminated and its exit status is set.
        const EXITED = 1 << 2;
    }
}

/// A process identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct Pid(i32);

impl Pid {
    #[inline]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_raw(self) -> i32 {
        self.0
    }
}

impl core::fmt::Display for Pid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
struct Inner {
    state: ChildState,
    exit_status: i32,
}

/// Load and exit rendezvous between a child and its parent.
#[derive(Debug)]
pub struct ChildRecord {
    pid: Pid,
    inner: Mutex<Inner>,
    waiters: WaitQueue,
}

impl ChildRecord {
    pub const fn new(pid: Pid) -> Self {
        Self {
            pid,
            inner: Mutex::new(Inner {
                state: ChildState::empty(),
                exit_status: 0,
            }),
            waiters: WaitQueue::new(),
        }
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ChildState {
        self.inner.lock().state
    }

    /// Raise the readiness signal with the load outcome.
    ///
    /// Returns false if the outcome was already published.
    pub fn finish_load<S: Scheduler + ?Sized>(&self, success: bool, sched: &S) -> bool {
        {
            let mut inner = self.inner.lock();
            if inner.state.contains(ChildState::LOADED) {
                return false;
            }
            inner.state.insert(ChildState::LOADED);
            inner.state.set(ChildState::LOAD_OK, success);
        }
        self.waiters.notify_all(sched);
        true
    }

    /// Publish the exit status.
    ///
    /// A child that never signalled its load outcome is reported as a
    /// failed load so a parent blocked in `exec` is released. Returns
    /// false if an exit status was already published.
    pub fn exit<S: Scheduler + ?Sized>(&self, status: i32, sched: &S) -> bool {
        {
            let mut inner = self.inner.lock();
            if inner.state.contains(ChildState::EXITED) {
                return false;
            }
            inner.state.insert(ChildState::LOADED | ChildState::EXITED);
            inner.exit_status = status;
        }
        self.waiters.notify_all(sched);
        true
    }

    /// Block until the load outcome is known and return it.
    pub fn wait_loaded<S: Scheduler + ?Sized>(&self, sched: &S) -> bool {
        self.block_until(sched, |inner| {
            inner
                .state
                .contains(ChildState::LOADED)
                .then(|| inner.state.contains(ChildState::LOAD_OK))
        })
    }

    /// Block until the child has exited and return its status.
    pub fn wait_exit<S: Scheduler + ?Sized>(&self, sched: &S) -> i32 {
        self.block_until(sched, |inner| {
            inner.state.contains(ChildState::EXITED).then_some(inner.exit_status)
        })
    }

    fn block_until<S, T>(&self, sched: &S, ready: impl Fn(&Inner) -> Option<T>) -> T
    where
        S: Scheduler + ?Sized,
    {
        loop {
            let ticket = self.waiters.ticket();
            if let Some(value) = ready(&*self.inner.lock()) {
                return value;
            }
            sched.block(&self.waiters, ticket);
        }
    }
}
