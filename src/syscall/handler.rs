//! System Call Handler
//!
//! Dispatches system calls and implements individual syscall handlers.
//!
//! # Security Considerations
//! - The call number and every argument slot are validated before they
//!   are read
//! - Pointer arguments are validated again before they are dereferenced
//! - Any invalid address, and any unknown call number, terminates the
//!   calling process with status -1; nothing is returned to it
//! - Every other failure is reported with a sentinel (-1 or false)

use core::fmt;

use log::{debug, trace, warn};
use spin::Mutex;

use crate::config::IO_CHUNK;
use crate::kernel::{Console, FileSystem, OpenFile, Scheduler, TrapFrame};
use crate::mm::UserMemory;
use crate::process::{Fd, Pid, Process};

use super::args::{marshal, Args};
use super::numbers::Syscall;
use super::validate::{read_user_str, read_word, validate_transfer, UserBuffer};

/// Conditions that kill the calling process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// A user address outside user space was about to be dereferenced.
    BadAddress(usize),
    /// The call number is not in the table.
    UnknownSyscall(u32),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadAddress(addr) => write!(f, "invalid user address {:#010x}", addr),
            Self::UnknownSyscall(no) => write!(f, "unknown system call {}", no),
        }
    }
}

/// What the trap path does after a call was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Return to the user program; the result register is set.
    Resume,
    /// The process has exited with this status and must not run again.
    Exit(i32),
    /// The machine is powering off.
    Halt,
}

/// Sentinel for a failed operation.
const FAILED: i32 = -1;

/// System call dispatcher, shared by every process.
///
/// Owns the global file lock: at most one `read` or `write` body on a
/// file runs at any time, system-wide. Console transfers do not take it.
pub struct Dispatcher<FS, S, C> {
    fs: FS,
    sched: S,
    console: C,
    file_lock: Mutex<()>,
}

impl<FS, S, C> Dispatcher<FS, S, C>
where
    FS: FileSystem,
    S: Scheduler,
    C: Console,
{
    pub const fn new(fs: FS, sched: S, console: C) -> Self {
        Self {
            fs,
            sched,
            console,
            file_lock: Mutex::new(()),
        }
    }

    pub fn fs(&self) -> &FS {
        &self.fs
    }

    pub fn scheduler(&self) -> &S {
        &self.sched
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    /// Handle the system call trapped in `frame` for `process`.
    ///
    /// `mem` must give access to `process`'s address space. The result, if
    /// the call produces one, is written to `frame.eax`.
    pub fn dispatch<M: UserMemory + ?Sized>(
        &self,
        process: &mut Process<FS::File>,
        mem: &M,
        frame: &mut TrapFrame,
    ) -> Control {
        match self.try_dispatch(process, mem, frame) {
            Ok(control) => control,
            Err(fault) => {
                warn!("[SYSCALL] {} (pid {}): {}, terminating", process.name(), process.pid(), fault);
                process.exit(FAILED, &self.console, &self.sched);
                Control::Exit(FAILED)
            }
        }
    }

    fn try_dispatch<M: UserMemory + ?Sized>(
        &self,
        process: &mut Process<FS::File>,
        mem: &M,
        frame: &mut TrapFrame,
    ) -> Result<Control, Fault> {
        let call = Syscall::try_from(read_word(mem, frame.esp)?)?;
        let args = marshal(mem, frame.esp, call.arity())?;
        trace!("[SYSCALL] pid {}: {:?}", process.pid(), call);

        let result = match call {
            Syscall::Halt => {
                self.sched.power_off();
                return Ok(Control::Halt);
            }
            Syscall::Exit => {
                let status = args.int(0);
                process.exit(status, &self.console, &self.sched);
                return Ok(Control::Exit(status));
            }
            Syscall::Exec => Some(self.sys_exec(process, mem, args.ptr(0))?),
            Syscall::Wait => Some(self.sys_wait(process, args.int(0))),
            Syscall::Create => Some(self.sys_create(mem, &args)? as i32),
            Syscall::Remove => Some(self.sys_remove(mem, args.ptr(0))? as i32),
            Syscall::Open => Some(self.sys_open(process, mem, args.ptr(0))?),
            Syscall::Filesize => Some(self.sys_filesize(process, args.int(0))),
            Syscall::Read => Some(self.sys_read(process, mem, &args)?),
            Syscall::Write => Some(self.sys_write(process, mem, &args)?),
            Syscall::Seek => {
                self.sys_seek(process, args.int(0), args.uint(1));
                None
            }
            Syscall::Tell => Some(self.sys_tell(process, args.int(0))),
            Syscall::Close => {
                self.sys_close(process, args.int(0));
                None
            }
        };

        if let Some(value) = result {
            frame.eax = value as u32;
        }
        Ok(Control::Resume)
    }

    /// Exec system call
    ///
    /// Spawns `cmd_line` and blocks until the child reports its load
    /// outcome. Only children that loaded become waitable.
    fn sys_exec<M: UserMemory + ?Sized>(
        &self,
        process: &mut Process<FS::File>,
        mem: &M,
        cmd_ptr: usize,
    ) -> Result<i32, Fault> {
        let Some(cmd_line) = read_user_str(mem, cmd_ptr)? else {
            return Ok(FAILED);
        };
        let Some(child) = self.sched.spawn(&cmd_line) else {
            debug!("[SYSCALL] exec: could not spawn '{}'", cmd_line);
            return Ok(FAILED);
        };

        if !child.wait_loaded(&self.sched) {
            debug!("[SYSCALL] exec: '{}' failed to load", cmd_line);
            return Ok(FAILED);
        }

        let pid = child.pid();
        process.adopt(child);
        Ok(pid.as_raw())
    }

    /// Wait system call
    ///
    /// The child's record leaves the child list before blocking, so a
    /// status is handed out at most once.
    fn sys_wait(&self, process: &mut Process<FS::File>, raw_pid: i32) -> i32 {
        match process.reap(Pid::new(raw_pid)) {
            Some(child) => child.wait_exit(&self.sched),
            None => {
                debug!("[SYSCALL] wait: {} is not a waitable child", raw_pid);
                FAILED
            }
        }
    }

    fn sys_create<M: UserMemory + ?Sized>(&self, mem: &M, args: &Args) -> Result<bool, Fault> {
        let Some(name) = read_user_str(mem, args.ptr(0))? else {
            return Ok(false);
        };
        Ok(self.fs.create(&name, args.uint(1)))
    }

    fn sys_remove<M: UserMemory + ?Sized>(&self, mem: &M, name_ptr: usize) -> Result<bool, Fault> {
        let Some(name) = read_user_str(mem, name_ptr)? else {
            return Ok(false);
        };
        Ok(self.fs.remove(&name))
    }

    fn sys_open<M: UserMemory + ?Sized>(
        &self,
        process: &mut Process<FS::File>,
        mem: &M,
        name_ptr: usize,
    ) -> Result<i32, Fault> {
        let Some(name) = read_user_str(mem, name_ptr)? else {
            return Ok(FAILED);
        };
        let Some(file) = self.fs.open(&name) else {
            return Ok(FAILED);
        };

        match process.files_mut().allocate(file) {
            Ok(fd) => Ok(fd.as_raw()),
            Err((err, file)) => {
                warn!("[SYSCALL] open '{}' in pid {}: {}", name, process.pid(), err);
                drop(file);
                Ok(FAILED)
            }
        }
    }

    fn sys_filesize(&self, process: &mut Process<FS::File>, raw_fd: i32) -> i32 {
        lookup(process, raw_fd).map_or(FAILED, |file| file.length() as i32)
    }

    /// Read system call
    ///
    /// Handle 0 reads `size` characters from the console. Any other handle
    /// reads from its file under the global file lock.
    fn sys_read<M: UserMemory + ?Sized>(
        &self,
        process: &mut Process<FS::File>,
        mem: &M,
        args: &Args,
    ) -> Result<i32, Fault> {
        let raw_fd = args.int(0);
        let buf = validate_transfer(args.ptr(1), args.uint(2))?;

        if raw_fd == Fd::STDIN.as_raw() {
            return Ok(self.read_console(mem, &buf));
        }

        let _guard = self.file_lock.lock();
        let Some(file) = lookup(process, raw_fd) else {
            return Ok(FAILED);
        };

        let mut chunk = [0u8; IO_CHUNK];
        let mut total = 0;
        while total < buf.len() {
            let Some(addr) = buf.at(total) else { break };
            let want = (buf.len() - total).min(IO_CHUNK);
            let got = (file.read(&mut chunk[..want]) as usize).min(want);
            mem.write(addr, &chunk[..got]);
            total += got;
            if got < want {
                break;
            }
        }
        Ok(total as i32)
    }

    fn read_console<M: UserMemory + ?Sized>(&self, mem: &M, buf: &UserBuffer) -> i32 {
        let mut chunk = [0u8; IO_CHUNK];
        let mut total = 0;
        while let Some(addr) = buf.at(total) {
            let want = (buf.len() - total).min(IO_CHUNK);
            for byte in &mut chunk[..want] {
                *byte = self.console.read_char();
            }
            mem.write(addr, &chunk[..want]);
            total += want;
        }
        total as i32
    }

    /// Write system call
    ///
    /// Handle 1 goes straight to the console. Any other handle writes to
    /// its file under the global file lock.
    fn sys_write<M: UserMemory + ?Sized>(
        &self,
        process: &mut Process<FS::File>,
        mem: &M,
        args: &Args,
    ) -> Result<i32, Fault> {
        let raw_fd = args.int(0);
        let buf = validate_transfer(args.ptr(1), args.uint(2))?;
        let mut chunk = [0u8; IO_CHUNK];

        if raw_fd == Fd::STDOUT.as_raw() {
            let mut total = 0;
            while let Some(addr) = buf.at(total) {
                let want = (buf.len() - total).min(IO_CHUNK);
                mem.read(addr, &mut chunk[..want]);
                self.console.write(&chunk[..want]);
                total += want;
            }
            return Ok(total as i32);
        }

        let _guard = self.file_lock.lock();
        let Some(file) = lookup(process, raw_fd) else {
            return Ok(FAILED);
        };

        let mut total = 0;
        while let Some(addr) = buf.at(total) {
            let want = (buf.len() - total).min(IO_CHUNK);
            mem.read(addr, &mut chunk[..want]);
            let put = (file.write(&chunk[..want]) as usize).min(want);
            total += put;
            if put < want {
                break;
            }
        }
        Ok(total as i32)
    }

    fn sys_seek(&self, process: &mut Process<FS::File>, raw_fd: i32, position: u32) {
        if let Some(file) = lookup(process, raw_fd) {
            file.seek(position);
        }
    }

    fn sys_tell(&self, process: &mut Process<FS::File>, raw_fd: i32) -> i32 {
        lookup(process, raw_fd).map_or(FAILED, |file| file.tell() as i32)
    }

    fn sys_close(&self, process: &mut Process<FS::File>, raw_fd: i32) {
        let Some(fd) = Fd::new(raw_fd) else { return };
        if let Err(err) = process.files_mut().release(fd) {
            debug!("[SYSCALL] close({}) in pid {}: {}", fd, process.pid(), err);
        }
    }
}

/// Find the open file behind a raw user handle.
fn lookup<F>(process: &mut Process<F>, raw_fd: i32) -> Option<&mut F> {
    let fd = Fd::new(raw_fd)?;
    process.files_mut().get_mut(fd).ok()
}
