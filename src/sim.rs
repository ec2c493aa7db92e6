//! Host-side stand-ins for the kernel collaborators.
//!
//! Sparse user memory, an in-memory file system, a capturing console and a
//! scheduler that runs scripted child programs on `std::thread`.

use std::collections::{HashMap, VecDeque};
use std::string::String;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use std::vec::Vec;

use crate::kernel::{Console, FileSystem, OpenFile, Scheduler, WaitQueue};
use crate::mm::{UserAddr, UserMemory};
use crate::process::{ChildRecord, Pid, Process};

/// Byte-addressed user memory; untouched bytes read as zero.
#[derive(Default)]
pub struct SimMemory {
    bytes: Mutex<HashMap<usize, u8>>,
}

impl SimMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poke(&self, addr: usize, data: &[u8]) {
        let mut bytes = self.bytes.lock().unwrap();
        for (i, b) in data.iter().enumerate() {
            bytes.insert(addr + i, *b);
        }
    }

    pub fn poke_words(&self, addr: usize, words: &[u32]) {
        for (i, w) in words.iter().enumerate() {
            self.poke(addr + i * 4, &w.to_le_bytes());
        }
    }

    pub fn peek(&self, addr: usize, len: usize) -> Vec<u8> {
        let bytes = self.bytes.lock().unwrap();
        (addr..addr + len).map(|a| bytes.get(&a).copied().unwrap_or(0)).collect()
    }
}

impl UserMemory for SimMemory {
    fn read(&self, addr: UserAddr, dst: &mut [u8]) {
        let bytes = self.bytes.lock().unwrap();
        for (i, b) in dst.iter_mut().enumerate() {
            *b = bytes.get(&(addr.as_usize() + i)).copied().unwrap_or(0);
        }
    }

    fn write(&self, addr: UserAddr, src: &[u8]) {
        let mut bytes = self.bytes.lock().unwrap();
        for (i, b) in src.iter().enumerate() {
            bytes.insert(addr.as_usize() + i, *b);
        }
    }
}

#[derive(Default)]
struct ConsoleState {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

/// Console with scripted keyboard input and captured output.
#[derive(Clone, Default)]
pub struct SimConsole {
    state: Arc<Mutex<ConsoleState>>,
}

impl SimConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn type_keys(&self, keys: &[u8]) {
        self.state.lock().unwrap().input.extend(keys.iter().copied());
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.state.lock().unwrap().output).into_owned()
    }
}

impl Console for SimConsole {
    fn read_char(&self) -> u8 {
        loop {
            if let Some(c) = self.state.lock().unwrap().input.pop_front() {
                return c;
            }
            thread::yield_now();
        }
    }

    fn write(&self, bytes: &[u8]) {
        self.state.lock().unwrap().output.extend_from_slice(bytes);
    }
}

/// Tracks how many file transfers run at the same moment.
#[derive(Default)]
struct TransferProbe {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl TransferProbe {
    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        // Widen the window in which an overlapping transfer would be seen.
        thread::yield_now();
    }

    fn leave(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory flat file system.
#[derive(Clone, Default)]
pub struct SimFs {
    files: Arc<Mutex<HashMap<String, Arc<Mutex<Vec<u8>>>>>>,
    probe: Arc<TransferProbe>,
}

impl SimFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        let files = self.files.lock().unwrap();
        files.get(name).map(|data| data.lock().unwrap().clone())
    }

    /// Highest number of simultaneous read/write bodies observed.
    pub fn peak_transfers(&self) -> usize {
        self.probe.peak.load(Ordering::SeqCst)
    }
}

impl FileSystem for SimFs {
    type File = SimFile;

    fn create(&self, name: &str, initial_size: u32) -> bool {
        let mut files = self.files.lock().unwrap();
        if name.is_empty() || files.contains_key(name) {
            return false;
        }
        let data = std::vec![0u8; initial_size as usize];
        files.insert(name.into(), Arc::new(Mutex::new(data)));
        true
    }

    fn remove(&self, name: &str) -> bool {
        self.files.lock().unwrap().remove(name).is_some()
    }

    fn open(&self, name: &str) -> Option<SimFile> {
        let files = self.files.lock().unwrap();
        files.get(name).map(|data| SimFile {
            data: Arc::clone(data),
            pos: 0,
            probe: Arc::clone(&self.probe),
        })
    }
}

pub struct SimFile {
    data: Arc<Mutex<Vec<u8>>>,
    pos: u32,
    probe: Arc<TransferProbe>,
}

impl OpenFile for SimFile {
    fn length(&self) -> u32 {
        self.data.lock().unwrap().len() as u32
    }

    fn read(&mut self, buf: &mut [u8]) -> u32 {
        self.probe.enter();
        let data = self.data.lock().unwrap();
        let start = (self.pos as usize).min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        drop(data);
        self.pos += n as u32;
        self.probe.leave();
        n as u32
    }

    fn write(&mut self, buf: &[u8]) -> u32 {
        self.probe.enter();
        let mut data = self.data.lock().unwrap();
        let start = self.pos as usize;
        if data.len() < start + buf.len() {
            data.resize(start + buf.len(), 0);
        }
        data[start..start + buf.len()].copy_from_slice(buf);
        drop(data);
        self.pos += buf.len() as u32;
        self.probe.leave();
        buf.len() as u32
    }

    fn seek(&mut self, position: u32) {
        self.pos = position;
    }

    fn tell(&self) -> u32 {
        self.pos
    }
}

/// How a scripted child program behaves once spawned.
#[derive(Clone, Copy, Debug)]
pub struct Program {
    /// Whether the image loads.
    pub loads: bool,
    /// Status passed to exit after loading.
    pub status: i32,
    /// Time spent running before exit.
    pub run_for: Duration,
    /// Burn the CPU for `run_for` instead of sleeping.
    pub busy: bool,
}

/// Scheduler running each spawned program on its own thread.
#[derive(Clone, Default)]
pub struct SimScheduler {
    programs: Arc<Mutex<HashMap<String, Program>>>,
    console: SimConsole,
    next_pid: Arc<AtomicI32>,
    powered_off: Arc<AtomicUsize>,
    parking: Arc<(Mutex<()>, Condvar)>,
    parks: Arc<AtomicUsize>,
}

impl SimScheduler {
    pub fn new(console: SimConsole) -> Self {
        Self {
            console,
            next_pid: Arc::new(AtomicI32::new(2)),
            ..Self::default()
        }
    }

    pub fn install(&self, name: &str, program: Program) {
        self.programs.lock().unwrap().insert(name.into(), program);
    }

    pub fn powered_off(&self) -> bool {
        self.powered_off.load(Ordering::SeqCst) > 0
    }

    /// Number of times a thread was handed to `block`.
    pub fn parks(&self) -> usize {
        self.parks.load(Ordering::SeqCst)
    }
}

impl Scheduler for SimScheduler {
    fn spawn(&self, cmd_line: &str) -> Option<Arc<ChildRecord>> {
        let name = cmd_line.split_whitespace().next()?;
        let program = self.programs.lock().unwrap().get(name).copied();
        let pid = Pid::new(self.next_pid.fetch_add(1, Ordering::SeqCst));
        let record = Arc::new(ChildRecord::new(pid));

        let mut child: Process<SimFile> = Process::spawned(cmd_line, Arc::clone(&record));
        let console = self.console.clone();
        let sched = self.clone();
        thread::spawn(move || match program {
            Some(program) if program.loads => {
                child.finish_load(true, &sched);
                if program.busy {
                    let deadline = Instant::now() + program.run_for;
                    while Instant::now() < deadline {
                        std::hint::spin_loop();
                    }
                } else {
                    thread::sleep(program.run_for);
                }
                child.exit(program.status, &console, &sched);
            }
            _ => {
                child.finish_load(false, &sched);
                child.exit(-1, &console, &sched);
            }
        });

        Some(record)
    }

    fn power_off(&self) {
        self.powered_off.fetch_add(1, Ordering::SeqCst);
    }

    fn block(&self, queue: &WaitQueue, ticket: usize) {
        self.parks.fetch_add(1, Ordering::SeqCst);
        let (lock, parked) = &*self.parking;
        let mut guard = lock.lock().unwrap();
        while !queue.notified_since(ticket) {
            guard = parked.wait(guard).unwrap();
        }
    }

    fn wake_all(&self, _queue: &WaitQueue) {
        let (lock, parked) = &*self.parking;
        let _guard = lock.lock().unwrap();
        parked.notify_all();
    }
}
