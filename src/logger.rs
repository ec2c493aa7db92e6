//! Kernel Logger
//!
//! Backend for the `log` facade. Lines are written to the console as
//! `[LEVEL] message`.

use core::fmt::Write;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Once;

use crate::kernel::{Console, ConsoleWriter};

struct KernelLogger {
    console: Once<&'static dyn Console>,
}

static LOGGER: KernelLogger = KernelLogger {
    console: Once::new(),
};

impl Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(console) = self.console.get() {
            let _ = writeln!(ConsoleWriter(*console), "[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Install the kernel logger.
///
/// Fails if a logger is already installed.
pub fn init(console: &'static dyn Console, level: LevelFilter) -> Result<(), SetLoggerError> {
    LOGGER.console.call_once(|| console);
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}
