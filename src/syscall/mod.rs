//! System Call Interface
//!
//! Entry point for user programs into the kernel.
//!
//! # Security Model
//! - Whitelist approach: only calls in the number table are accepted
//! - All addresses are validated before use
//! - Invalid addresses terminate the offending process, never the kernel
//!
//! # Calls
//! - 0: halt()
//! - 1: exit(status)
//! - 2: exec(cmd_line) / 3: wait(pid)
//! - 4: create(name, size) / 5: remove(name) / 6: open(name)
//! - 7: filesize(fd) / 8: read(fd, buf, len) / 9: write(fd, buf, len)
//! - 10: seek(fd, pos) / 11: tell(fd) / 12: close(fd)

mod args;
mod handler;
mod numbers;
mod validate;


pub use args::{marshal, Args};
pub use handler::{Control, Dispatcher, Fault};
pub use numbers::Syscall;
pub use validate::{read_user_str, read_word, validate, validate_buffer, validate_transfer, UserBuffer};
