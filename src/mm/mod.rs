//! Memory management module for the user-program boundary
//!
//! Provides:
//! - User address types and the user/kernel split
//! - The `UserMemory` access seam
//! - Kernel heap allocation
//!
//! # Security Principles
//! - User addresses are range-checked before they can be named
//! - Unsafe code is confined to `DirectMemory` and heap setup

pub mod address;
mod allocator;
pub mod user;

pub use address::{is_user, UserAddr};
pub use allocator::{heap_size, heap_used, init_heap};
pub use user::{DirectMemory, UserMemory};
