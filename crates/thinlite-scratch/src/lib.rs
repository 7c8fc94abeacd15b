//! # thinlite-scratch
//!
//! Pooled scratch buffers used by `thinlite` to cross the text-encoding
//! boundary into SQLite without allocating on every call.
//!
//! ## Core Types
//!
//! - **[`ScratchPool`]**: Pool of reusable byte buffers, with a process-wide [`ScratchPool::shared`] instance
//! - **[`ScratchBuffer`]**: RAII guard over a rented buffer, returned to its pool on drop
//! - **[`Utf8Scratch`]**: UTF-16 → UTF-8 (and NUL-terminated UTF-8) encodings held in a rented buffer
//! - **[`PoolConfig`]**: Retention limits for a pool
//!
//! ## Lifetime
//!
//! A rented buffer is valid only inside the scope that rented it. Anything that
//! needs the bytes after that scope ends (for example SQLite binding text with
//! `SQLITE_STATIC`) must not be given a pooled buffer.

mod config;
mod pool;
mod utf8;

pub use config::PoolConfig;
pub use pool::{ScratchBuffer, ScratchPool};
pub use utf8::{Utf8Scratch, utf8_capacity};
