//! # thinlite
//!
//! A minimal, allocation-conscious driver over the SQLite C API.
//!
//! ## Core Types
//!
//! - **[`Connection`]**: Owns the native database handle; opens lazily and is disposed exactly once
//! - **[`Command`]**: A compiled statement that can be executed repeatedly
//! - **[`Parameters`]**: Positional and named binding with copy/no-copy lifetime hints
//! - **[`Reader`]**: Steps a statement and exposes typed column accessors
//! - **[`Error`]**: Error type carrying SQLite result codes and diagnostics
//!
//! ## Lifecycle
//!
//! ```text
//! Connection ──create_command()──▶ Command ──execute_reader()──▶ Reader
//!                                      │                           │
//!                                  finalize()            dispose(): reset
//!
//! Connection ──execute_reader()──▶ Reader ── dispose(): finalize
//! ```
//!
//! Readers are released before commands, and commands before their
//! connection; borrows enforce this order. Text crosses into SQLite through
//! pooled scratch buffers from [`thinlite_scratch`], so binding UTF-16 values
//! or looking up parameter names does not allocate once the pool is warm.

mod command;
mod config;
mod connection;
mod error;
mod ffi;
mod parameters;
mod reader;
mod text;

pub use command::Command;
pub use config::ConnectionConfig;
pub use connection::{Connection, MEMORY};
pub use error::{Error, Result};
pub use ffi::status;
pub use parameters::Parameters;
pub use reader::{ColumnType, Cursor, Reader};
pub use text::{Param, SqlText};
pub use thinlite_scratch::{PoolConfig, ScratchPool};
