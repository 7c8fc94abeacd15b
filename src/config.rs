//! Configuration for SQLite connections

use std::ffi::c_int;

use libsqlite3_sys as sys;
use serde::{Deserialize, Serialize};

/// Configuration for a [`Connection`](crate::Connection)
///
/// # Examples
///
/// ```
/// use thinlite::ConnectionConfig;
///
/// // Use defaults
/// let config = ConnectionConfig::default();
///
/// // Override just one field
/// let config = ConnectionConfig {
///    read_only: true,
///    ..Default::default()
/// };
/// assert!(config.create_if_missing);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
   /// Open the database read-only
   ///
   /// Default: false
   pub read_only: bool,

   /// Create the database file if it does not exist
   ///
   /// Ignored for read-only connections.
   ///
   /// Default: true
   pub create_if_missing: bool,

   /// Interpret the path as a `file:` URI
   ///
   /// Default: false
   pub uri_filenames: bool,

   /// Treat step results other than ROW, DONE, ERROR and MISUSE as the end of
   /// the result set instead of raising [`Error::Step`](crate::Error::Step)
   ///
   /// With `sqlite3_prepare_v2` SQLite reports specific codes such as
   /// `SQLITE_CONSTRAINT` or `SQLITE_BUSY` straight from step, so enabling this
   /// hides those failures from the caller.
   ///
   /// Default: false
   pub lenient_step_status: bool,
}

impl Default for ConnectionConfig {
   fn default() -> Self {
      Self {
         read_only: false,
         create_if_missing: true,
         uri_filenames: false,
         lenient_step_status: false,
      }
   }
}

impl ConnectionConfig {
   /// Flags for `sqlite3_open_v2`.
   pub(crate) fn open_flags(&self) -> c_int {
      let mut flags = if self.read_only {
         sys::SQLITE_OPEN_READONLY
      } else if self.create_if_missing {
         sys::SQLITE_OPEN_READWRITE | sys::SQLITE_OPEN_CREATE
      } else {
         sys::SQLITE_OPEN_READWRITE
      };

      if self.uri_filenames {
         flags |= sys::SQLITE_OPEN_URI;
      }
      flags
   }
}
