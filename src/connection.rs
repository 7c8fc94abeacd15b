//! SQLite connection and its lifecycle

use std::cell::Cell;

use thinlite_scratch::{ScratchPool, Utf8Scratch};
use tracing::{debug, trace, warn};

use crate::command::Command;
use crate::config::ConnectionConfig;
use crate::ffi::{self, DbHandle, StmtHandle, status};
use crate::reader::{Disposal, Reader};
use crate::text::SqlText;
use crate::{Error, Result};

/// Path that opens a private, in-memory database.
pub const MEMORY: &str = ":memory:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
   Unopened,
   Open(DbHandle),
   Disposed,
}

/// A connection to one SQLite database.
///
/// ## State Management
///
/// ```text
/// Unopened ──open()/first use──▶ Open ──dispose()──▶ Disposed
///     └──────────────dispose()──────────────────────────┘
/// ```
///
/// - The native handle exists exactly while the connection is `Open`.
/// - `dispose()` runs once; a second call fails with
///   [`Error::UseAfterDispose`], as does every other method afterwards.
/// - Dropping an undisposed connection disposes it.
///
/// Commands and readers borrow the connection, so they cannot outlive it.
/// `dispose()` takes `&self`, which lets a caller dispose the connection while
/// commands still exist; those commands then fail with `UseAfterDispose`, and
/// the statements they held are finalized by the connection itself.
///
/// ```
/// use thinlite::Connection;
///
/// let conn = Connection::in_memory();
/// conn.execute_non_query("CREATE TABLE t (id INTEGER PRIMARY KEY, val TEXT)")?;
///
/// let mut insert = conn.create_command("INSERT INTO t (val) VALUES ($val)")?;
/// insert.parameters().bind_text("$val", "foo")?;
/// insert.execute_non_query()?;
/// insert.finalize()?;
///
/// let mut reader = conn.execute_reader("SELECT val FROM t")?;
/// assert!(reader.read()?);
/// assert_eq!(reader.get_string(0)?, "foo");
/// # Ok::<(), thinlite::Error>(())
/// ```
#[derive(Debug)]
pub struct Connection {
   path: String,
   config: ConnectionConfig,
   scratch: ScratchPool,
   state: Cell<State>,
}

// SAFETY: The bundled SQLite is compiled thread-safe, so a connection handle
// may move to another thread. Cell<State> keeps Connection !Sync, so it is
// never used from two threads at once.
unsafe impl Send for Connection {}

impl Connection {
   /// Create an unopened connection to the database at `path`.
   pub fn new(path: impl Into<String>) -> Self {
      Self::with_config(path, ConnectionConfig::default())
   }

   /// Create an unopened connection to a private in-memory database.
   pub fn in_memory() -> Self {
      Self::new(MEMORY)
   }

   pub fn with_config(path: impl Into<String>, config: ConnectionConfig) -> Self {
      Self {
         path: path.into(),
         config,
         scratch: ScratchPool::shared().clone(),
         state: Cell::new(State::Unopened),
      }
   }

   /// Use `pool` instead of the shared pool for encoding scratch buffers.
   pub fn with_scratch_pool(mut self, pool: ScratchPool) -> Self {
      self.scratch = pool;
      self
   }

   pub fn path(&self) -> &str {
      &self.path
   }

   pub fn config(&self) -> &ConnectionConfig {
      &self.config
   }

   pub fn is_open(&self) -> bool {
      matches!(self.state.get(), State::Open(_))
   }

   pub fn is_disposed(&self) -> bool {
      self.state.get() == State::Disposed
   }

   /// Open the database. Does nothing if already open.
   pub fn open(&self) -> Result<()> {
      match self.state.get() {
         State::Disposed => return Err(Error::UseAfterDispose),
         State::Open(_) => return Ok(()),
         State::Unopened => {}
      }

      let path = Utf8Scratch::with_nul(&self.scratch, self.path.as_bytes());
      let Some(c_path) = path.as_c_str() else {
         return Err(Error::Open {
            code: status::SQLITE_CANTOPEN,
            path: self.path.clone(),
            message: "path contains an interior NUL byte".into(),
         });
      };

      let db = ffi::open(c_path, self.config.open_flags()).map_err(|failure| Error::Open {
         code: failure.code,
         path: self.path.clone(),
         message: failure.message,
      })?;

      debug!(path = %self.path, "Opened SQLite database");
      self.state.set(State::Open(db));
      Ok(())
   }

   /// Compile `sql` into a reusable command, opening the database if needed.
   ///
   /// UTF-8 text (`&str`, `&[u8]`) is compiled with `sqlite3_prepare_v2`,
   /// UTF-16 text (`&[u16]`) with `sqlite3_prepare16_v2`.
   pub fn create_command<'t>(&self, sql: impl Into<SqlText<'t>>) -> Result<Command<'_>> {
      let stmt = self.prepare(sql.into())?;
      Ok(Command::new(self, stmt))
   }

   /// Compile and run `sql` to completion, returning how many result rows it
   /// produced (not how many rows it changed; see [`Connection::changes`]).
   pub fn execute_non_query<'t>(&self, sql: impl Into<SqlText<'t>>) -> Result<usize> {
      let mut command = self.create_command(sql)?;
      let rows = command.execute_non_query()?;
      command.finalize()?;
      Ok(rows)
   }

   /// Compile `sql` and return a reader over its results. The statement is
   /// finalized when the reader is disposed.
   pub fn execute_reader<'t>(&self, sql: impl Into<SqlText<'t>>) -> Result<Reader<'_>> {
      let stmt = self.prepare(sql.into())?;
      Ok(Reader::new(self, stmt, Disposal::Finalize))
   }

   /// Rows changed by the most recent INSERT, UPDATE or DELETE.
   pub fn changes(&self) -> Result<u64> {
      let db = self.handle()?;
      Ok(u64::try_from(ffi::changes(db)).unwrap_or_default())
   }

   /// Rowid of the most recent successful INSERT on this connection.
   pub fn last_insert_rowid(&self) -> Result<i64> {
      Ok(ffi::last_insert_rowid(self.handle()?))
   }

   /// Number of statements prepared on this connection and not yet finalized.
   pub fn pending_statements(&self) -> Result<usize> {
      match self.state.get() {
         State::Disposed => Err(Error::UseAfterDispose),
         State::Unopened => Ok(0),
         State::Open(db) => {
            let mut count = 0;
            let mut cursor = ffi::next_stmt(db, None);
            while let Some(stmt) = cursor {
               count += 1;
               cursor = ffi::next_stmt(db, Some(stmt));
            }
            Ok(count)
         }
      }
   }

   /// Close the database and mark the connection disposed.
   ///
   /// Any statement still prepared on the connection is finalized first.
   /// Fails with [`Error::UseAfterDispose`] when called a second time.
   pub fn dispose(&self) -> Result<()> {
      let state = self.state.replace(State::Disposed);
      match state {
         State::Disposed => Err(Error::UseAfterDispose),
         State::Unopened => Ok(()),
         State::Open(db) => {
            let outstanding = finalize_outstanding(db);
            if outstanding > 0 {
               warn!(
                  path = %self.path,
                  count = outstanding,
                  "Finalized statements still open at dispose"
               );
            }

            let code = ffi::close(db);
            if code == status::SQLITE_OK {
               debug!(path = %self.path, "Closed SQLite database");
            } else {
               warn!(path = %self.path, code, "Closing SQLite database reported a failure");
            }
            Ok(())
         }
      }
   }

   pub(crate) fn ensure_not_disposed(&self) -> Result<()> {
      if self.is_disposed() {
         return Err(Error::UseAfterDispose);
      }
      Ok(())
   }

   /// The native handle, opening the database on first use.
   fn handle(&self) -> Result<DbHandle> {
      self.open()?;
      match self.state.get() {
         State::Open(db) => Ok(db),
         _ => Err(Error::UseAfterDispose),
      }
   }

   /// The connection's current diagnostic text.
   pub(crate) fn error_message(&self) -> String {
      match self.state.get() {
         State::Open(db) => ffi::errmsg(db),
         _ => String::new(),
      }
   }

   pub(crate) fn scratch(&self) -> &ScratchPool {
      &self.scratch
   }

   fn prepare(&self, sql: SqlText<'_>) -> Result<StmtHandle> {
      let db = self.handle()?;
      let prepared = match sql {
         SqlText::Utf8(sql) => ffi::prepare(db, sql),
         SqlText::Utf16(sql) => ffi::prepare16(db, sql),
      };

      match prepared {
         Ok(Some(stmt)) => {
            trace!("Prepared statement");
            Ok(stmt)
         }
         Ok(None) => Err(Error::EmptyStatement),
         Err(failure) => Err(Error::Prepare {
            code: failure.code,
            message: failure.message,
         }),
      }
   }
}

impl Drop for Connection {
   fn drop(&mut self) {
      if !self.is_disposed() {
         let _ = self.dispose();
      }
   }
}

fn finalize_outstanding(db: DbHandle) -> usize {
   let mut count = 0;
   while let Some(stmt) = ffi::next_stmt(db, None) {
      ffi::finalize(stmt);
      count += 1;
   }
   count
}
