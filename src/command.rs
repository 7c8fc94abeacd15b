//! Prepared commands

use tracing::trace;

use crate::connection::Connection;
use crate::ffi::{self, StmtHandle, status};
use crate::parameters::Parameters;
use crate::reader::{Disposal, Reader};
use crate::{Error, Result};

/// A compiled SQL statement that can be bound and executed repeatedly.
///
/// The command owns its native statement until [`Command::finalize`] (or drop).
/// Finalizing consumes the command, so it cannot be used, or finalized, again:
///
/// ```compile_fail
/// let conn = thinlite::Connection::in_memory();
/// let mut command = conn.create_command("SELECT 1")?;
/// command.finalize()?;
/// command.execute_non_query()?;
/// # Ok::<(), thinlite::Error>(())
/// ```
///
/// Executing borrows the command mutably for as long as the reader lives, so
/// only one reader can walk the statement at a time:
///
/// ```compile_fail
/// let conn = thinlite::Connection::in_memory();
/// let mut command = conn.create_command("SELECT 1")?;
/// let first = command.execute_reader()?;
/// let second = command.execute_reader()?;
/// drop(first);
/// # Ok::<(), thinlite::Error>(())
/// ```
#[must_use = "if unused, the statement is immediately finalized"]
pub struct Command<'c> {
   conn: &'c Connection,
   stmt: StmtHandle,
   finalized: bool,
}

impl<'c> Command<'c> {
   pub(crate) fn new(conn: &'c Connection, stmt: StmtHandle) -> Self {
      Self {
         conn,
         stmt,
         finalized: false,
      }
   }

   /// Binder for this command's parameters.
   pub fn parameters(&self) -> Parameters<'_> {
      Parameters::new(self.conn, self.stmt)
   }

   /// Run the statement to completion and rewind it for the next execution.
   ///
   /// Returns the number of result rows stepped through, which is 0 for
   /// INSERT, UPDATE and DELETE. Bindings are kept.
   pub fn execute_non_query(&mut self) -> Result<usize> {
      self.conn.ensure_not_disposed()?;

      let mut reader = self.execute_reader()?;
      let mut rows = 0;
      while reader.read()? {
         rows += 1;
      }
      Ok(rows)
   }

   /// Start executing the statement. The statement is reset, not finalized,
   /// when the reader is disposed, so the command stays usable.
   pub fn execute_reader(&mut self) -> Result<Reader<'_>> {
      self.conn.ensure_not_disposed()?;
      Ok(Reader::new(self.conn, self.stmt, Disposal::Reset))
   }

   /// The SQL text this command was compiled from.
   pub fn sql(&self) -> Result<String> {
      self.conn.ensure_not_disposed()?;
      Ok(ffi::sql(self.stmt))
   }

   /// Destroy the native statement. A non-success status from SQLite is
   /// reported as [`Error::Finalize`]; the statement is released either way.
   ///
   /// Readers reset the statement when they are released, which clears the
   /// error of a failed step, so that error is not reported again here.
   pub fn finalize(mut self) -> Result<()> {
      self.conn.ensure_not_disposed()?;

      self.finalized = true;
      let code = ffi::finalize(self.stmt);
      if code != status::SQLITE_OK {
         return Err(Error::Finalize { code });
      }
      trace!("Finalized command");
      Ok(())
   }
}

impl std::fmt::Debug for Command<'_> {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("Command")
         .field("path", &self.conn.path())
         .field("finalized", &self.finalized)
         .finish()
   }
}

impl Drop for Command<'_> {
   fn drop(&mut self) {
      // A disposed connection has already finalized every statement it held.
      if self.finalized || self.conn.is_disposed() {
         return;
      }
      let code = ffi::finalize(self.stmt);
      trace!(code, "Finalized dropped command");
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_sql_round_trips() {
      let conn = Connection::in_memory();
      let command = conn.create_command("SELECT 42").unwrap();
      assert_eq!(command.sql().unwrap(), "SELECT 42");
   }

   #[test]
   fn test_drop_finalizes() {
      let conn = Connection::in_memory();
      {
         let _command = conn.create_command("SELECT 1").unwrap();
         assert_eq!(conn.pending_statements().unwrap(), 1);
      }
      assert_eq!(conn.pending_statements().unwrap(), 0);
   }

   #[test]
   fn test_finalize_releases_statement() {
      let conn = Connection::in_memory();
      let command = conn.create_command("SELECT 1").unwrap();
      command.finalize().unwrap();
      assert_eq!(conn.pending_statements().unwrap(), 0);
   }

   #[test]
   fn test_execute_non_query_counts_rows_not_changes() {
      let conn = Connection::in_memory();
      conn
         .execute_non_query("CREATE TABLE t (id INTEGER PRIMARY KEY)")
         .unwrap();

      let mut insert = conn.create_command("INSERT INTO t DEFAULT VALUES").unwrap();
      assert_eq!(insert.execute_non_query().unwrap(), 0);
      assert_eq!(insert.execute_non_query().unwrap(), 0);
      assert_eq!(conn.changes().unwrap(), 1);

      let mut select = conn.create_command("SELECT id FROM t").unwrap();
      assert_eq!(select.execute_non_query().unwrap(), 2);
   }

   #[test]
   fn test_finalize_after_failed_step_succeeds() {
      let conn = Connection::in_memory();
      conn
         .execute_non_query("CREATE TABLE t (id INTEGER PRIMARY KEY)")
         .unwrap();
      conn.execute_non_query("INSERT INTO t VALUES (1)").unwrap();

      let mut insert = conn.create_command("INSERT INTO t VALUES (1)").unwrap();
      let err = insert.execute_non_query().unwrap_err();
      assert!(matches!(err, Error::Step { .. }));
      assert_eq!(insert.finalize(), Ok(()));
      assert_eq!(conn.pending_statements().unwrap(), 0);
   }

   #[test]
   fn test_execute_non_query_counts_every_row_after_reader_released() {
      let conn = Connection::in_memory();
      conn.execute_non_query("CREATE TABLE t (v TEXT)").unwrap();
      conn
         .execute_non_query("INSERT INTO t VALUES ('foo'), ('bar')")
         .unwrap();

      let mut select = conn.create_command("SELECT v FROM t").unwrap();
      {
         let mut reader = select.execute_reader().unwrap();
         assert!(reader.read().unwrap());
      }
      assert_eq!(select.execute_non_query().unwrap(), 2);

      let mut reader = select.execute_reader().unwrap();
      assert!(reader.read().unwrap());
      assert_eq!(reader.get_string(0).unwrap(), "foo");
   }
}
