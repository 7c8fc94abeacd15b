//! Row-by-row reading of statement results

use std::ffi::c_int;

use libsqlite3_sys as sys;
use tracing::{debug, trace};

use crate::connection::Connection;
use crate::ffi::{self, StmtHandle, status};
use crate::{Error, Result};

/// Position of a [`Reader`] in its result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
   /// No step has been taken yet.
   BeforeFirst,
   /// A row is available to the column accessors.
   OnRow,
   /// The statement has run to completion (or failed).
   Done,
}

/// Storage class of a column value in the current row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
   Integer,
   Float,
   Text,
   Blob,
   Null,
}

impl ColumnType {
   fn from_raw(raw: c_int) -> Self {
      match raw {
         sys::SQLITE_INTEGER => ColumnType::Integer,
         sys::SQLITE_FLOAT => ColumnType::Float,
         sys::SQLITE_TEXT => ColumnType::Text,
         sys::SQLITE_BLOB => ColumnType::Blob,
         _ => ColumnType::Null,
      }
   }
}

/// What happens to the statement when the reader is disposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposal {
   /// The reader came from `Connection::execute_reader` and owns a one-shot
   /// statement.
   Finalize,
   /// The reader came from a `Command`, which keeps the statement for reuse.
   Reset,
}

/// Steps a statement and exposes the columns of the current row.
///
/// Column accessors fail with [`Error::NoCurrentRow`] unless the last
/// [`Reader::read`] returned `true`. The `try_get_*` accessors copy into a
/// caller buffer and return `Ok(None)`, writing nothing, when the buffer is
/// too small.
///
/// Disposing the reader (or dropping it) resets or finalizes the statement,
/// depending on where the reader came from. If the connection has already been
/// disposed, this is silently skipped.
#[must_use = "if unused, the statement is immediately reset or finalized"]
pub struct Reader<'s> {
   conn: &'s Connection,
   stmt: StmtHandle,
   disposal: Disposal,
   cursor: Cursor,
   released: bool,
}

impl<'s> Reader<'s> {
   pub(crate) fn new(conn: &'s Connection, stmt: StmtHandle, disposal: Disposal) -> Self {
      Self {
         conn,
         stmt,
         disposal,
         cursor: Cursor::BeforeFirst,
         released: false,
      }
   }

   pub fn cursor(&self) -> Cursor {
      self.cursor
   }

   /// Advance to the next row. Returns `false` once the results are exhausted;
   /// further calls keep returning `false` without stepping the statement.
   pub fn read(&mut self) -> Result<bool> {
      self.conn.ensure_not_disposed()?;
      if self.cursor == Cursor::Done {
         return Ok(false);
      }

      match ffi::step(self.stmt) {
         status::SQLITE_ROW => {
            self.cursor = Cursor::OnRow;
            Ok(true)
         }
         status::SQLITE_DONE => {
            self.cursor = Cursor::Done;
            Ok(false)
         }
         status::SQLITE_MISUSE => {
            self.cursor = Cursor::Done;
            Err(Error::Misuse)
         }
         code if code != status::SQLITE_ERROR && self.conn.config().lenient_step_status => {
            debug!(code, "Treating unrecognized step status as end of results");
            self.cursor = Cursor::Done;
            Ok(false)
         }
         code => {
            self.cursor = Cursor::Done;
            Err(Error::Step {
               code,
               message: self.conn.error_message(),
            })
         }
      }
   }

   /// Number of result columns. Valid in any cursor state.
   pub fn column_count(&self) -> Result<usize> {
      self.conn.ensure_not_disposed()?;
      Ok(self.count())
   }

   /// Name of a result column. Valid in any cursor state.
   pub fn get_name(&self, column: usize) -> Result<String> {
      let col = self.column_index(column)?;
      Ok(ffi::column_name(self.stmt, col).unwrap_or_default())
   }

   /// Name of a result column as UTF-16. Valid in any cursor state.
   pub fn get_name_utf16(&self, column: usize) -> Result<Vec<u16>> {
      let col = self.column_index(column)?;
      Ok(ffi::column_name16(self.stmt, col).unwrap_or_default())
   }

   pub fn get_column_type(&self, column: usize) -> Result<ColumnType> {
      let col = self.row_column(column)?;
      Ok(ColumnType::from_raw(ffi::column_type(self.stmt, col)))
   }

   pub fn is_null(&self, column: usize) -> Result<bool> {
      Ok(self.get_column_type(column)? == ColumnType::Null)
   }

   pub fn get_int(&self, column: usize) -> Result<i32> {
      let col = self.row_column(column)?;
      Ok(ffi::column_int(self.stmt, col))
   }

   pub fn get_int64(&self, column: usize) -> Result<i64> {
      let col = self.row_column(column)?;
      Ok(ffi::column_int64(self.stmt, col))
   }

   pub fn get_double(&self, column: usize) -> Result<f64> {
      let col = self.row_column(column)?;
      Ok(ffi::column_double(self.stmt, col))
   }

   /// Column text as UTF-8. NULL reads as an empty string; invalid UTF-8 is
   /// replaced with U+FFFD.
   pub fn get_string(&self, column: usize) -> Result<String> {
      let col = self.row_column(column)?;
      // SAFETY: copied before anything else touches the statement.
      let text = unsafe { ffi::column_text(self.stmt, col) };
      Ok(String::from_utf8_lossy(text).into_owned())
   }

   /// Column text as UTF-16, converted by SQLite.
   pub fn get_string_utf16(&self, column: usize) -> Result<Vec<u16>> {
      let col = self.row_column(column)?;
      // SAFETY: copied before anything else touches the statement.
      Ok(unsafe { ffi::column_text16(self.stmt, col) }.to_vec())
   }

   pub fn get_bytes(&self, column: usize) -> Result<Vec<u8>> {
      let col = self.row_column(column)?;
      // SAFETY: copied before anything else touches the statement.
      Ok(unsafe { ffi::column_blob(self.stmt, col) }.to_vec())
   }

   /// Copy the column's bytes into `destination`.
   pub fn try_get_bytes(&self, column: usize, destination: &mut [u8]) -> Result<Option<usize>> {
      let col = self.row_column(column)?;
      // SAFETY: copied before anything else touches the statement.
      let bytes = unsafe { ffi::column_blob(self.stmt, col) };
      Ok(copy_into(bytes, destination))
   }

   /// Copy the column's UTF-8 text (no terminator) into `destination`.
   pub fn try_get_string(&self, column: usize, destination: &mut [u8]) -> Result<Option<usize>> {
      let col = self.row_column(column)?;
      // SAFETY: copied before anything else touches the statement.
      let text = unsafe { ffi::column_text(self.stmt, col) };
      Ok(copy_into(text, destination))
   }

   /// Copy the column's UTF-16 text (no terminator) into `destination`.
   /// The count returned is in code units.
   pub fn try_get_string_utf16(
      &self,
      column: usize,
      destination: &mut [u16],
   ) -> Result<Option<usize>> {
      let col = self.row_column(column)?;
      // SAFETY: copied before anything else touches the statement.
      let text = unsafe { ffi::column_text16(self.stmt, col) };
      Ok(copy_into(text, destination))
   }

   /// Release the reader now instead of at the end of its scope.
   pub fn dispose(mut self) {
      self.release();
   }

   fn count(&self) -> usize {
      usize::try_from(ffi::column_count(self.stmt)).unwrap_or_default()
   }

   fn column_index(&self, column: usize) -> Result<c_int> {
      self.conn.ensure_not_disposed()?;
      let count = self.count();
      if column >= count {
         return Err(Error::ColumnOutOfRange {
            index: column,
            count,
         });
      }
      // column < count <= c_int::MAX
      Ok(column as c_int)
   }

   fn row_column(&self, column: usize) -> Result<c_int> {
      self.conn.ensure_not_disposed()?;
      if self.cursor != Cursor::OnRow {
         return Err(Error::NoCurrentRow);
      }
      self.column_index(column)
   }

   fn release(&mut self) {
      if self.released {
         return;
      }
      self.released = true;

      if self.conn.is_disposed() {
         return;
      }

      // Both calls echo the last step's error, which read() already reported.
      match self.disposal {
         Disposal::Finalize => {
            let code = ffi::finalize(self.stmt);
            trace!(code, "Finalized reader statement");
         }
         Disposal::Reset => {
            let code = ffi::reset(self.stmt);
            trace!(code, "Reset reader statement");
         }
      }
      self.cursor = Cursor::BeforeFirst;
   }
}

impl std::fmt::Debug for Reader<'_> {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("Reader")
         .field("cursor", &self.cursor)
         .field("disposal", &self.disposal)
         .finish()
   }
}

impl Drop for Reader<'_> {
   fn drop(&mut self) {
      self.release();
   }
}

/// Copy all of `source` into the front of `destination`, or nothing at all.
fn copy_into<T: Copy>(source: &[T], destination: &mut [T]) -> Option<usize> {
   let target = destination.get_mut(..source.len())?;
   target.copy_from_slice(source);
   Some(source.len())
}
