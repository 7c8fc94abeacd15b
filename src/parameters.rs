//! Parameter binding for prepared commands

use std::ffi::c_int;

use thinlite_scratch::Utf8Scratch;
use tracing::debug;

use crate::connection::Connection;
use crate::ffi::{self, StmtHandle, status};
use crate::text::{Param, SqlText};
use crate::{Error, Result};

/// Binds values to the parameters of one command.
///
/// Parameters are addressed by 1-based position or by name. A name that
/// matches no parameter resolves to index 0, exactly as SQLite's own lookup
/// does; SQLite then rejects the bind with `SQLITE_RANGE`, reported as
/// [`Error::Bind`].
///
/// ## Copy or borrow
///
/// `bind_text` and `bind_blob` ask SQLite to copy the value
/// (`SQLITE_TRANSIENT`), so any borrowed buffer will do. The `bind_static_*`
/// variants skip that copy (`SQLITE_STATIC`) and therefore only accept
/// `'static` data, which stays put for as long as SQLite may read it.
///
/// UTF-16 text and names are transcoded into pooled scratch buffers that are
/// released as soon as the bind call returns.
#[derive(Debug, Clone, Copy)]
pub struct Parameters<'s> {
   conn: &'s Connection,
   stmt: StmtHandle,
}

impl<'s> Parameters<'s> {
   pub(crate) fn new(conn: &'s Connection, stmt: StmtHandle) -> Self {
      Self { conn, stmt }
   }

   /// Number of parameter slots in the statement (the largest index in use).
   pub fn count(&self) -> Result<usize> {
      self.conn.ensure_not_disposed()?;
      Ok(usize::try_from(ffi::bind_parameter_count(self.stmt)).unwrap_or_default())
   }

   /// Reset every parameter to NULL.
   pub fn clear(&self) -> Result<()> {
      self.conn.ensure_not_disposed()?;
      check(ffi::clear_bindings(self.stmt))
   }

   /// Index of the named parameter, or 0 when there is none.
   pub fn index_of<'n>(&self, name: impl Into<SqlText<'n>>) -> Result<i32> {
      self.resolve(Param::Name(name.into()))
   }

   /// Name of the parameter at `index`, or `None` for a nameless (`?`)
   /// parameter or an index out of range.
   pub fn name_of(&self, index: i32) -> Result<Option<String>> {
      self.conn.ensure_not_disposed()?;
      Ok(ffi::bind_parameter_name(self.stmt, index))
   }

   pub fn bind_int<'n>(&self, param: impl Into<Param<'n>>, value: i32) -> Result<()> {
      let index = self.resolve(param.into())?;
      check(ffi::bind_int(self.stmt, index, value))
   }

   pub fn bind_int64<'n>(&self, param: impl Into<Param<'n>>, value: i64) -> Result<()> {
      let index = self.resolve(param.into())?;
      check(ffi::bind_int64(self.stmt, index, value))
   }

   pub fn bind_double<'n>(&self, param: impl Into<Param<'n>>, value: f64) -> Result<()> {
      let index = self.resolve(param.into())?;
      check(ffi::bind_double(self.stmt, index, value))
   }

   pub fn bind_null<'n>(&self, param: impl Into<Param<'n>>) -> Result<()> {
      let index = self.resolve(param.into())?;
      check(ffi::bind_null(self.stmt, index))
   }

   /// Bind text, copied by SQLite before this call returns.
   ///
   /// UTF-16 text is re-encoded as UTF-8 in a pooled buffer first.
   pub fn bind_text<'n, 't>(
      &self,
      param: impl Into<Param<'n>>,
      text: impl Into<SqlText<'t>>,
   ) -> Result<()> {
      let index = self.resolve(param.into())?;
      match text.into() {
         SqlText::Utf8(text) => check(ffi::bind_text(self.stmt, index, text)),
         SqlText::Utf16(text) => {
            let utf8 = Utf8Scratch::from_utf16(self.conn.scratch(), text);
            check(ffi::bind_text(self.stmt, index, utf8.as_bytes()))
         }
      }
   }

   /// Bind text without copying it.
   pub fn bind_static_text<'n>(&self, param: impl Into<Param<'n>>, text: &'static str) -> Result<()> {
      let index = self.resolve(param.into())?;
      check(ffi::bind_static_text(self.stmt, index, text.as_bytes()))
   }

   /// Bind UTF-16 text (native byte order) without copying it.
   pub fn bind_static_text16<'n>(
      &self,
      param: impl Into<Param<'n>>,
      text: &'static [u16],
   ) -> Result<()> {
      let index = self.resolve(param.into())?;
      check(ffi::bind_static_text16(self.stmt, index, text))
   }

   /// Bind a blob, copied by SQLite before this call returns.
   pub fn bind_blob<'n>(&self, param: impl Into<Param<'n>>, blob: &[u8]) -> Result<()> {
      let index = self.resolve(param.into())?;
      check(ffi::bind_blob(self.stmt, index, blob))
   }

   /// Bind a blob without copying it.
   pub fn bind_static_blob<'n>(&self, param: impl Into<Param<'n>>, blob: &'static [u8]) -> Result<()> {
      let index = self.resolve(param.into())?;
      check(ffi::bind_static_blob(self.stmt, index, blob))
   }

   fn resolve(&self, param: Param<'_>) -> Result<c_int> {
      self.conn.ensure_not_disposed()?;

      let name = match param {
         Param::Index(index) => return Ok(index),
         Param::Name(SqlText::Utf8(name)) => Utf8Scratch::with_nul(self.conn.scratch(), name),
         Param::Name(SqlText::Utf16(name)) => {
            Utf8Scratch::from_utf16_with_nul(self.conn.scratch(), name)
         }
      };

      // A name with an interior NUL cannot match any parameter.
      let index = name
         .as_c_str()
         .map_or(0, |c_name| ffi::bind_parameter_index(self.stmt, c_name));

      if index == 0 {
         debug!(
            name = %String::from_utf8_lossy(name.as_bytes()),
            "Parameter name matched no slot"
         );
      }
      Ok(index)
   }
}

fn check(code: c_int) -> Result<()> {
   if code != status::SQLITE_OK {
      return Err(Error::Bind { code });
   }
   Ok(())
}
