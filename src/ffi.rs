//! Native boundary to the SQLite C API.
//!
//! This is the only module that touches raw pointers. Everything above it
//! works with the opaque [`DbHandle`] and [`StmtHandle`] values, which are
//! created only by a successful open/prepare. The wrappers here assume the
//! handle they are given is still live; `Connection` and `Command` uphold that
//! by never reusing a handle after close/finalize.

use std::ffi::{CStr, c_char, c_int, c_void};
use std::ptr::{self, NonNull};
use std::slice;

use libsqlite3_sys as sys;

/// SQLite result codes the driver inspects or reports.
pub mod status {
   pub use libsqlite3_sys::{
      SQLITE_BUSY, SQLITE_CANTOPEN, SQLITE_CONSTRAINT, SQLITE_DONE, SQLITE_ERROR, SQLITE_MISUSE,
      SQLITE_OK, SQLITE_RANGE, SQLITE_ROW, SQLITE_TOOBIG,
   };
}

/// A failed call that the engine described with a diagnostic message.
#[derive(Debug)]
pub(crate) struct Failure {
   pub code: c_int,
   pub message: String,
}

/// Open database connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DbHandle(NonNull<sys::sqlite3>);

/// Compiled statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StmtHandle(NonNull<sys::sqlite3_stmt>);

/// Whether the engine may keep pointing at bound memory (`SQLITE_STATIC`) or
/// must copy it before the bind call returns (`SQLITE_TRANSIENT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifetime {
   Static,
   Transient,
}

impl Lifetime {
   fn destructor(self) -> sys::sqlite3_destructor_type {
      match self {
         Lifetime::Static => sys::SQLITE_STATIC(),
         Lifetime::Transient => sys::SQLITE_TRANSIENT(),
      }
   }
}

// libsqlite3-sys leaves every UTF-16 entry point out of its bindings. The
// bundled engine still exports them, so they are declared here.
unsafe extern "C" {
   fn sqlite3_prepare16_v2(
      db: *mut sys::sqlite3,
      sql: *const c_void,
      n_byte: c_int,
      stmt: *mut *mut sys::sqlite3_stmt,
      tail: *mut *const c_void,
   ) -> c_int;
   fn sqlite3_bind_text16(
      stmt: *mut sys::sqlite3_stmt,
      index: c_int,
      text: *const c_void,
      n_byte: c_int,
      destructor: sys::sqlite3_destructor_type,
   ) -> c_int;
   fn sqlite3_column_text16(stmt: *mut sys::sqlite3_stmt, col: c_int) -> *const c_void;
   fn sqlite3_column_bytes16(stmt: *mut sys::sqlite3_stmt, col: c_int) -> c_int;
   fn sqlite3_column_name16(stmt: *mut sys::sqlite3_stmt, col: c_int) -> *const c_void;
}

pub(crate) fn errstr(code: c_int) -> String {
   // SAFETY: sqlite3_errstr returns a static string for every code.
   unsafe { owned_string(sys::sqlite3_errstr(code)) }
}

/// SAFETY: `ptr` must be null or point at a NUL-terminated string.
unsafe fn owned_string(ptr: *const c_char) -> String {
   if ptr.is_null() {
      return String::new();
   }
   unsafe { CStr::from_ptr(ptr) }
      .to_string_lossy()
      .into_owned()
}

// ============================================================================
// Connection
// ============================================================================

/// Open a database. On failure the half-opened handle SQLite hands back is
/// closed here, so no handle escapes.
pub(crate) fn open(path: &CStr, flags: c_int) -> Result<DbHandle, Failure> {
   let mut db: *mut sys::sqlite3 = ptr::null_mut();
   let code = unsafe { sys::sqlite3_open_v2(path.as_ptr(), &mut db, flags, ptr::null()) };

   match NonNull::new(db) {
      Some(handle) if code == sys::SQLITE_OK => Ok(DbHandle(handle)),
      Some(handle) => {
         let message = errmsg(DbHandle(handle));
         unsafe { sys::sqlite3_close(handle.as_ptr()) };
         Err(Failure { code, message })
      }
      None => {
         // Only happens when SQLite cannot allocate the connection object.
         let code = if code == sys::SQLITE_OK {
            sys::SQLITE_NOMEM
         } else {
            code
         };
         Err(Failure {
            code,
            message: errstr(code),
         })
      }
   }
}

pub(crate) fn close(db: DbHandle) -> c_int {
   unsafe { sys::sqlite3_close(db.0.as_ptr()) }
}

/// The connection's most recent diagnostic. The returned text is owned by
/// SQLite, so it is copied and never freed here.
pub(crate) fn errmsg(db: DbHandle) -> String {
   unsafe { owned_string(sys::sqlite3_errmsg(db.0.as_ptr())) }
}

pub(crate) fn changes(db: DbHandle) -> c_int {
   unsafe { sys::sqlite3_changes(db.0.as_ptr()) }
}

pub(crate) fn last_insert_rowid(db: DbHandle) -> i64 {
   unsafe { sys::sqlite3_last_insert_rowid(db.0.as_ptr()) }
}

/// Iterate the statements still prepared on `db`.
pub(crate) fn next_stmt(db: DbHandle, prev: Option<StmtHandle>) -> Option<StmtHandle> {
   let prev = prev.map_or(ptr::null_mut(), |s| s.0.as_ptr());
   NonNull::new(unsafe { sys::sqlite3_next_stmt(db.0.as_ptr(), prev) }).map(StmtHandle)
}

// ============================================================================
// Prepare
// ============================================================================

/// Compile UTF-8 SQL. `Ok(None)` means the text held no statement.
pub(crate) fn prepare(db: DbHandle, sql: &[u8]) -> Result<Option<StmtHandle>, Failure> {
   let len = byte_len(sql.len()).ok_or_else(too_big)?;
   let mut stmt: *mut sys::sqlite3_stmt = ptr::null_mut();
   let code = unsafe {
      sys::sqlite3_prepare_v2(
         db.0.as_ptr(),
         sql.as_ptr().cast::<c_char>(),
         len,
         &mut stmt,
         ptr::null_mut(),
      )
   };
   prepared(db, code, stmt)
}

/// Compile UTF-16 SQL (native byte order). `Ok(None)` means the text held no
/// statement.
pub(crate) fn prepare16(db: DbHandle, sql: &[u16]) -> Result<Option<StmtHandle>, Failure> {
   let len = sql
      .len()
      .checked_mul(2)
      .and_then(byte_len)
      .ok_or_else(too_big)?;
   let mut stmt: *mut sys::sqlite3_stmt = ptr::null_mut();
   let code = unsafe {
      sqlite3_prepare16_v2(
         db.0.as_ptr(),
         sql.as_ptr().cast::<c_void>(),
         len,
         &mut stmt,
         ptr::null_mut(),
      )
   };
   prepared(db, code, stmt)
}

fn prepared(
   db: DbHandle,
   code: c_int,
   stmt: *mut sys::sqlite3_stmt,
) -> Result<Option<StmtHandle>, Failure> {
   if code != sys::SQLITE_OK {
      // SQLite sets *ppStmt to NULL on error; nothing to finalize.
      return Err(Failure {
         code,
         message: errmsg(db),
      });
   }
   Ok(NonNull::new(stmt).map(StmtHandle))
}

fn too_big() -> Failure {
   Failure {
      code: sys::SQLITE_TOOBIG,
      message: errstr(sys::SQLITE_TOOBIG),
   }
}

fn byte_len(len: usize) -> Option<c_int> {
   c_int::try_from(len).ok()
}

// ============================================================================
// Statement lifecycle
// ============================================================================

pub(crate) fn step(stmt: StmtHandle) -> c_int {
   unsafe { sys::sqlite3_step(stmt.0.as_ptr()) }
}

pub(crate) fn reset(stmt: StmtHandle) -> c_int {
   unsafe { sys::sqlite3_reset(stmt.0.as_ptr()) }
}

/// Destroy the statement. The handle must not be used again.
pub(crate) fn finalize(stmt: StmtHandle) -> c_int {
   unsafe { sys::sqlite3_finalize(stmt.0.as_ptr()) }
}

pub(crate) fn sql(stmt: StmtHandle) -> String {
   unsafe { owned_string(sys::sqlite3_sql(stmt.0.as_ptr())) }
}

// ============================================================================
// Binding
// ============================================================================

pub(crate) fn bind_parameter_count(stmt: StmtHandle) -> c_int {
   unsafe { sys::sqlite3_bind_parameter_count(stmt.0.as_ptr()) }
}

/// Index of a named parameter, or 0 when no parameter has that name.
pub(crate) fn bind_parameter_index(stmt: StmtHandle, name: &CStr) -> c_int {
   unsafe { sys::sqlite3_bind_parameter_index(stmt.0.as_ptr(), name.as_ptr()) }
}

pub(crate) fn bind_parameter_name(stmt: StmtHandle, index: c_int) -> Option<String> {
   let ptr = unsafe { sys::sqlite3_bind_parameter_name(stmt.0.as_ptr(), index) };
   (!ptr.is_null()).then(|| unsafe { owned_string(ptr) })
}

pub(crate) fn clear_bindings(stmt: StmtHandle) -> c_int {
   unsafe { sys::sqlite3_clear_bindings(stmt.0.as_ptr()) }
}

pub(crate) fn bind_int(stmt: StmtHandle, index: c_int, value: i32) -> c_int {
   unsafe { sys::sqlite3_bind_int(stmt.0.as_ptr(), index, value) }
}

pub(crate) fn bind_int64(stmt: StmtHandle, index: c_int, value: i64) -> c_int {
   unsafe { sys::sqlite3_bind_int64(stmt.0.as_ptr(), index, value) }
}

pub(crate) fn bind_double(stmt: StmtHandle, index: c_int, value: f64) -> c_int {
   unsafe { sys::sqlite3_bind_double(stmt.0.as_ptr(), index, value) }
}

pub(crate) fn bind_null(stmt: StmtHandle, index: c_int) -> c_int {
   unsafe { sys::sqlite3_bind_null(stmt.0.as_ptr(), index) }
}

/// Bind UTF-8 text; SQLite copies it before returning.
pub(crate) fn bind_text(stmt: StmtHandle, index: c_int, text: &[u8]) -> c_int {
   bind_text_raw(stmt, index, text, Lifetime::Transient)
}

/// Bind UTF-8 text without a copy.
pub(crate) fn bind_static_text(stmt: StmtHandle, index: c_int, text: &'static [u8]) -> c_int {
   bind_text_raw(stmt, index, text, Lifetime::Static)
}

fn bind_text_raw(stmt: StmtHandle, index: c_int, text: &[u8], lifetime: Lifetime) -> c_int {
   let Some(len) = byte_len(text.len()) else {
      return sys::SQLITE_TOOBIG;
   };
   unsafe {
      sys::sqlite3_bind_text(
         stmt.0.as_ptr(),
         index,
         text.as_ptr().cast::<c_char>(),
         len,
         lifetime.destructor(),
      )
   }
}

/// Bind UTF-16 text (native byte order) without a copy.
pub(crate) fn bind_static_text16(stmt: StmtHandle, index: c_int, text: &'static [u16]) -> c_int {
   let Some(len) = text.len().checked_mul(2).and_then(byte_len) else {
      return sys::SQLITE_TOOBIG;
   };
   unsafe {
      sqlite3_bind_text16(
         stmt.0.as_ptr(),
         index,
         text.as_ptr().cast::<c_void>(),
         len,
         Lifetime::Static.destructor(),
      )
   }
}

/// Bind a blob; SQLite copies it before returning.
pub(crate) fn bind_blob(stmt: StmtHandle, index: c_int, blob: &[u8]) -> c_int {
   bind_blob_raw(stmt, index, blob, Lifetime::Transient)
}

/// Bind a blob without a copy.
pub(crate) fn bind_static_blob(stmt: StmtHandle, index: c_int, blob: &'static [u8]) -> c_int {
   bind_blob_raw(stmt, index, blob, Lifetime::Static)
}

fn bind_blob_raw(stmt: StmtHandle, index: c_int, blob: &[u8], lifetime: Lifetime) -> c_int {
   let Some(len) = byte_len(blob.len()) else {
      return sys::SQLITE_TOOBIG;
   };
   unsafe {
      sys::sqlite3_bind_blob(
         stmt.0.as_ptr(),
         index,
         blob.as_ptr().cast::<c_void>(),
         len,
         lifetime.destructor(),
      )
   }
}

// ============================================================================
// Columns
// ============================================================================

pub(crate) fn column_count(stmt: StmtHandle) -> c_int {
   unsafe { sys::sqlite3_column_count(stmt.0.as_ptr()) }
}

pub(crate) fn column_type(stmt: StmtHandle, col: c_int) -> c_int {
   unsafe { sys::sqlite3_column_type(stmt.0.as_ptr(), col) }
}

pub(crate) fn column_int(stmt: StmtHandle, col: c_int) -> i32 {
   unsafe { sys::sqlite3_column_int(stmt.0.as_ptr(), col) }
}

pub(crate) fn column_int64(stmt: StmtHandle, col: c_int) -> i64 {
   unsafe { sys::sqlite3_column_int64(stmt.0.as_ptr(), col) }
}

pub(crate) fn column_double(stmt: StmtHandle, col: c_int) -> f64 {
   unsafe { sys::sqlite3_column_double(stmt.0.as_ptr(), col) }
}

/// Blob value of a column.
///
/// # Safety
///
/// The slice points into SQLite-owned memory that is invalidated by the next
/// step, reset or finalize, or by a text conversion of the same column. The
/// caller must copy out of it before doing any of those.
pub(crate) unsafe fn column_blob<'a>(stmt: StmtHandle, col: c_int) -> &'a [u8] {
   // Pointer first, then length, as the SQLite docs require.
   let ptr = unsafe { sys::sqlite3_column_blob(stmt.0.as_ptr(), col) };
   let len = unsafe { sys::sqlite3_column_bytes(stmt.0.as_ptr(), col) };
   unsafe { raw_slice(ptr.cast::<u8>(), len) }
}

/// UTF-8 text value of a column, without the terminator.
///
/// # Safety
///
/// Same contract as [`column_blob`].
pub(crate) unsafe fn column_text<'a>(stmt: StmtHandle, col: c_int) -> &'a [u8] {
   let ptr = unsafe { sys::sqlite3_column_text(stmt.0.as_ptr(), col) };
   let len = unsafe { sys::sqlite3_column_bytes(stmt.0.as_ptr(), col) };
   unsafe { raw_slice(ptr, len) }
}

/// UTF-16 text value of a column (native byte order), without the terminator.
///
/// # Safety
///
/// Same contract as [`column_blob`].
pub(crate) unsafe fn column_text16<'a>(stmt: StmtHandle, col: c_int) -> &'a [u16] {
   let ptr = unsafe { sqlite3_column_text16(stmt.0.as_ptr(), col) };
   let bytes = unsafe { sqlite3_column_bytes16(stmt.0.as_ptr(), col) };
   unsafe { raw_slice(ptr.cast::<u16>(), bytes / 2) }
}

pub(crate) fn column_name(stmt: StmtHandle, col: c_int) -> Option<String> {
   let ptr = unsafe { sys::sqlite3_column_name(stmt.0.as_ptr(), col) };
   (!ptr.is_null()).then(|| unsafe { owned_string(ptr) })
}

pub(crate) fn column_name16(stmt: StmtHandle, col: c_int) -> Option<Vec<u16>> {
   let ptr = unsafe { sqlite3_column_name16(stmt.0.as_ptr(), col) }.cast::<u16>();
   if ptr.is_null() {
      return None;
   }

   let mut len = 0;
   // SAFETY: SQLite returns a NUL-terminated UTF-16 string.
   while unsafe { *ptr.add(len) } != 0 {
      len += 1;
   }
   Some(unsafe { slice::from_raw_parts(ptr, len) }.to_vec())
}

/// SAFETY: `ptr` must be null or valid for `len` elements.
unsafe fn raw_slice<'a, T>(ptr: *const T, len: c_int) -> &'a [T] {
   match usize::try_from(len) {
      Ok(len) if len > 0 && !ptr.is_null() => unsafe { slice::from_raw_parts(ptr, len) },
      _ => &[],
   }
}
