//! Error types for thinlite

use std::ffi::c_int;

use thiserror::Error;

/// Errors raised by the driver.
///
/// Every variant that originates in SQLite carries the raw result code and,
/// where SQLite supplies one, its diagnostic text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
   /// The database file could not be opened or created.
   #[error("could not open database file '{path}' (code {code}): {message}")]
   Open {
      code: c_int,
      path: String,
      message: String,
   },

   /// SQL text failed to compile.
   #[error("could not prepare statement (code {code}): {message}")]
   Prepare { code: c_int, message: String },

   /// SQL text compiled to nothing (empty, whitespace or only comments).
   #[error("SQL text contains no statement")]
   EmptyStatement,

   /// SQLite rejected a parameter binding.
   #[error("could not bind SQL parameter (code {code})")]
   Bind { code: c_int },

   /// Statement execution failed mid-step.
   #[error("statement step failed (code {code}): {message}")]
   Step { code: c_int, message: String },

   /// The SQLite API was used against its state contract, e.g. stepping a
   /// statement that has already completed without a reset.
   #[error("statement used incorrectly")]
   Misuse,

   /// Finalizing a statement reported a failure.
   #[error("could not finalize SQL statement (code {code})")]
   Finalize { code: c_int },

   /// The connection has been disposed and cannot be used
   #[error("connection has been disposed")]
   UseAfterDispose,

   /// A column was read while the reader was not positioned on a row.
   #[error("reader is not positioned on a row")]
   NoCurrentRow,

   /// Column index outside the statement's result columns.
   #[error("column index {index} out of range ({count} columns)")]
   ColumnOutOfRange { index: usize, count: usize },
}

impl Error {
   /// The SQLite result code behind this error, if there is one.
   pub fn code(&self) -> Option<c_int> {
      match self {
         Error::Open { code, .. }
         | Error::Prepare { code, .. }
         | Error::Bind { code }
         | Error::Step { code, .. }
         | Error::Finalize { code } => Some(*code),
         Error::Misuse => Some(crate::status::SQLITE_MISUSE),
         Error::EmptyStatement
         | Error::UseAfterDispose
         | Error::NoCurrentRow
         | Error::ColumnOutOfRange { .. } => None,
      }
   }
}

/// A type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
