/// Result type alias for toolkit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for toolkit operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Error from the driver.
   #[error(transparent)]
   Driver(#[from] thinlite::Error),

   /// More values were supplied than a statement can have parameters.
   #[error("{0} values supplied, more than any statement can bind")]
   TooManyValues(usize),

   /// Multiple rows returned from fetch_one query.
   #[error("fetch_one() query returned {0} rows, expected 0 or 1")]
   MultipleRowsReturned(usize),

   /// Transaction failed and rollback also failed.
   #[error("transaction failed: {transaction_error}; rollback also failed: {rollback_error}")]
   TransactionRollbackFailed {
      transaction_error: String,
      rollback_error: String,
   },

   /// Generic error for operations that don't fit other categories.
   #[error("{0}")]
   Other(String),
}

impl Error {
   /// Extract a structured error code from the error type.
   ///
   /// Driver errors that carry a SQLite result code are reported as
   /// `SQLITE_<code>`.
   pub fn error_code(&self) -> String {
      match self {
         Error::Driver(e) => match (e, e.code()) {
            (thinlite::Error::UseAfterDispose, _) => "USE_AFTER_DISPOSE".to_string(),
            (thinlite::Error::EmptyStatement, _) => "EMPTY_STATEMENT".to_string(),
            (_, Some(code)) => format!("SQLITE_{}", code),
            (_, None) => "DRIVER_ERROR".to_string(),
         },
         Error::TooManyValues(_) => "TOO_MANY_VALUES".to_string(),
         Error::MultipleRowsReturned(_) => "MULTIPLE_ROWS_RETURNED".to_string(),
         Error::TransactionRollbackFailed { .. } => "TRANSACTION_ROLLBACK_FAILED".to_string(),
         Error::Other(_) => "ERROR".to_string(),
      }
   }
}
