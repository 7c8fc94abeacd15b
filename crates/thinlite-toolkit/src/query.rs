use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thinlite::Connection;
use tracing::{debug, warn};

use crate::bind::bind_values;
use crate::decode::decode_row;
use crate::{Error, Result};

/// Result returned from write operations (e.g. INSERT, UPDATE, DELETE).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteQueryResult {
   /// The number of rows affected by the write operation.
   pub rows_affected: u64,
   /// The last inserted row ID (SQLite ROWID).
   ///
   /// Only set for INSERT operations on tables with a ROWID.
   /// Tables created with `WITHOUT ROWID` will not set this value.
   pub last_insert_id: i64,
}

/// Execute a write query (INSERT/UPDATE/DELETE) with positional values.
pub fn execute(conn: &Connection, query: &str, values: &[JsonValue]) -> Result<WriteQueryResult> {
   let mut command = conn.create_command(query)?;
   bind_values(&command.parameters(), values)?;
   command.execute_non_query()?;
   command.finalize()?;

   Ok(WriteQueryResult {
      rows_affected: conn.changes()?,
      last_insert_id: conn.last_insert_rowid()?,
   })
}

/// Execute a SELECT query, returning every row.
pub fn fetch_all(
   conn: &Connection,
   query: &str,
   values: &[JsonValue],
) -> Result<Vec<IndexMap<String, JsonValue>>> {
   fetch(conn, query, values, usize::MAX)
}

/// Execute a SELECT query expecting zero or one result.
///
/// At most two rows are read; a second row fails with
/// [`Error::MultipleRowsReturned`].
pub fn fetch_one(
   conn: &Connection,
   query: &str,
   values: &[JsonValue],
) -> Result<Option<IndexMap<String, JsonValue>>> {
   let mut rows = fetch(conn, query, values, 2)?;
   match rows.len() {
      0 | 1 => Ok(rows.pop()),
      count => Err(Error::MultipleRowsReturned(count)),
   }
}

fn fetch(
   conn: &Connection,
   query: &str,
   values: &[JsonValue],
   limit: usize,
) -> Result<Vec<IndexMap<String, JsonValue>>> {
   let mut command = conn.create_command(query)?;
   bind_values(&command.parameters(), values)?;

   let mut rows = Vec::new();
   {
      let mut reader = command.execute_reader()?;
      while rows.len() < limit && reader.read()? {
         rows.push(decode_row(&reader)?);
      }
   }
   command.finalize()?;

   Ok(rows)
}

/// Execute multiple write statements atomically within a transaction.
///
/// This method:
/// 1. Begins a transaction (`BEGIN IMMEDIATE`)
/// 2. Executes all statements in order
/// 3. Commits on success (`COMMIT`)
/// 4. Rolls back on any error (`ROLLBACK`), including a failed commit
///
/// Returns the result of each statement execution.
pub fn execute_transaction(
   conn: &Connection,
   statements: &[(&str, Vec<JsonValue>)],
) -> Result<Vec<WriteQueryResult>> {
   conn.execute_non_query("BEGIN IMMEDIATE")?;

   let result = statements
      .iter()
      .map(|(query, values)| execute(conn, query, values))
      .collect::<Result<Vec<_>>>()
      .and_then(|results| {
         // A failed COMMIT (e.g. a deferred constraint) leaves the transaction open
         conn.execute_non_query("COMMIT")?;
         Ok(results)
      });

   match result {
      Ok(results) => {
         debug!(statements = results.len(), "Committed transaction");
         Ok(results)
      }
      Err(e) => match conn.execute_non_query("ROLLBACK") {
         // Rollback succeeded, return original error
         Ok(_) => {
            debug!(error = %e, "Rolled back transaction");
            Err(e)
         }
         Err(rollback_err) => {
            warn!(error = %e, rollback_error = %rollback_err, "Rollback failed");
            Err(Error::TransactionRollbackFailed {
               transaction_error: e.to_string(),
               rollback_error: rollback_err.to_string(),
            })
         }
      },
   }
}
