//! # thinlite-toolkit
//!
//! A convenience layer over the `thinlite` driver for callers that work with
//! JSON values rather than typed accessors.
//!
//! - [`execute`]: run a write statement and report rows affected and the last
//!   inserted rowid
//! - [`fetch_all`] / [`fetch_one`]: run a query and decode rows into ordered
//!   `column name -> JSON value` maps
//! - [`execute_transaction`]: run several writes under `BEGIN IMMEDIATE`,
//!   committing on success and rolling back on the first error
//!
//! ## Value mapping
//!
//! | JSON in                 | SQLite            | JSON out              |
//! |-------------------------|-------------------|-----------------------|
//! | `null`                  | NULL              | `null`                |
//! | `true` / `false`        | INTEGER 1 / 0     | number                |
//! | integer                 | INTEGER           | number                |
//! | integer above `i64::MAX`| REAL              | number                |
//! | float                   | REAL              | number                |
//! | string                  | TEXT              | string                |
//! | array / object          | TEXT (JSON)       | string                |
//! | n/a                     | BLOB              | base64 string         |
//!
//! ```no_run
//! use serde_json::json;
//! use thinlite::Connection;
//!
//! # fn main() -> thinlite_toolkit::Result<()> {
//! let conn = Connection::new("app.db");
//! thinlite_toolkit::execute(&conn, "CREATE TABLE IF NOT EXISTS users (name TEXT)", &[])?;
//! thinlite_toolkit::execute(&conn, "INSERT INTO users (name) VALUES (?)", &[json!("Alice")])?;
//!
//! let rows = thinlite_toolkit::fetch_all(&conn, "SELECT name FROM users", &[])?;
//! assert_eq!(rows[0]["name"], json!("Alice"));
//! # Ok(())
//! # }
//! ```

mod bind;
pub mod decode;
mod error;
mod query;

pub use bind::{bind_value, bind_values};
pub use error::{Error, Result};
pub use query::{WriteQueryResult, execute, execute_transaction, fetch_all, fetch_one};
