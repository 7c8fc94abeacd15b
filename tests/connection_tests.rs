//! Integration tests for connection lifecycle, preparation and disposal.

use thinlite::{Connection, ConnectionConfig, Error, status};

fn init_tracing() {
   let _ = tracing_subscriber::fmt()
      .with_test_writer()
      .with_max_level(tracing::Level::TRACE)
      .try_init();
}

fn count_rows(conn: &Connection, sql: &str) -> i64 {
   let mut reader = conn.execute_reader(sql).unwrap();
   assert!(reader.read().unwrap());
   reader.get_int64(0).unwrap()
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_full_read_cycle_yields_exactly_n_rows() {
   init_tracing();
   let conn = Connection::in_memory();
   conn
      .execute_non_query("CREATE TABLE t (id INTEGER PRIMARY KEY, n INTEGER)")
      .unwrap();

   let n = 25;
   let mut insert = conn.create_command("INSERT INTO t (n) VALUES (?)").unwrap();
   for i in 0..n {
      insert.parameters().bind_int(1, i).unwrap();
      insert.execute_non_query().unwrap();
   }
   insert.finalize().unwrap();

   let mut reader = conn.execute_reader("SELECT n FROM t ORDER BY id").unwrap();
   let mut seen = Vec::new();
   while reader.read().unwrap() {
      seen.push(reader.get_int(0).unwrap());
   }
   assert_eq!(seen, (0..n).collect::<Vec<_>>());
   assert!(!reader.read().unwrap());
}

#[test]
fn test_memory_reopen_gets_fresh_database() {
   let first = Connection::in_memory();
   first.open().unwrap();
   first.execute_non_query("CREATE TABLE t (id INTEGER)").unwrap();
   first.dispose().unwrap();
   assert!(!first.is_open());

   let second = Connection::in_memory();
   second.open().unwrap();
   assert_eq!(count_rows(&second, "SELECT COUNT(*) FROM sqlite_master"), 0);

   // The disposed instance stays unusable.
   assert_eq!(
      first.execute_non_query("SELECT 1"),
      Err(Error::UseAfterDispose)
   );
}

#[test]
fn test_double_dispose_is_an_error() {
   let conn = Connection::in_memory();
   conn.open().unwrap();
   conn.dispose().unwrap();
   assert_eq!(conn.dispose(), Err(Error::UseAfterDispose));
}

#[test]
fn test_every_operation_checks_disposed() {
   let conn = Connection::in_memory();
   conn.dispose().unwrap();

   assert_eq!(conn.open(), Err(Error::UseAfterDispose));
   assert_eq!(
      conn.create_command("SELECT 1").map(|_| ()),
      Err(Error::UseAfterDispose)
   );
   assert_eq!(
      conn.execute_reader("SELECT 1").map(|_| ()),
      Err(Error::UseAfterDispose)
   );
   assert_eq!(conn.execute_non_query("SELECT 1"), Err(Error::UseAfterDispose));
   assert_eq!(conn.changes(), Err(Error::UseAfterDispose));
   assert_eq!(conn.last_insert_rowid(), Err(Error::UseAfterDispose));
   assert_eq!(conn.pending_statements(), Err(Error::UseAfterDispose));
}

#[test]
fn test_reader_dispose_after_connection_dispose_is_silent() {
   let conn = Connection::in_memory();
   let mut command = conn.create_command("SELECT 1").unwrap();
   let mut reader = command.execute_reader().unwrap();
   assert!(reader.read().unwrap());

   conn.dispose().unwrap();
   assert_eq!(reader.read(), Err(Error::UseAfterDispose));
   reader.dispose();

   assert_eq!(command.finalize(), Err(Error::UseAfterDispose));
}

#[test]
fn test_connection_is_send() {
   fn assert_send<T: Send>() {}
   assert_send::<Connection>();
}

// ============================================================================
// Preparation
// ============================================================================

#[test]
fn test_invalid_sql_raises_prepare_error() {
   let conn = Connection::in_memory();
   let err = conn.create_command("SELEKT 1").unwrap_err();

   match &err {
      Error::Prepare { code, message } => {
         assert_eq!(*code, status::SQLITE_ERROR);
         assert!(message.contains("syntax error"), "message: {message}");
      }
      other => panic!("expected Prepare, got {other:?}"),
   }
   assert_eq!(conn.pending_statements().unwrap(), 0);
}

#[test]
fn test_unknown_table_raises_prepare_error() {
   let conn = Connection::in_memory();
   let err = conn.execute_reader("SELECT * FROM nope").unwrap_err();
   assert!(err.to_string().contains("no such table"));
}

#[test]
fn test_blank_sql_is_empty_statement() {
   let conn = Connection::in_memory();
   assert_eq!(
      conn.create_command("  /* nothing */ ").map(|_| ()),
      Err(Error::EmptyStatement)
   );
   assert_eq!(conn.pending_statements().unwrap(), 0);
}

#[test]
fn test_utf16_and_utf8_entry_points() {
   let conn = Connection::in_memory();

   let wide: Vec<u16> = "SELECT 'ü' || 'ñ'".encode_utf16().collect();
   let mut reader = conn.execute_reader(&wide).unwrap();
   assert!(reader.read().unwrap());
   assert_eq!(reader.get_string(0).unwrap(), "üñ");
   reader.dispose();

   let mut reader = conn.execute_reader(b"SELECT 7".as_slice()).unwrap();
   assert!(reader.read().unwrap());
   assert_eq!(reader.get_int(0).unwrap(), 7);
}

#[test]
fn test_invalid_utf16_sql_raises_prepare_error() {
   let conn = Connection::in_memory();
   let wide: Vec<u16> = "SELEKT 'ü'".encode_utf16().collect();
   let err = conn.create_command(&wide).unwrap_err();

   match &err {
      Error::Prepare { code, message } => {
         assert_eq!(*code, status::SQLITE_ERROR);
         assert!(message.contains("syntax error"), "message: {message}");
      }
      other => panic!("expected Prepare, got {other:?}"),
   }
   assert_eq!(conn.pending_statements().unwrap(), 0);

   let blank: Vec<u16> = "  ".encode_utf16().collect();
   assert_eq!(
      conn.execute_reader(&blank).map(|_| ()),
      Err(Error::EmptyStatement)
   );
}

// ============================================================================
// Execution results
// ============================================================================

#[test]
fn test_changes_and_last_insert_rowid() {
   let conn = Connection::in_memory();
   conn
      .execute_non_query("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)")
      .unwrap();
   conn
      .execute_non_query("INSERT INTO t (v) VALUES ('a'), ('b'), ('c')")
      .unwrap();
   assert_eq!(conn.changes().unwrap(), 3);
   assert_eq!(conn.last_insert_rowid().unwrap(), 3);

   assert_eq!(conn.execute_non_query("UPDATE t SET v = 'x'").unwrap(), 0);
   assert_eq!(conn.changes().unwrap(), 3);
}

#[test]
fn test_constraint_violation_raises_step_error() {
   let conn = Connection::in_memory();
   conn
      .execute_non_query("CREATE TABLE t (id INTEGER PRIMARY KEY)")
      .unwrap();
   conn.execute_non_query("INSERT INTO t VALUES (1)").unwrap();

   let err = conn.execute_non_query("INSERT INTO t VALUES (1)").unwrap_err();
   match err {
      Error::Step { code, message } => {
         assert_eq!(code & 0xff, status::SQLITE_CONSTRAINT);
         assert!(message.contains("UNIQUE"), "message: {message}");
      }
      other => panic!("expected Step, got {other:?}"),
   }
}

#[test]
fn test_lenient_step_status_ends_results_quietly() {
   let config = ConnectionConfig {
      lenient_step_status: true,
      ..Default::default()
   };
   let conn = Connection::with_config(thinlite::MEMORY, config);
   conn
      .execute_non_query("CREATE TABLE t (id INTEGER PRIMARY KEY)")
      .unwrap();
   conn.execute_non_query("INSERT INTO t VALUES (1)").unwrap();

   let mut reader = conn.execute_reader("INSERT INTO t VALUES (1)").unwrap();
   assert!(!reader.read().unwrap());
   reader.dispose();

   assert_eq!(count_rows(&conn, "SELECT COUNT(*) FROM t"), 1);
}

#[test]
fn test_runtime_error_raises_step_error() {
   let conn = Connection::in_memory();
   let mut reader = conn
      .execute_reader("SELECT abs(-9223372036854775807 - 1)")
      .unwrap();
   let err = reader.read().unwrap_err();
   assert!(matches!(err, Error::Step { .. }));
   assert!(err.to_string().contains("integer overflow"));
}

// ============================================================================
// On-disk databases
// ============================================================================

#[test]
fn test_file_database_persists_across_connections() {
   let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
   let path = temp_dir.path().join("test.db");
   let path = path.to_str().unwrap();

   let conn = Connection::new(path);
   conn
      .execute_non_query("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)")
      .unwrap();
   conn.execute_non_query("INSERT INTO t (v) VALUES ('kept')").unwrap();
   conn.dispose().unwrap();

   let conn = Connection::new(path);
   let mut reader = conn.execute_reader("SELECT v FROM t").unwrap();
   assert!(reader.read().unwrap());
   assert_eq!(reader.get_string(0).unwrap(), "kept");
}

#[test]
fn test_read_only_connection_rejects_writes() {
   let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
   let path = temp_dir.path().join("ro.db");
   let path = path.to_str().unwrap();

   Connection::new(path)
      .execute_non_query("CREATE TABLE t (id INTEGER)")
      .unwrap();

   let config = ConnectionConfig {
      read_only: true,
      ..Default::default()
   };
   let conn = Connection::with_config(path, config);
   assert_eq!(count_rows(&conn, "SELECT COUNT(*) FROM t"), 0);

   let err = conn.execute_non_query("INSERT INTO t VALUES (1)").unwrap_err();
   assert!(matches!(err, Error::Step { .. }));
}

#[test]
fn test_open_missing_file_without_create() {
   let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
   let path = temp_dir.path().join("missing.db");
   let path = path.to_str().unwrap().to_string();

   let config = ConnectionConfig {
      create_if_missing: false,
      ..Default::default()
   };
   let conn = Connection::with_config(path.clone(), config);
   let err = conn.open().unwrap_err();

   match err {
      Error::Open {
         code,
         path: reported,
         ..
      } => {
         assert_eq!(code, status::SQLITE_CANTOPEN);
         assert_eq!(reported, path);
      }
      other => panic!("expected Open, got {other:?}"),
   }
   assert!(!conn.is_open());
}
