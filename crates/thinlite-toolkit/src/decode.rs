use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use thinlite::{ColumnType, Reader};

use crate::Result;

/// Convert the value of one column in the reader's current row to JSON.
///
/// Integers and floats become numbers (non-finite floats become `null`), text
/// becomes a string and blobs become base64 strings.
pub fn to_json(reader: &Reader<'_>, column: usize) -> Result<JsonValue> {
   let value = match reader.get_column_type(column)? {
      ColumnType::Null => JsonValue::Null,
      ColumnType::Integer => JsonValue::from(reader.get_int64(column)?),
      ColumnType::Float => serde_json::Number::from_f64(reader.get_double(column)?)
         .map(JsonValue::Number)
         .unwrap_or(JsonValue::Null),
      ColumnType::Text => JsonValue::String(reader.get_string(column)?),
      ColumnType::Blob => JsonValue::String(STANDARD.encode(reader.get_bytes(column)?)),
   };
   Ok(value)
}

/// Decode the reader's current row into a map keyed by column name, in
/// column order.
pub fn decode_row(reader: &Reader<'_>) -> Result<IndexMap<String, JsonValue>> {
   let count = reader.column_count()?;
   let mut row = IndexMap::with_capacity(count);
   for column in 0..count {
      row.insert(reader.get_name(column)?, to_json(reader, column)?);
   }
   Ok(row)
}

#[cfg(test)]
mod tests {
   use super::*;
   use serde_json::json;
   use thinlite::Connection;

   #[test]
   fn test_to_json_each_storage_class() {
      let conn = Connection::in_memory();
      let mut reader = conn
         .execute_reader("SELECT NULL, 9007199254740993, 1.25, 'txt', X'48656C6C6F'")
         .unwrap();
      assert!(reader.read().unwrap());

      let values: Vec<_> = (0..5).map(|c| to_json(&reader, c).unwrap()).collect();
      assert_eq!(
         values,
         vec![
            JsonValue::Null,
            json!(9_007_199_254_740_993_i64),
            json!(1.25),
            json!("txt"),
            json!("SGVsbG8="),
         ]
      );
   }

   #[test]
   fn test_decode_row_preserves_column_order() {
      let conn = Connection::in_memory();
      let mut reader = conn.execute_reader("SELECT 1 AS z, 2 AS a, 3 AS m").unwrap();
      assert!(reader.read().unwrap());

      let row = decode_row(&reader).unwrap();
      let keys: Vec<&String> = row.keys().collect();
      assert_eq!(keys, vec!["z", "a", "m"]);
   }

   #[test]
   fn test_decode_row_requires_current_row() {
      let conn = Connection::in_memory();
      let reader = conn.execute_reader("SELECT 1").unwrap();
      let err = decode_row(&reader).unwrap_err();
      assert!(matches!(
         err,
         crate::Error::Driver(thinlite::Error::NoCurrentRow)
      ));
   }
}
