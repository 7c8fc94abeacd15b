use serde_json::Value as JsonValue;
use thinlite::Parameters;

use crate::{Error, Result};

/// Bind JSON values to a statement's positional parameters, in order.
pub fn bind_values(params: &Parameters<'_>, values: &[JsonValue]) -> Result<()> {
   for (position, value) in values.iter().enumerate() {
      let index = i32::try_from(position + 1).map_err(|_| Error::TooManyValues(values.len()))?;
      bind_value(params, index, value)?;
   }
   Ok(())
}

/// Bind one JSON value to the parameter at `index`.
pub fn bind_value(params: &Parameters<'_>, index: i32, value: &JsonValue) -> Result<()> {
   match value {
      JsonValue::Null => params.bind_null(index)?,
      JsonValue::Bool(flag) => params.bind_int(index, i32::from(*flag))?,
      JsonValue::String(text) => params.bind_text(index, text)?,
      JsonValue::Number(number) => {
         // Preserve integer precision by binding as i64 when possible
         if let Some(int_val) = number.as_i64() {
            params.bind_int64(index, int_val)?
         } else if let Some(uint_val) = number.as_u64() {
            // Too large for SQLite's INTEGER; loses precision
            params.bind_double(index, uint_val as f64)?
         } else {
            params.bind_double(index, number.as_f64().unwrap_or_default())?
         }
      }
      // Arrays and objects are stored as their JSON text
      JsonValue::Array(_) | JsonValue::Object(_) => params.bind_text(index, &value.to_string())?,
   }
   Ok(())
}
