//! Borrowed SQL text and parameter keys

/// SQL or parameter-name text in either of SQLite's two encodings.
///
/// UTF-8 input goes to the byte-oriented SQLite entry points and UTF-16 input
/// (native byte order) to the wide ones, so callers holding wide strings avoid
/// a conversion.
///
/// ```
/// use thinlite::SqlText;
///
/// let wide: Vec<u16> = "SELECT 1".encode_utf16().collect();
/// assert!(matches!(SqlText::from("SELECT 1"), SqlText::Utf8(_)));
/// assert!(matches!(SqlText::from(&wide[..]), SqlText::Utf16(_)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlText<'a> {
   Utf8(&'a [u8]),
   Utf16(&'a [u16]),
}

impl<'a> From<&'a str> for SqlText<'a> {
   fn from(text: &'a str) -> Self {
      SqlText::Utf8(text.as_bytes())
   }
}

impl<'a> From<&'a String> for SqlText<'a> {
   fn from(text: &'a String) -> Self {
      SqlText::Utf8(text.as_bytes())
   }
}

impl<'a> From<&'a [u8]> for SqlText<'a> {
   fn from(text: &'a [u8]) -> Self {
      SqlText::Utf8(text)
   }
}

impl<'a, const N: usize> From<&'a [u8; N]> for SqlText<'a> {
   fn from(text: &'a [u8; N]) -> Self {
      SqlText::Utf8(text)
   }
}

impl<'a> From<&'a [u16]> for SqlText<'a> {
   fn from(text: &'a [u16]) -> Self {
      SqlText::Utf16(text)
   }
}

impl<'a> From<&'a Vec<u16>> for SqlText<'a> {
   fn from(text: &'a Vec<u16>) -> Self {
      SqlText::Utf16(text)
   }
}

/// Identifies a statement parameter: a 1-based position or a name such as
/// `$id`, `:id` or `@id` (the prefix is part of the name).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param<'a> {
   Index(i32),
   Name(SqlText<'a>),
}

impl From<i32> for Param<'_> {
   fn from(index: i32) -> Self {
      Param::Index(index)
   }
}

impl<'a> From<SqlText<'a>> for Param<'a> {
   fn from(name: SqlText<'a>) -> Self {
      Param::Name(name)
   }
}

impl<'a> From<&'a str> for Param<'a> {
   fn from(name: &'a str) -> Self {
      Param::Name(name.into())
   }
}

impl<'a> From<&'a String> for Param<'a> {
   fn from(name: &'a String) -> Self {
      Param::Name(name.into())
   }
}

impl<'a> From<&'a [u8]> for Param<'a> {
   fn from(name: &'a [u8]) -> Self {
      Param::Name(name.into())
   }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Param<'a> {
   fn from(name: &'a [u8; N]) -> Self {
      Param::Name(name.into())
   }
}

impl<'a> From<&'a [u16]> for Param<'a> {
   fn from(name: &'a [u16]) -> Self {
      Param::Name(name.into())
   }
}
