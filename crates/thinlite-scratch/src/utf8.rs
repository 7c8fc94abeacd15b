//! Scoped UTF-8 encodings backed by pooled buffers

use std::char::REPLACEMENT_CHARACTER;
use std::ffi::CStr;

use crate::pool::{ScratchBuffer, ScratchPool};

/// Bytes of UTF-8 needed, at most, to encode `units` UTF-16 code units.
///
/// A BMP code unit never takes more than 3 bytes, and a surrogate pair
/// (2 units) takes exactly 4.
pub const fn utf8_capacity(units: usize) -> usize {
   units.saturating_mul(3)
}

/// UTF-8 text held in a rented scratch buffer.
///
/// The buffer goes back to its pool when this value is dropped, so the
/// encoded bytes must not be handed to anything that keeps them past the
/// current scope.
///
/// ```
/// use thinlite_scratch::{ScratchPool, Utf8Scratch};
///
/// let wide: Vec<u16> = "héllo".encode_utf16().collect();
/// let text = Utf8Scratch::from_utf16(ScratchPool::shared(), &wide);
/// assert_eq!(text.as_bytes(), "héllo".as_bytes());
/// ```
#[derive(Debug)]
pub struct Utf8Scratch {
   buffer: ScratchBuffer,
   nul_terminated: bool,
}

impl Utf8Scratch {
   /// Encode UTF-16 code units as UTF-8. Unpaired surrogates become U+FFFD.
   pub fn from_utf16(pool: &ScratchPool, units: &[u16]) -> Self {
      let mut buffer = pool.rent(utf8_capacity(units.len()));
      encode_utf16(&mut buffer, units);
      Self {
         buffer,
         nul_terminated: false,
      }
   }

   /// Like [`Utf8Scratch::from_utf16`], followed by a NUL terminator.
   pub fn from_utf16_with_nul(pool: &ScratchPool, units: &[u16]) -> Self {
      let mut buffer = pool.rent(utf8_capacity(units.len()) + 1);
      encode_utf16(&mut buffer, units);
      buffer.push(0);
      Self {
         buffer,
         nul_terminated: true,
      }
   }

   /// Copy UTF-8 bytes and append a NUL terminator.
   pub fn with_nul(pool: &ScratchPool, utf8: &[u8]) -> Self {
      let mut buffer = pool.rent(utf8.len() + 1);
      buffer.extend_from_slice(utf8);
      buffer.push(0);
      Self {
         buffer,
         nul_terminated: true,
      }
   }

   /// The encoded text, without any terminator.
   pub fn as_bytes(&self) -> &[u8] {
      if self.nul_terminated {
         &self.buffer[..self.buffer.len() - 1]
      } else {
         &self.buffer
      }
   }

   /// The encoded text including the NUL terminator, if one was appended.
   pub fn as_bytes_with_nul(&self) -> &[u8] {
      &self.buffer
   }

   /// Borrow as a C string.
   ///
   /// Returns `None` when the text was not NUL-terminated or contains an
   /// interior NUL.
   pub fn as_c_str(&self) -> Option<&CStr> {
      if !self.nul_terminated {
         return None;
      }
      CStr::from_bytes_with_nul(&self.buffer).ok()
   }

   /// Length of the encoded text in bytes, excluding any terminator.
   pub fn len(&self) -> usize {
      self.as_bytes().len()
   }

   pub fn is_empty(&self) -> bool {
      self.len() == 0
   }
}

fn encode_utf16(buffer: &mut Vec<u8>, units: &[u16]) {
   let mut scratch = [0u8; 4];
   for ch in char::decode_utf16(units.iter().copied()) {
      let ch = ch.unwrap_or(REPLACEMENT_CHARACTER);
      buffer.extend_from_slice(ch.encode_utf8(&mut scratch).as_bytes());
   }
}
