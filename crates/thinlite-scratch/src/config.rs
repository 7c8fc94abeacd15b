//! Configuration for scratch buffer pools

use serde::{Deserialize, Serialize};

/// Configuration for a [`ScratchPool`](crate::ScratchPool)
///
/// # Examples
///
/// ```
/// use thinlite_scratch::PoolConfig;
///
/// // Use defaults
/// let config = PoolConfig::default();
///
/// // Override just one field
/// let config = PoolConfig {
///    max_retained: 4,
///    ..Default::default()
/// };
/// assert_eq!(config.max_buffer_len, 64 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
   /// Maximum number of idle buffers kept for reuse
   ///
   /// Buffers returned while the pool already holds this many are freed.
   ///
   /// Default: 16
   pub max_retained: usize,

   /// Largest buffer capacity (in bytes) the pool will take back
   ///
   /// A one-off conversion of a very large string should not pin that
   /// allocation for the rest of the process.
   ///
   /// Default: 64 KiB
   pub max_buffer_len: usize,
}

impl Default for PoolConfig {
   fn default() -> Self {
      Self {
         max_retained: 16,
         max_buffer_len: 64 * 1024,
      }
   }
}
