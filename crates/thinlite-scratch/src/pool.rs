//! Shared pool of reusable byte buffers

use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::config::PoolConfig;

static SHARED: LazyLock<ScratchPool> = LazyLock::new(|| ScratchPool::new(PoolConfig::default()));

/// A pool of reusable scratch buffers.
///
/// Buffers are rented for the duration of one conversion and go back to the
/// pool when the [`ScratchBuffer`] guard is dropped, so steady-state text
/// conversions do not touch the allocator.
///
/// Cloning a pool is cheap and yields a handle to the same set of buffers.
#[derive(Clone)]
pub struct ScratchPool {
   inner: Arc<ScratchPoolInner>,
}

struct ScratchPoolInner {
   free: Mutex<Vec<Vec<u8>>>,
   config: PoolConfig,
}

impl ScratchPool {
   /// Create an empty pool.
   pub fn new(config: PoolConfig) -> Self {
      Self {
         inner: Arc::new(ScratchPoolInner {
            free: Mutex::new(Vec::with_capacity(config.max_retained)),
            config,
         }),
      }
   }

   /// The process-wide pool used when no other pool is supplied.
   pub fn shared() -> &'static ScratchPool {
      &SHARED
   }

   /// Rent an empty buffer with room for at least `min_capacity` bytes.
   ///
   /// Takes an idle buffer when one exists (growing it if it is too small),
   /// otherwise allocates a fresh one.
   pub fn rent(&self, min_capacity: usize) -> ScratchBuffer {
      let recycled = self.inner.free.lock().pop();

      let buffer = match recycled {
         Some(mut buffer) => {
            buffer.clear();
            if buffer.capacity() < min_capacity {
               trace!(
                  from = buffer.capacity(),
                  to = min_capacity,
                  "Growing recycled scratch buffer"
               );
               buffer.reserve(min_capacity);
            }
            buffer
         }
         None => {
            trace!(capacity = min_capacity, "Allocating scratch buffer");
            Vec::with_capacity(min_capacity)
         }
      };

      ScratchBuffer {
         buffer: ManuallyDrop::new(buffer),
         pool: Arc::clone(&self.inner),
      }
   }

   /// Number of idle buffers currently held by the pool.
   pub fn available(&self) -> usize {
      self.inner.free.lock().len()
   }

   /// The configuration this pool was created with.
   pub fn config(&self) -> &PoolConfig {
      &self.inner.config
   }
}

impl std::fmt::Debug for ScratchPool {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("ScratchPool")
         .field("available", &self.available())
         .field("config", &self.inner.config)
         .finish()
   }
}

/// A rented buffer that returns to its pool when dropped.
///
/// Dereferences to the underlying `Vec<u8>`, which starts out empty.
#[must_use = "if unused, the buffer is immediately returned to the pool"]
pub struct ScratchBuffer {
   /// Always valid until Drop, which moves it back into the pool.
   buffer: ManuallyDrop<Vec<u8>>,
   pool: Arc<ScratchPoolInner>,
}

impl std::fmt::Debug for ScratchBuffer {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("ScratchBuffer")
         .field("len", &self.buffer.len())
         .field("capacity", &self.buffer.capacity())
         .finish()
   }
}

impl Deref for ScratchBuffer {
   type Target = Vec<u8>;

   fn deref(&self) -> &Self::Target {
      &self.buffer
   }
}

impl DerefMut for ScratchBuffer {
   fn deref_mut(&mut self) -> &mut Self::Target {
      &mut self.buffer
   }
}

impl Drop for ScratchBuffer {
   fn drop(&mut self) {
      // SAFETY: drop runs once and nothing touches self.buffer afterwards.
      let buffer = unsafe { ManuallyDrop::take(&mut self.buffer) };
      let config = &self.pool.config;

      if buffer.capacity() > config.max_buffer_len {
         debug!(
            capacity = buffer.capacity(),
            limit = config.max_buffer_len,
            "Discarding oversized scratch buffer"
         );
         return;
      }

      let mut free = self.pool.free.lock();
      if free.len() < config.max_retained {
         free.push(buffer);
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   fn pool(max_retained: usize) -> ScratchPool {
      ScratchPool::new(PoolConfig {
         max_retained,
         ..Default::default()
      })
   }

   #[test]
   fn test_rent_and_return() {
      let pool = pool(4);
      assert_eq!(pool.available(), 0);

      let buf1 = pool.rent(32);
      let buf2 = pool.rent(32);
      assert_eq!(pool.available(), 0);

      drop(buf1);
      assert_eq!(pool.available(), 1);

      drop(buf2);
      assert_eq!(pool.available(), 2);
   }

   #[test]
   fn test_rented_buffer_is_empty_with_capacity() {
      let pool = pool(4);
      {
         let mut buf = pool.rent(8);
         buf.extend_from_slice(b"leftover");
      }

      let buf = pool.rent(100);
      assert!(buf.is_empty());
      assert!(buf.capacity() >= 100);
   }

   #[test]
   fn test_recycles_allocation() {
      let pool = pool(4);
      let ptr = {
         let buf = pool.rent(64);
         buf.as_ptr()
      };

      let buf = pool.rent(16);
      assert_eq!(buf.as_ptr(), ptr);
   }

   #[test]
   fn test_retention_limit() {
      let pool = pool(1);
      let buf1 = pool.rent(8);
      let buf2 = pool.rent(8);
      drop(buf1);
      drop(buf2);
      assert_eq!(pool.available(), 1);
   }

   #[test]
   fn test_oversized_buffer_not_retained() {
      let pool = ScratchPool::new(PoolConfig {
         max_retained: 4,
         max_buffer_len: 16,
      });

      drop(pool.rent(1024));
      assert_eq!(pool.available(), 0);

      drop(pool.rent(8));
      assert_eq!(pool.available(), 1);
   }

   #[test]
   fn test_clone_shares_buffers() {
      let pool1 = pool(4);
      let pool2 = pool1.clone();

      drop(pool1.rent(8));
      assert_eq!(pool2.available(), 1);
   }

   #[test]
   fn test_returned_on_unwind() {
      let pool = pool(4);
      let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
         let _buf = pool.rent(8);
         panic!("conversion failed");
      }));

      assert!(result.is_err());
      assert_eq!(pool.available(), 1);
   }
}
