//! Fixed pool of reusable pixel buffers.
//!
//! The camera side owns a small number of buffers and reuses them for every
//! captured frame; a buffer that is not returned stalls capture entirely.
//! `PixelBuffer` returns its storage to the pool when dropped, so release is
//! tied to ownership and happens exactly once on every path.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::CameraError;

/// Shared fixed-size pool of pixel buffers.
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    free: Mutex<Vec<Vec<u8>>>,
    capacity: usize,
    buffer_len: usize,
}

impl BufferPool {
    /// Create a pool holding `capacity` buffers of `buffer_len` bytes each.
    pub fn new(capacity: usize, buffer_len: usize) -> Self {
        let free = (0..capacity)
            .map(|_| Vec::with_capacity(buffer_len))
            .collect();
        Self {
            inner: Arc::new(PoolInner {
                free: Mutex::new(free),
                capacity,
                buffer_len,
            }),
        }
    }

    /// Take a buffer out of the pool. Returns `None` when every buffer is
    /// still in flight.
    pub fn acquire(&self) -> Option<PixelBuffer> {
        let mut data = self.inner.lock_free().pop()?;
        data.clear();
        Some(PixelBuffer {
            data,
            limit: self.inner.buffer_len,
            pool: Arc::clone(&self.inner),
        })
    }

    /// Number of buffers currently available for capture.
    pub fn available(&self) -> usize {
        self.inner.lock_free().len()
    }

    /// Total number of buffers the pool was created with.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("capacity", &self.inner.capacity)
            .field("available", &self.available())
            .finish()
    }
}

impl PoolInner {
    fn lock_free(&self) -> MutexGuard<'_, Vec<Vec<u8>>> {
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One pixel buffer checked out of a [`BufferPool`].
///
/// Freshly acquired buffers are empty; the producer fills them with
/// [`PixelBuffer::fill_from`]. The storage goes back to the pool on drop.
pub struct PixelBuffer {
    data: Vec<u8>,
    limit: usize,
    pool: Arc<PoolInner>,
}

impl PixelBuffer {
    /// Copy a captured payload into the buffer, replacing prior contents.
    pub fn fill_from(&mut self, src: &[u8]) -> Result<(), CameraError> {
        if src.len() > self.limit {
            return Err(CameraError::Format(format!(
                "payload of {} bytes exceeds buffer capacity {}",
                src.len(),
                self.limit
            )));
        }
        self.data.clear();
        self.data.extend_from_slice(src);
        Ok(())
    }

    /// Bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Deref for PixelBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for PixelBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("len", &self.data.len())
            .field("limit", &self.limit)
            .finish()
    }
}

impl Drop for PixelBuffer {
    fn drop(&mut self) {
        let data = std::mem::take(&mut self.data);
        self.pool.lock_free().push(data);
    }
}
