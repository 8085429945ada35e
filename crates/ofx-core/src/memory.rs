//! Scoped temporary allocation.
//!
//! Render calls allocate their temporaries (unpremultiplied copies, planar
//! planes, kernel scratch) through [`ImageMemory`]. Each allocation returns
//! a [`ScopedBuffer`] owned by the call and released on scope exit, on every
//! path including early returns.
//!
//! Allocation uses fallible reservation, so an oversized request surfaces
//! as [`Error::AllocationFailed`] instead of aborting the process.
//!
//! # Example
//!
//! ```rust
//! use ofx_core::ImageMemory;
//!
//! let mem = ImageMemory::with_limit(1024);
//! let buf = mem.allocate::<f32>(64).unwrap();
//! assert_eq!(buf.len(), 64);
//! assert!(mem.allocate::<f32>(1024).is_err());
//! ```

use crate::error::{Error, Result};
use std::ops::{Deref, DerefMut};
use tracing::trace;

/// Allocator for per-render temporaries.
///
/// An optional byte limit models a host memory suite that refuses large
/// requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageMemory {
    limit: Option<usize>,
}

impl ImageMemory {
    /// Allocator without a limit.
    pub const fn unbounded() -> Self {
        Self { limit: None }
    }

    /// Allocator refusing any single request above `bytes`.
    pub const fn with_limit(bytes: usize) -> Self {
        Self { limit: Some(bytes) }
    }

    /// Allocates `len` default-initialised elements.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailed`] when the size overflows, exceeds the limit
    /// or the system refuses the reservation.
    pub fn allocate<T: Copy + Default>(&self, len: usize) -> Result<ScopedBuffer<T>> {
        let bytes = len
            .checked_mul(std::mem::size_of::<T>())
            .ok_or_else(|| Error::allocation_failed(usize::MAX, "size overflow"))?;
        if let Some(limit) = self.limit {
            if bytes > limit {
                return Err(Error::allocation_failed(
                    bytes,
                    format!("exceeds host limit of {limit} bytes"),
                ));
            }
        }
        trace!(bytes, "allocate temporary");

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|e| Error::allocation_failed(bytes, e.to_string()))?;
        data.resize(len, T::default());
        Ok(ScopedBuffer { data })
    }
}

/// Temporary buffer owned by one render call.
#[derive(Debug)]
pub struct ScopedBuffer<T> {
    data: Vec<T>,
}

impl<T> ScopedBuffer<T> {
    /// Consumes the scope and returns the storage.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T> Deref for ScopedBuffer<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.data
    }
}

impl<T> DerefMut for ScopedBuffer<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}
