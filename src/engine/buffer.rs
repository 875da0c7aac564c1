//! Ownership of engine-allocated buffers

#![allow(unsafe_code)]

use std::fmt;

use super::ffi::WavFreeFn;

/// A byte buffer allocated by the engine
///
/// The buffer is handed back to its release function exactly once, when the
/// value is dropped. Its contents are only reachable by copying them out with
/// [`ForeignBytes::into_vec`]; the raw pointer never leaves this type.
pub struct ForeignBytes {
    ptr: *mut u8,
    len: usize,
    release: WavFreeFn,
}

impl ForeignBytes {
    /// Take ownership of an engine buffer
    ///
    /// A null `ptr` is an empty buffer and is never released.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or point to `len` initialized bytes allocated by the
    /// engine, not yet released, and `release` must be the engine function
    /// that frees it. The caller gives up ownership of `ptr`.
    #[must_use]
    pub const unsafe fn from_raw(ptr: *mut u8, len: usize, release: WavFreeFn) -> Self {
        Self { ptr, len, release }
    }

    /// Number of bytes in the buffer
    #[must_use]
    pub const fn len(&self) -> usize {
        if self.ptr.is_null() { 0 } else { self.len }
    }

    /// Whether the buffer holds no bytes
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the contents into owned memory and release the engine buffer
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        if self.is_empty() {
            return Vec::new();
        }

        // SAFETY: `from_raw` guarantees `ptr` addresses `len` initialized
        // bytes that stay valid until `release` runs in `drop` below.
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }.to_vec()
    }
}

impl Drop for ForeignBytes {
    fn drop(&mut self) {
        if self.ptr.is_null() {
            return;
        }

        // SAFETY: the buffer is owned by `self` and `drop` runs once.
        unsafe { (self.release)(self.ptr) };
        self.ptr = std::ptr::null_mut();
    }
}

impl fmt::Debug for ForeignBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignBytes").field("len", &self.len()).finish()
    }
}
