use std::alloc::{self, Layout};
use std::fmt;
use std::io;

/// Capacity of the buffer a single record is formatted into.
pub const SMALL_BUFFER: usize = 4000;

/// Capacity of the buffers the async writer batches records into.
pub const LARGE_BUFFER: usize = 4000 * 1000;

/// A byte buffer with a fixed, compile-time capacity.
///
/// The buffer never grows. Every append is checked against the remaining
/// space, so a full buffer refuses data instead of writing past its end.
///
/// Small buffers live inline (on the stack inside a [`LogStream`]), large ones
/// are allocated with [`FixedBuffer::boxed`], which never materializes the
/// storage on the stack.
///
/// # Examples
///
/// ```
/// # use async_logger::FixedBuffer;
/// let mut buf = FixedBuffer::<16>::new();
/// assert!(buf.append(b"hello"));
/// assert_eq!(buf.as_bytes(), b"hello");
/// assert_eq!(buf.avail(), 11);
///
/// // Data that does not fit is refused as a whole.
/// assert!(!buf.append(&[b'x'; 12]));
/// assert_eq!(buf.len(), 5);
/// ```
///
/// [`LogStream`]: crate::LogStream
#[repr(C)]
pub struct FixedBuffer<const CAP: usize> {
    len: usize,
    data: [u8; CAP],
}

impl<const CAP: usize> FixedBuffer<CAP> {
    /// Creates an empty buffer in place.
    ///
    /// Only use this for small capacities; for large ones use [`boxed`](Self::boxed).
    pub const fn new() -> Self {
        Self {
            len: 0,
            data: [0; CAP],
        }
    }

    /// Allocates an empty buffer directly on the heap.
    pub fn boxed() -> Box<Self> {
        let layout = Layout::new::<Self>();
        // SAFETY: the layout has a non-zero size (it always contains `len`), and
        // an all-zero bit pattern is a valid `FixedBuffer`: `len == 0` and a
        // zeroed byte array. The pointer comes from the global allocator with
        // the exact layout of `Self`, which is what `Box::from_raw` requires.
        unsafe {
            let ptr = alloc::alloc_zeroed(layout) as *mut Self;
            if ptr.is_null() {
                alloc::handle_alloc_error(layout);
            }
            Box::from_raw(ptr)
        }
    }

    /// Total capacity in bytes.
    #[inline]
    pub const fn capacity(&self) -> usize {
        CAP
    }

    /// Number of bytes currently stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remaining space in bytes.
    #[inline]
    pub fn avail(&self) -> usize {
        CAP - self.len
    }

    /// Appends `data` if it fits entirely. Returns `false` and leaves the
    /// buffer untouched otherwise.
    #[inline]
    pub fn append(&mut self, data: &[u8]) -> bool {
        if data.len() > self.avail() {
            return false;
        }
        self.data[self.len..self.len + data.len()].copy_from_slice(data);
        self.len += data.len();
        true
    }

    /// Appends as much of `data` as fits and returns the number of bytes taken.
    #[inline]
    pub fn append_truncated(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.avail());
        self.data[self.len..self.len + n].copy_from_slice(&data[..n]);
        self.len += n;
        n
    }

    /// The stored bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Forgets the contents without releasing the storage.
    #[inline]
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Shortens the buffer to `len` bytes. Has no effect if `len` is not
    /// smaller than the current length.
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        if len < self.len {
            self.len = len;
        }
    }
}

impl<const CAP: usize> Default for FixedBuffer<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAP: usize> fmt::Debug for FixedBuffer<CAP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedBuffer")
            .field("capacity", &CAP)
            .field("len", &self.len)
            .finish()
    }
}

/// Partial writes are allowed: a write stores what fits and a full buffer
/// accepts zero bytes.
impl<const CAP: usize> io::Write for FixedBuffer<CAP> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.append_truncated(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
