use std::fmt;

use crate::fixed_buffer::{FixedBuffer, SMALL_BUFFER};
use crate::loggable::{Loggable, MAX_NUMERIC_SIZE};

/// Formats log values into a fixed [`SMALL_BUFFER`]-sized buffer.
///
/// A stream holds exactly one record. Nothing is allocated: numbers are
/// rendered on the stack and copied in, strings are copied directly. When the
/// buffer runs out, string fragments are cut at the remaining capacity and
/// numbers that would not fit entirely are skipped.
///
/// # Examples
///
/// ```
/// # use async_logger::LogStream;
/// let mut stream = LogStream::new();
/// stream.append("answer=").append(42).append(' ').append(true);
/// assert_eq!(stream.buffer().as_bytes(), b"answer=42 1");
/// ```
pub struct LogStream {
    buffer: FixedBuffer<SMALL_BUFFER>,
}

impl LogStream {
    pub const fn new() -> Self {
        Self {
            buffer: FixedBuffer::new(),
        }
    }

    /// Writes `value` and returns the stream for chaining.
    #[inline]
    pub fn append<T: Loggable>(&mut self, value: T) -> &mut Self {
        value.log_to(self);
        self
    }

    /// Copies as much of `data` as fits.
    #[inline]
    pub fn append_bytes(&mut self, data: &[u8]) -> &mut Self {
        self.buffer.append_truncated(data);
        self
    }

    /// Copies a rendered number, or nothing if the buffer is nearly full.
    #[inline]
    pub(crate) fn append_numeric(&mut self, digits: &[u8]) {
        if self.buffer.avail() >= MAX_NUMERIC_SIZE {
            self.buffer.append(digits);
        }
    }

    pub fn buffer(&self) -> &FixedBuffer<SMALL_BUFFER> {
        &self.buffer
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut FixedBuffer<SMALL_BUFFER> {
        &mut self.buffer
    }

    pub fn reset_buffer(&mut self) {
        self.buffer.reset();
    }
}

impl Default for LogStream {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LogStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogStream")
            .field("len", &self.buffer.len())
            .finish()
    }
}

/// Lets `write!` target a stream. Output beyond the capacity is dropped
/// silently; the write itself never fails.
impl fmt::Write for LogStream {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buffer.append_truncated(s.as_bytes());
        Ok(())
    }
}
