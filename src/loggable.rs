use std::ffi::CStr;
use std::fmt;

use crate::fixed_buffer::FixedBuffer;
use crate::log_stream::LogStream;

/// Widest text any single numeric value can produce (an `i128` needs 40
/// bytes). Numeric fragments are only written when this much space remains,
/// so a number is never cut in half.
pub const MAX_NUMERIC_SIZE: usize = 48;

/// Values that can be written into a [`LogStream`].
///
/// Implementations format directly into the stream's fixed buffer and never
/// allocate. Integers, floats, booleans, characters, pointers and strings are
/// covered; other `Display` types can be written through
/// [`format_args!`] since `fmt::Arguments` is `Loggable` too.
pub trait Loggable {
    /// Appends the text form of `self` to `stream`.
    fn log_to(&self, stream: &mut LogStream);
}

impl<T: Loggable + ?Sized> Loggable for &T {
    #[inline]
    fn log_to(&self, stream: &mut LogStream) {
        (**self).log_to(stream)
    }
}

impl<T: Loggable + ?Sized> Loggable for &mut T {
    #[inline]
    fn log_to(&self, stream: &mut LogStream) {
        (**self).log_to(stream)
    }
}

impl Loggable for bool {
    #[inline]
    fn log_to(&self, stream: &mut LogStream) {
        stream.append_bytes(if *self { b"1" } else { b"0" });
    }
}

impl Loggable for char {
    #[inline]
    fn log_to(&self, stream: &mut LogStream) {
        let mut utf8 = [0u8; 4];
        stream.append_bytes(self.encode_utf8(&mut utf8).as_bytes());
    }
}

impl Loggable for str {
    #[inline]
    fn log_to(&self, stream: &mut LogStream) {
        stream.append_bytes(self.as_bytes());
    }
}

impl Loggable for String {
    #[inline]
    fn log_to(&self, stream: &mut LogStream) {
        stream.append_bytes(self.as_bytes());
    }
}

impl Loggable for [u8] {
    #[inline]
    fn log_to(&self, stream: &mut LogStream) {
        stream.append_bytes(self);
    }
}

impl Loggable for CStr {
    #[inline]
    fn log_to(&self, stream: &mut LogStream) {
        stream.append_bytes(self.to_bytes());
    }
}

impl<const CAP: usize> Loggable for FixedBuffer<CAP> {
    #[inline]
    fn log_to(&self, stream: &mut LogStream) {
        stream.append_bytes(self.as_bytes());
    }
}

/// A missing value formats as `(null)`.
impl<T: Loggable> Loggable for Option<T> {
    #[inline]
    fn log_to(&self, stream: &mut LogStream) {
        match self {
            Some(value) => value.log_to(stream),
            None => {
                stream.append_bytes(b"(null)");
            }
        }
    }
}

impl Loggable for fmt::Arguments<'_> {
    fn log_to(&self, stream: &mut LogStream) {
        // LogStream's fmt::Write truncates instead of failing.
        let _ = fmt::Write::write_fmt(stream, *self);
    }
}

/// Writes the decimal digits of `value` into the tail of `out` and returns
/// the index of the first digit.
#[inline]
fn format_u64(mut value: u64, out: &mut [u8; MAX_NUMERIC_SIZE]) -> usize {
    let mut pos = out.len();
    loop {
        pos -= 1;
        out[pos] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            return pos;
        }
    }
}

#[inline]
fn format_u128(mut value: u128, out: &mut [u8; MAX_NUMERIC_SIZE]) -> usize {
    if let Ok(small) = u64::try_from(value) {
        return format_u64(small, out);
    }
    let mut pos = out.len();
    loop {
        pos -= 1;
        out[pos] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            return pos;
        }
    }
}

macro_rules! impl_loggable_unsigned {
    ($($t:ty => $fmt:ident as $wide:ty),* $(,)?) => {
        $(
            impl Loggable for $t {
                #[inline]
                fn log_to(&self, stream: &mut LogStream) {
                    let mut digits = [0u8; MAX_NUMERIC_SIZE];
                    let start = $fmt(*self as $wide, &mut digits);
                    stream.append_numeric(&digits[start..]);
                }
            }
        )*
    };
}

// The magnitude goes through `unsigned_abs`, which is exact for `MIN`.
macro_rules! impl_loggable_signed {
    ($($t:ty => $fmt:ident as $wide:ty),* $(,)?) => {
        $(
            impl Loggable for $t {
                #[inline]
                fn log_to(&self, stream: &mut LogStream) {
                    let mut digits = [0u8; MAX_NUMERIC_SIZE];
                    let mut start = $fmt(self.unsigned_abs() as $wide, &mut digits);
                    if *self < 0 {
                        start -= 1;
                        digits[start] = b'-';
                    }
                    stream.append_numeric(&digits[start..]);
                }
            }
        )*
    };
}

impl_loggable_unsigned! {
    u8 => format_u64 as u64,
    u16 => format_u64 as u64,
    u32 => format_u64 as u64,
    u64 => format_u64 as u64,
    usize => format_u64 as u64,
    u128 => format_u128 as u128,
}

impl_loggable_signed! {
    i8 => format_u64 as u64,
    i16 => format_u64 as u64,
    i32 => format_u64 as u64,
    i64 => format_u64 as u64,
    isize => format_u64 as u64,
    i128 => format_u128 as u128,
}

/// Stack cursor used to run `core::fmt` float formatting without allocating.
struct NumericCursor {
    bytes: [u8; MAX_NUMERIC_SIZE],
    len: usize,
}

impl fmt::Write for NumericCursor {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len + s.len();
        if end > self.bytes.len() {
            return Err(fmt::Error);
        }
        self.bytes[self.len..end].copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}

// Shortest round-trip digits, in exponent form outside [1e-5, 1e16) so the
// text stays within MAX_NUMERIC_SIZE.
macro_rules! impl_loggable_float {
    ($($t:ty),*) => {
        $(
            impl Loggable for $t {
                fn log_to(&self, stream: &mut LogStream) {
                    use fmt::Write;
                    let mut cursor = NumericCursor { bytes: [0; MAX_NUMERIC_SIZE], len: 0 };
                    let magnitude = self.abs();
                    let written = if !self.is_finite()
                        || magnitude == 0.0
                        || (1e-5..1e16).contains(&magnitude)
                    {
                        write!(cursor, "{}", self)
                    } else {
                        write!(cursor, "{:e}", self)
                    };
                    if written.is_ok() {
                        stream.append_numeric(&cursor.bytes[..cursor.len]);
                    }
                }
            }
        )*
    };
}

impl_loggable_float!(f32, f64);

fn log_address(address: usize, stream: &mut LogStream) {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    const WIDTH: usize = 2 * std::mem::size_of::<usize>();

    let mut text = [0u8; 2 + WIDTH];
    text[0] = b'0';
    text[1] = b'x';
    for i in 0..WIDTH {
        let shift = (WIDTH - 1 - i) * 4;
        text[2 + i] = HEX[(address >> shift) & 0xf];
    }
    stream.append_numeric(&text);
}

/// Pointers format as `0x` plus a fixed number of hex digits.
impl<T: ?Sized> Loggable for *const T {
    #[inline]
    fn log_to(&self, stream: &mut LogStream) {
        log_address(self.cast::<()>() as usize, stream);
    }
}

impl<T: ?Sized> Loggable for *mut T {
    #[inline]
    fn log_to(&self, stream: &mut LogStream) {
        log_address(self.cast::<()>() as usize, stream);
    }
}
