use std::io::Write;

use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::current_thread;
use crate::dispatch::Dispatch;
use crate::fixed_buffer::SMALL_BUFFER;
use crate::log_stream::LogStream;
use crate::loggable::Loggable;
use crate::severity::Severity;

const RECORD_TIME_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6](UTC)"
);

/// Bytes of the trailer besides the file name and line digits: ` - `, `:`, `\n`.
const TRAILER_FIXED_LEN: usize = 5;

/// Decimal digits of the largest `u32` line number.
const LINE_DIGITS: usize = 10;

/// One log record under construction.
///
/// Creating a record writes its header into a [`LogStream`]:
///
/// ```text
/// 2024-06-03 08:30:46.125770(UTC) 1234 INFO  [func ]message - src/main.rs:12
/// ```
///
/// The caller streams the message through [`append`](Self::append) or
/// [`stream`](Self::stream), then calls [`finish`](Self::finish), which writes
/// the ` - file:line` trailer and hands the whole record to the dispatch's
/// output hook in one call. A record that goes out of scope without
/// `finish` (an early return, `?`, or a panic unwinding through it) is
/// finished by `Drop`, so it is delivered exactly once on every path.
///
/// A [`Severity::Fatal`] record flushes the dispatch and aborts the process
/// after it has been delivered.
///
/// Check [`Dispatch::enabled`] before creating a record; the macros in this
/// crate do that so that disabled levels cost a single atomic load.
///
/// # Examples
///
/// ```
/// # use async_logger::{Dispatch, Record, Severity};
/// # use std::sync::Arc;
/// # use parking_lot::Mutex;
/// let dispatch = Dispatch::new();
/// let out = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&out);
/// dispatch.set_output_hook(move |bytes| sink.lock().extend_from_slice(bytes));
///
/// let mut record = Record::with_dispatch(&dispatch, "main.rs", 7, Severity::Warn, None);
/// record.append("disk at ").append(93).append('%');
/// record.finish();
///
/// let line = String::from_utf8(out.lock().clone()).unwrap();
/// assert!(line.ends_with("WARN  disk at 93% - main.rs:7\n"));
/// ```
pub struct Record<'a> {
    stream: LogStream,
    severity: Severity,
    file: &'a str,
    line: u32,
    dispatch: &'a Dispatch,
    submitted: bool,
}

impl<'a> Record<'a> {
    /// Starts a record routed through the global [`Dispatch`].
    pub fn new(file: &'a str, line: u32, severity: Severity, func: Option<&str>) -> Self {
        Self::with_dispatch(Dispatch::global(), file, line, severity, func)
    }

    /// Starts a record routed through `dispatch`.
    pub fn with_dispatch(
        dispatch: &'a Dispatch,
        file: &'a str,
        line: u32,
        severity: Severity,
        func: Option<&str>,
    ) -> Self {
        let mut stream = LogStream::new();

        let now = OffsetDateTime::now_utc();
        let _ = now.format_into(stream.buffer_mut(), RECORD_TIME_FORMAT);
        current_thread::with_tid_str(|tid| {
            stream.append_bytes(tid);
        });
        stream.append_bytes(severity.label().as_bytes());
        if let Some(func) = func {
            stream.append_bytes(func.as_bytes()).append_bytes(b" ");
        }

        Self {
            stream,
            severity,
            file,
            line,
            dispatch,
            submitted: false,
        }
    }

    /// Appends `value` to the message.
    #[inline]
    pub fn append<T: Loggable>(&mut self, value: T) -> &mut Self {
        self.stream.append(value);
        self
    }

    pub fn stream(&mut self) -> &mut LogStream {
        &mut self.stream
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Completes the record and delivers it.
    pub fn finish(mut self) {
        self.submit();
    }

    fn submit(&mut self) {
        if self.submitted {
            return;
        }
        self.submitted = true;

        self.write_trailer();
        self.dispatch.output(self.stream.buffer().as_bytes());

        if self.severity == Severity::Fatal {
            self.dispatch.flush();
            std::process::abort();
        }
    }

    /// Appends ` - file:line\n`, shrinking the message if the trailer would
    /// not fit so that every record ends with a newline.
    fn write_trailer(&mut self) {
        let mut digits = [0u8; LINE_DIGITS];
        let line_len = {
            let mut rest: &mut [u8] = &mut digits;
            let _ = write!(rest, "{}", self.line);
            LINE_DIGITS - rest.len()
        };

        let file = self.file.as_bytes();
        let max_file = SMALL_BUFFER - TRAILER_FIXED_LEN - line_len;
        let file = &file[file.len().saturating_sub(max_file)..];
        let needed = TRAILER_FIXED_LEN + file.len() + line_len;

        let buffer = self.stream.buffer_mut();
        if buffer.avail() < needed {
            buffer.truncate(SMALL_BUFFER - needed);
        }
        buffer.append(b" - ");
        buffer.append(file);
        buffer.append(b":");
        buffer.append(&digits[..line_len]);
        buffer.append(b"\n");
    }
}

impl Drop for Record<'_> {
    fn drop(&mut self) {
        self.submit();
    }
}
