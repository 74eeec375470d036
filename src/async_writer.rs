//! The producer/consumer engine that moves formatted records off the calling
//! threads and into the file layer.
//!
//! Producers append into a `current` buffer under one lock. When it fills,
//! the buffer is moved to a `pending` list and a spare takes its place. A
//! single background thread wakes every flush interval (or as soon as a
//! buffer fills), takes `current` and the whole `pending` list in one swap,
//! and writes them out with the lock released. Buffers only ever move: each
//! one is owned by exactly one slot at a time, and written buffers come back
//! as spares so the steady state allocates nothing.

use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, warn};

use crate::config::{LoggerConfig, DEFAULT_FLUSH_INTERVAL};
use crate::dispatch::Dispatch;
use crate::error::LogError;
use crate::fixed_buffer::{FixedBuffer, LARGE_BUFFER};
use crate::rolling_file::RollingFile;

/// More filled buffers than this in one drain means producers are outrunning
/// the writer; all but the first [`KEPT_BUFFERS_ON_DROP`] are discarded.
pub const DROP_BUFFERS_THRESHOLD: usize = 25;

/// Buffers still written when the drop policy kicks in.
pub const KEPT_BUFFERS_ON_DROP: usize = 2;

const PENDING_BUFFERS_RESERVE: usize = 16;

/// Destination of the buffers drained by an [`AsyncWriter`].
///
/// The handler is owned by the writer's background thread, which is the only
/// caller, so implementations need no locking of their own. [`RollingFile`]
/// is the standard implementation; tests and embedders can plug in others.
///
/// # Usage
///
/// ```
/// # use async_logger::BufferHandler;
/// # use std::sync::Arc;
/// # use parking_lot::Mutex;
/// struct Collect(Arc<Mutex<Vec<u8>>>);
///
/// impl BufferHandler for Collect {
///     fn handle_buffer(&mut self, data: &[u8]) {
///         self.0.lock().extend_from_slice(data);
///     }
///
///     fn flush(&mut self) {}
/// }
/// ```
pub trait BufferHandler: Send {
    /// Writes one drained buffer. Called in arrival order.
    fn handle_buffer(&mut self, data: &[u8]);

    /// Called after each drain cycle and once more at shutdown.
    fn flush(&mut self);
}

type Buffer<const CAP: usize> = Box<FixedBuffer<CAP>>;

struct BufferState<const CAP: usize> {
    current: Buffer<CAP>,
    next: Option<Buffer<CAP>>,
    pending: Vec<Buffer<CAP>>,
}

struct Shared<const CAP: usize> {
    state: Mutex<BufferState<CAP>>,
    wakeup: Condvar,
    running: AtomicBool,
    dropped_buffers: AtomicU64,
    rejected_records: AtomicU64,
}

enum Output {
    Rolling { basename: String, roll_size: u64 },
    // Empty while the background thread owns the handler.
    Handler(Option<Box<dyn BufferHandler>>),
}

struct Control {
    output: Output,
    flush_interval: Duration,
    consumer: Option<JoinHandle<Box<dyn BufferHandler>>>,
}

/// Asynchronous, double-buffered log writer.
///
/// Any number of threads may call [`append`](Self::append) concurrently. It
/// never waits for I/O: the only blocking is the short critical section that
/// copies the bytes into the current buffer. One background thread, started
/// by [`start`](Self::start), drains filled buffers into a [`BufferHandler`],
/// by default a [`RollingFile`].
///
/// # Ordering
///
/// Records from one thread reach the handler in the order they were
/// appended. Records from different threads are ordered by who took the
/// append lock first.
///
/// # Overload
///
/// If more than [`DROP_BUFFERS_THRESHOLD`] buffers pile up between two
/// drains, only the first [`KEPT_BUFFERS_ON_DROP`] are written and a line
/// `Dropped <N> buffers of log messages` goes to the handler and to stderr.
///
/// # Type Parameters
///
/// * `CAP` - capacity of each batch buffer in bytes, [`LARGE_BUFFER`] by default
///
/// # Examples
///
/// ```no_run
/// # use async_logger::{AsyncWriter, Dispatch};
/// # use std::sync::Arc;
/// let writer = Arc::new(AsyncWriter::new("/tmp/myapp", 64 * 1024 * 1024));
/// writer.start().expect("cannot open log file");
/// AsyncWriter::install(&writer, Dispatch::global());
///
/// // ... log through the macros or Record ...
///
/// writer.stop().unwrap();
/// ```
pub struct AsyncWriter<const CAP: usize = LARGE_BUFFER> {
    shared: Arc<Shared<CAP>>,
    control: Mutex<Control>,
}

impl AsyncWriter<LARGE_BUFFER> {
    /// A writer that logs into rolling files named after `basename`, rolling
    /// every `roll_size` bytes. The flush interval defaults to three seconds.
    pub fn new(basename: impl Into<String>, roll_size: u64) -> Self {
        Self::with_file(basename, roll_size)
    }

    pub fn from_config(config: &LoggerConfig) -> Self {
        Self::with_file(config.basename.clone(), config.roll_size)
            .with_flush_interval(config.flush_interval)
    }
}

impl<const CAP: usize> AsyncWriter<CAP> {
    /// Like [`AsyncWriter::new`], for any buffer capacity.
    pub fn with_file(basename: impl Into<String>, roll_size: u64) -> Self {
        Self::with_output(Output::Rolling {
            basename: basename.into(),
            roll_size,
        })
    }

    /// A writer that drains into `handler` instead of files.
    pub fn with_handler(handler: impl BufferHandler + 'static) -> Self {
        Self::with_output(Output::Handler(Some(Box::new(handler))))
    }

    fn with_output(output: Output) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(BufferState {
                    current: FixedBuffer::boxed(),
                    next: Some(FixedBuffer::boxed()),
                    pending: Vec::with_capacity(PENDING_BUFFERS_RESERVE),
                }),
                wakeup: Condvar::new(),
                running: AtomicBool::new(false),
                dropped_buffers: AtomicU64::new(0),
                rejected_records: AtomicU64::new(0),
            }),
            control: Mutex::new(Control {
                output,
                flush_interval: DEFAULT_FLUSH_INTERVAL,
                consumer: None,
            }),
        }
    }

    /// Sets how long the background thread sleeps when idle. Also the period
    /// of the rolling file's background flush.
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.control.get_mut().flush_interval = interval;
        self
    }

    /// Copies `data` into the current buffer.
    ///
    /// Bytes appended before [`start`](Self::start) are kept and written once
    /// the background thread runs. A single append larger than a whole
    /// buffer cannot be stored and is rejected and counted.
    pub fn append(&self, data: &[u8]) {
        if data.len() > CAP {
            self.shared.rejected_records.fetch_add(1, Ordering::Relaxed);
            warn!(len = data.len(), capacity = CAP, "log record larger than a buffer, discarded");
            return;
        }

        let mut state = self.shared.state.lock();
        if state.current.avail() >= data.len() {
            state.current.append(data);
            return;
        }

        let fresh = state.next.take().unwrap_or_else(FixedBuffer::boxed);
        let filled = mem::replace(&mut state.current, fresh);
        state.pending.push(filled);
        state.current.append(data);
        drop(state);
        self.shared.wakeup.notify_one();
    }

    /// Opens the output and spawns the background thread.
    ///
    /// Fails with [`LogError::OpenFile`] if the first log file cannot be
    /// opened; no thread is started in that case.
    pub fn start(&self) -> Result<(), LogError> {
        let mut control = self.control.lock();
        if control.consumer.is_some() {
            return Err(LogError::AlreadyRunning);
        }

        let interval = control.flush_interval;
        let handler: Box<dyn BufferHandler> = match &mut control.output {
            Output::Rolling {
                basename,
                roll_size,
            } => Box::new(RollingFile::new(basename.clone(), *roll_size, interval)?),
            Output::Handler(slot) => slot.take().ok_or_else(|| {
                LogError::InvalidConfig("buffer handler was lost by an earlier failed start".into())
            })?,
        };

        {
            let _state = self.shared.state.lock();
            self.shared.running.store(true, Ordering::Release);
        }

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("async-log-writer".to_string())
            .spawn(move || consume(shared, handler, interval));
        match spawned {
            Ok(consumer) => {
                control.consumer = Some(consumer);
                debug!(capacity = CAP, ?interval, "async log writer started");
                Ok(())
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::Release);
                Err(LogError::Spawn(e))
            }
        }
    }

    /// Stops the background thread after it has written and flushed
    /// everything appended before this call.
    pub fn stop(&self) -> Result<(), LogError> {
        let mut control = self.control.lock();
        let consumer = control.consumer.take().ok_or(LogError::NotRunning)?;

        {
            // Under the lock so the consumer cannot miss the wake-up between
            // checking the flag and starting to wait.
            let _state = self.shared.state.lock();
            self.shared.running.store(false, Ordering::Release);
        }
        self.shared.wakeup.notify_one();

        match consumer.join() {
            Ok(handler) => {
                if let Output::Handler(slot) = &mut control.output {
                    *slot = Some(handler);
                }
                debug!("async log writer stopped");
            }
            Err(_) => error!("async log writer thread panicked"),
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Buffers discarded by the overload policy since creation.
    pub fn dropped_buffers(&self) -> u64 {
        self.shared.dropped_buffers.load(Ordering::Relaxed)
    }

    /// Appends rejected for being larger than a buffer.
    pub fn rejected_records(&self) -> u64 {
        self.shared.rejected_records.load(Ordering::Relaxed)
    }

    /// Routes `dispatch` into `writer`: records are appended to it, and the
    /// flush before a fatal abort stops the writer so that everything already
    /// logged reaches the file.
    pub fn install(writer: &Arc<Self>, dispatch: &Dispatch) {
        let output = Arc::clone(writer);
        dispatch.set_output_hook(move |record| output.append(record));
        let flush = Arc::clone(writer);
        dispatch.set_flush_hook(move || {
            let _ = flush.stop();
        });
    }
}

impl<const CAP: usize> Drop for AsyncWriter<CAP> {
    fn drop(&mut self) {
        if self.control.get_mut().consumer.is_some() {
            let _ = self.stop();
        }
    }
}

fn consume<const CAP: usize>(
    shared: Arc<Shared<CAP>>,
    mut output: Box<dyn BufferHandler>,
    interval: Duration,
) -> Box<dyn BufferHandler> {
    let mut spare_current: Option<Buffer<CAP>> = Some(FixedBuffer::boxed());
    let mut spare_next: Option<Buffer<CAP>> = Some(FixedBuffer::boxed());
    let mut to_write: Vec<Buffer<CAP>> = Vec::with_capacity(PENDING_BUFFERS_RESERVE);

    loop {
        let running = {
            let mut state = shared.state.lock();
            if state.pending.is_empty() && shared.running.load(Ordering::Acquire) {
                shared.wakeup.wait_for(&mut state, interval);
            }
            let running = shared.running.load(Ordering::Acquire);

            let fresh = spare_current.take().unwrap_or_else(FixedBuffer::boxed);
            let filled = mem::replace(&mut state.current, fresh);
            state.pending.push(filled);
            mem::swap(&mut to_write, &mut state.pending);
            if state.next.is_none() {
                state.next = spare_next.take();
            }
            running
        };

        if to_write.len() > DROP_BUFFERS_THRESHOLD {
            let dropped = to_write.len() - KEPT_BUFFERS_ON_DROP;
            let notice = format!("Dropped {} buffers of log messages\n", dropped);
            eprint!("{}", notice);
            warn!(dropped, "log producers outran the writer, buffers discarded");
            output.handle_buffer(notice.as_bytes());
            to_write.truncate(KEPT_BUFFERS_ON_DROP);
            shared
                .dropped_buffers
                .fetch_add(dropped as u64, Ordering::Relaxed);
        }

        for buffer in &to_write {
            if !buffer.is_empty() {
                output.handle_buffer(buffer.as_bytes());
            }
        }

        to_write.truncate(2);
        for spare in [&mut spare_current, &mut spare_next] {
            if spare.is_none() {
                if let Some(mut buffer) = to_write.pop() {
                    buffer.reset();
                    *spare = Some(buffer);
                }
            }
        }
        to_write.clear();
        output.flush();

        if !running {
            break;
        }
    }

    output.flush();
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Collect(Arc<Mutex<Vec<Vec<u8>>>>);

    impl BufferHandler for Collect {
        fn handle_buffer(&mut self, data: &[u8]) {
            self.0.lock().push(data.to_vec());
        }

        fn flush(&mut self) {}
    }

    #[test]
    fn test_start_twice_fails() {
        let writer = AsyncWriter::<64>::with_handler(Collect(Default::default()));
        writer.start().unwrap();
        assert!(matches!(writer.start(), Err(LogError::AlreadyRunning)));
        writer.stop().unwrap();
        assert!(matches!(writer.stop(), Err(LogError::NotRunning)));
    }

    #[test]
    fn test_restart_reuses_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let writer = AsyncWriter::<64>::with_handler(Collect(Arc::clone(&seen)));

        writer.start().unwrap();
        writer.append(b"one\n");
        writer.stop().unwrap();
        writer.start().unwrap();
        writer.append(b"two\n");
        writer.stop().unwrap();

        let all: Vec<u8> = seen.lock().concat();
        assert_eq!(all, b"one\ntwo\n");
    }

    #[test]
    fn test_oversized_append_rejected() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let writer = AsyncWriter::<8>::with_handler(Collect(Arc::clone(&seen)));
        writer.append(b"123456789");
        writer.append(b"12345678");
        writer.start().unwrap();
        writer.stop().unwrap();

        assert_eq!(writer.rejected_records(), 1);
        assert_eq!(seen.lock().concat(), b"12345678");
    }

    #[test]
    fn test_buffers_are_recycled() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let writer = AsyncWriter::<16>::with_handler(Collect(Arc::clone(&seen)))
            .with_flush_interval(Duration::from_millis(10));
        writer.start().unwrap();
        for round in 0..50u8 {
            writer.append(&[b'a' + round % 26; 10]);
            thread::sleep(Duration::from_millis(1));
        }
        writer.stop().unwrap();

        let total: usize = seen.lock().iter().map(Vec::len).sum();
        assert_eq!(total, 500);
        assert_eq!(writer.dropped_buffers(), 0);
    }
}
