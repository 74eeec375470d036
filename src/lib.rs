//! # Async Logger
//!
//! An in-process, low-overhead logging pipeline. Application threads format
//! records into fixed-size stack buffers, hand the bytes to a background
//! thread, and return without touching the disk. The background thread
//! batches records into large buffers and writes them to size-rolled log files.
//!
//! ## Key Features
//!
//! * Allocation-free record formatting into fixed buffers
//! * Double-buffered producer/consumer hand-off; callers never wait on I/O
//! * Bounded memory under bursts, with an explicit and reported drop policy
//! * Log files rolled by size and flushed periodically in the background
//! * Severity gating that costs a single atomic load when a level is disabled
//!
//! ## Main Components
//!
//! * [`FixedBuffer`]: fixed-capacity byte buffer
//! * [`LogStream`] / [`Loggable`]: formats primitive values into a buffer
//! * [`Record`]: assembles one record and hands it to the [`Dispatch`]
//! * [`AsyncWriter`]: the buffering engine and its background thread
//! * [`RollingFile`] / [`AppendFile`]: the file layer
//!
//! ## Data Flow
//!
//! ```text
//! call site -> Record -> Dispatch output hook -> AsyncWriter::append
//!     (background thread) -> RollingFile::append / flush -> AppendFile
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use async_logger::{log_info, AsyncWriter, Dispatch};
//! use std::sync::Arc;
//!
//! let writer = Arc::new(AsyncWriter::new("/var/log/myapp", 500 * 1000 * 1000));
//! writer.start().expect("cannot open log file");
//! AsyncWriter::install(&writer, Dispatch::global());
//!
//! log_info!("server started on port ", 8080);
//! log_info!("ratio ", 0.25, " ready ", true);
//!
//! writer.stop().unwrap();
//! ```

pub mod append_file;
pub mod async_writer;
pub mod config;
pub mod current_thread;
pub mod dispatch;
pub mod error;
pub mod fixed_buffer;
pub mod log_bridge;
pub mod log_stream;
pub mod loggable;
mod macros;
pub mod record;
pub mod rolling_file;
pub mod severity;

pub use append_file::AppendFile;
pub use async_writer::{AsyncWriter, BufferHandler};
pub use config::LoggerConfig;
pub use dispatch::{
    min_severity, set_flush_hook, set_min_severity, set_output_hook, Dispatch,
};
pub use error::LogError;
pub use fixed_buffer::{FixedBuffer, LARGE_BUFFER, SMALL_BUFFER};
pub use log_bridge::{init_log_bridge, LogBridge};
pub use log_stream::LogStream;
pub use loggable::Loggable;
pub use record::Record;
pub use rolling_file::RollingFile;
pub use severity::Severity;
