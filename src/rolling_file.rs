use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex, MutexGuard};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{debug, error, warn};

use crate::append_file::AppendFile;
use crate::async_writer::BufferHandler;
use crate::error::LogError;

const FILE_NAME_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[year][month][day]-[hour][minute][second](UTC)");

/// Builds `<basename>.<YYYYMMDD-HHMMSS>(UTC).<hostname>.<pid>.log`.
pub fn log_file_name(basename: &str, at: OffsetDateTime, hostname: &str, pid: u32) -> String {
    let stamp = at
        .format(FILE_NAME_TIME_FORMAT)
        .unwrap_or_else(|_| "00000000-000000(UTC)".to_string());
    format!("{}.{}.{}.{}.log", basename, stamp, hostname, pid)
}

/// Host name used in log file names, `unknownhost` if it cannot be read.
pub fn hostname() -> String {
    match nix::unistd::gethostname() {
        Ok(name) => match name.into_string() {
            Ok(name) if !name.is_empty() => name,
            _ => {
                warn!("hostname is empty or not valid UTF-8, using 'unknownhost'");
                "unknownhost".to_string()
            }
        },
        Err(e) => {
            warn!("failed to get hostname: {}", e);
            "unknownhost".to_string()
        }
    }
}

struct Shared {
    basename: String,
    roll_size: u64,
    hostname: String,
    file: Mutex<AppendFile>,
    stopped: Mutex<bool>,
    stop_signal: Condvar,
}

impl Shared {
    fn next_path(&self) -> PathBuf {
        PathBuf::from(log_file_name(
            &self.basename,
            OffsetDateTime::now_utc(),
            &self.hostname,
            std::process::id(),
        ))
    }

    fn roll_if_needed(&self, file: &mut AppendFile) {
        if file.written_bytes() > self.roll_size {
            self.roll(file);
        }
    }

    /// Replaces `file` with a freshly named one. Names have one-second
    /// resolution, so a roll within the second the active file was opened
    /// is deferred until the name changes.
    fn roll(&self, file: &mut AppendFile) -> bool {
        let path = self.next_path();
        if path == file.path() {
            return false;
        }
        match AppendFile::open(&path) {
            Ok(next) => {
                debug!(
                    from = %file.path().display(),
                    to = %path.display(),
                    written = file.written_bytes(),
                    "rolling log file"
                );
                // The old handle flushes as it is dropped.
                *file = next;
                true
            }
            Err(e) => {
                error!(error = %e, "failed to roll log file, continuing with the current one");
                eprintln!("RollingFile::roll_file() failed: {}", e);
                false
            }
        }
    }
}

/// A log file that rolls over to a new, distinctly named file once a size
/// threshold is crossed, and that is flushed periodically in the background.
///
/// Appends and flushes serialize on one internal lock shared by the caller and
/// the flush thread. The roll check runs after every append, so the active file
/// exceeds the threshold by at most one append before the next one goes to a
/// new file.
///
/// File names have one-second resolution, so that bound holds at most once
/// per second. A roll that falls due within the second the active file was
/// opened waits for the next second, and until then every append still goes
/// to the active file.
pub struct RollingFile {
    shared: Arc<Shared>,
    flusher: Option<JoinHandle<()>>,
}

impl RollingFile {
    /// Opens the first file and starts the flush thread.
    ///
    /// Failing to open the first file is fatal for the pipeline and is
    /// returned as [`LogError::OpenFile`].
    pub fn new(
        basename: impl Into<String>,
        roll_size: u64,
        flush_interval: Duration,
    ) -> Result<Self, LogError> {
        let basename = basename.into();
        let hostname = hostname();
        let first = PathBuf::from(log_file_name(
            &basename,
            OffsetDateTime::now_utc(),
            &hostname,
            std::process::id(),
        ));
        let file = AppendFile::open(&first)?;

        let shared = Arc::new(Shared {
            basename,
            roll_size,
            hostname,
            file: Mutex::new(file),
            stopped: Mutex::new(false),
            stop_signal: Condvar::new(),
        });

        let flusher = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("log-file-flush".to_string())
                .spawn(move || flush_loop(shared, flush_interval))
                .map_err(LogError::Spawn)?
        };

        Ok(Self {
            shared,
            flusher: Some(flusher),
        })
    }

    pub fn append(&self, data: &[u8]) {
        let mut file = self.shared.file.lock();
        // A roll deferred by the one-second name resolution is retried first.
        self.shared.roll_if_needed(&mut file);
        file.append(data);
        self.shared.roll_if_needed(&mut file);
    }

    pub fn flush(&self) {
        self.shared.file.lock().flush();
    }

    /// Rolls to a new file now, regardless of size. Returns `false` when no new
    /// file was opened (same-second name, or the open failed).
    pub fn roll_file(&self) -> bool {
        let mut file = self.shared.file.lock();
        self.shared.roll(&mut file)
    }

    pub fn current_path(&self) -> PathBuf {
        self.shared.file.lock().path().to_path_buf()
    }

    /// Bytes written to the active file since it was opened.
    pub fn written_bytes(&self) -> u64 {
        self.shared.file.lock().written_bytes()
    }

    pub fn roll_size(&self) -> u64 {
        self.shared.roll_size
    }
}

fn flush_loop(shared: Arc<Shared>, interval: Duration) {
    let mut stopped = shared.stopped.lock();
    while !*stopped {
        shared.stop_signal.wait_for(&mut stopped, interval);
        if *stopped {
            break;
        }
        MutexGuard::unlocked(&mut stopped, || shared.file.lock().flush());
    }
}

impl Drop for RollingFile {
    fn drop(&mut self) {
        *self.shared.stopped.lock() = true;
        self.shared.stop_signal.notify_all();
        if let Some(flusher) = self.flusher.take() {
            let _ = flusher.join();
        }
        RollingFile::flush(self);
    }
}

impl BufferHandler for RollingFile {
    fn handle_buffer(&mut self, data: &[u8]) {
        self.append(data);
    }

    fn flush(&mut self) {
        RollingFile::flush(self);
    }
}
