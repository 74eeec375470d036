use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::error;

use crate::error::LogError;

/// Size of the userspace write buffer in front of the file descriptor.
pub const FILE_BUFFER_SIZE: usize = 64 * 1024;

/// Append-only buffered writer over one log file.
///
/// `AppendFile` does no locking of its own: it takes `&mut self`, so the
/// owner (a [`RollingFile`]) serializes access. The written-bytes counter only
/// ever grows; it counts what this handle wrote, not the size of the file on
/// disk, and drives the roll decision.
///
/// [`RollingFile`]: crate::RollingFile
pub struct AppendFile {
    writer: BufWriter<File>,
    path: PathBuf,
    written_bytes: u64,
}

impl AppendFile {
    /// Opens (creating if needed) `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| LogError::OpenFile {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            writer: BufWriter::with_capacity(FILE_BUFFER_SIZE, file),
            path,
            written_bytes: 0,
        })
    }

    /// Writes `data`. A short write is reported, counted as far as it got,
    /// and otherwise ignored.
    pub fn append(&mut self, data: &[u8]) {
        let mut written = 0;
        while written < data.len() {
            match self.writer.write(&data[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!(path = %self.path.display(), error = %e, "log file write failed");
                    break;
                }
            }
        }
        if written != data.len() {
            eprintln!(
                "AppendFile::append() failed: wrote {} of {} bytes to {}",
                written,
                data.len(),
                self.path.display()
            );
        }
        self.written_bytes += written as u64;
    }

    /// Pushes buffered bytes to the OS.
    pub fn flush(&mut self) {
        if let Err(e) = self.writer.flush() {
            error!(path = %self.path.display(), error = %e, "log file flush failed");
            eprintln!("AppendFile::flush() failed for {}: {}", self.path.display(), e);
        }
    }

    pub fn written_bytes(&self) -> u64 {
        self.written_bytes
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AppendFile {
    fn drop(&mut self) {
        self.flush();
    }
}
